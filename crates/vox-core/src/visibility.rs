//! Latency visibility toggle.
//!
//! Latency measurements are hidden unless the page was opened with a
//! non-empty `latency-measurement` query parameter.

use url::Url;

pub const LATENCY_MEASUREMENT_PARAM: &str = "latency-measurement";

pub fn show_latency_from_url(url: &Url) -> bool {
    url.query_pairs()
        .find(|(key, _)| key == LATENCY_MEASUREMENT_PARAM)
        .is_some_and(|(_, value)| !value.is_empty())
}

/// Same as `show_latency_from_url` for a bare query string, with or without
/// the leading `?`.
pub fn show_latency_from_query(query: &str) -> bool {
    let query = query.strip_prefix('?').unwrap_or(query);
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == LATENCY_MEASUREMENT_PARAM)
        .is_some_and(|(_, value)| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_or_empty_hides() {
        assert!(!show_latency_from_query(""));
        assert!(!show_latency_from_query("?other=1"));
        assert!(!show_latency_from_query("latency-measurement"));
        assert!(!show_latency_from_query("latency-measurement="));
    }

    #[test]
    fn test_non_empty_value_shows() {
        assert!(show_latency_from_query("?latency-measurement=1"));
        assert!(show_latency_from_query("a=b&latency-measurement=true"));
        // any non-empty value counts, even "false"
        assert!(show_latency_from_query("latency-measurement=false"));
    }

    #[test]
    fn test_first_occurrence_wins() {
        assert!(!show_latency_from_query(
            "latency-measurement=&latency-measurement=1"
        ));
    }

    #[test]
    fn test_from_url() {
        let url = Url::parse("https://agent.example/?latency-measurement=on").unwrap();
        assert!(show_latency_from_url(&url));
        let url = Url::parse("https://agent.example/").unwrap();
        assert!(!show_latency_from_url(&url));
    }
}
