//! Conversation event types shared across the vox crates.
//!
//! Events are produced by the live session transport and appended to the
//! display order. They are immutable once created.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Who authored a conversation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Agent,
}

impl Speaker {
    pub fn as_str(self) -> &'static str {
        match self {
            Speaker::User => "user",
            Speaker::Agent => "agent",
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A diagnostic timing sample reported by the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyMeasurement {
    pub value: f64,
    pub unit: String,
    pub label: String,
}

impl fmt::Display for LatencyMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}", self.label, self.value, self.unit)
    }
}

/// One entry of the display order.
///
/// Serialized as internally tagged JSON, one object per line:
///
/// ```json
/// {"type":"user_utterance","text":"hi"}
/// {"type":"latency_measurement","value":412.0,"unit":"ms","label":"Total latency"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    UserUtterance { text: String },
    AgentUtterance { text: String },
    LatencyMeasurement(LatencyMeasurement),
}

impl Event {
    pub fn user(text: impl Into<String>) -> Self {
        Event::UserUtterance { text: text.into() }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Event::AgentUtterance { text: text.into() }
    }

    pub fn latency(value: f64, unit: impl Into<String>, label: impl Into<String>) -> Self {
        Event::LatencyMeasurement(LatencyMeasurement {
            value,
            unit: unit.into(),
            label: label.into(),
        })
    }

    /// Returns the speaker for conversation events, `None` for measurements.
    pub fn speaker(&self) -> Option<Speaker> {
        match self {
            Event::UserUtterance { .. } => Some(Speaker::User),
            Event::AgentUtterance { .. } => Some(Speaker::Agent),
            Event::LatencyMeasurement(_) => None,
        }
    }

    /// Returns the utterance text for conversation events.
    pub fn text(&self) -> Option<&str> {
        match self {
            Event::UserUtterance { text } | Event::AgentUtterance { text } => Some(text),
            Event::LatencyMeasurement(_) => None,
        }
    }

    pub fn is_conversation(&self) -> bool {
        self.speaker().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event: Event =
            serde_json::from_str(r#"{"type":"agent_utterance","text":"hello"}"#).unwrap();
        assert_eq!(event, Event::agent("hello"));

        let latency: Event = serde_json::from_str(
            r#"{"type":"latency_measurement","value":412.5,"unit":"ms","label":"Total"}"#,
        )
        .unwrap();
        assert_eq!(latency, Event::latency(412.5, "ms", "Total"));
    }

    #[test]
    fn test_unknown_variant_is_rejected() {
        let result = serde_json::from_str::<Event>(r#"{"type":"tool_call","text":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_speaker_projection() {
        assert_eq!(Event::user("a").speaker(), Some(Speaker::User));
        assert_eq!(Event::agent("a").speaker(), Some(Speaker::Agent));
        assert_eq!(Event::latency(1.0, "ms", "x").speaker(), None);
        assert!(!Event::latency(1.0, "ms", "x").is_conversation());
    }

    #[test]
    fn test_latency_display() {
        let Event::LatencyMeasurement(m) = Event::latency(412.0, "ms", "Total latency") else {
            unreachable!()
        };
        assert_eq!(m.to_string(), "Total latency: 412 ms");
    }
}
