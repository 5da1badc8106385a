//! Remote prompt retrieval.
//!
//! The agent prompt can live in a remote file (typically the GitHub contents
//! API). Every fetch defeats caches, and any failure falls back to
//! `DEFAULT_PROMPT`. Failures are logged, never returned.

use anyhow::{Context, Result, bail};
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use tracing::{debug, warn};
use url::Url;

use crate::config::{AgentConfig, DEFAULT_PROMPT};

/// Asks the GitHub contents API for the raw file body.
pub const RAW_CONTENT_ACCEPT: &str = "application/vnd.github.v3.raw";

/// Query parameter carrying the cache-busting timestamp.
pub const CACHE_BUSTER_PARAM: &str = "t";

/// Fetches the prompt at `url`, or returns the built-in prompt on failure.
pub async fn fetch_prompt(client: &reqwest::Client, url: &str) -> String {
    match try_fetch_prompt(client, url).await {
        Ok(prompt) => prompt,
        Err(e) => {
            warn!(url, error = %format!("{e:#}"), "prompt fetch failed, using built-in prompt");
            DEFAULT_PROMPT.to_string()
        }
    }
}

/// Builds the session settings from the prompt at `url`.
pub async fn load_agent_config(client: &reqwest::Client, url: &str) -> AgentConfig {
    AgentConfig::with_prompt(fetch_prompt(client, url).await)
}

/// Builds the session settings from an optional prompt location.
pub async fn resolve_agent_config(client: &reqwest::Client, url: Option<&str>) -> AgentConfig {
    match url {
        Some(url) => load_agent_config(client, url).await,
        None => AgentConfig::default(),
    }
}

/// Appends the current unix time in milliseconds as `t=<millis>`.
pub fn cache_busted_url(url: &str) -> Result<Url> {
    let mut url = Url::parse(url).with_context(|| format!("Invalid prompt URL: {url}"))?;
    let millis = chrono::Utc::now().timestamp_millis();
    url.query_pairs_mut()
        .append_pair(CACHE_BUSTER_PARAM, &millis.to_string());
    Ok(url)
}

async fn try_fetch_prompt(client: &reqwest::Client, url: &str) -> Result<String> {
    let url = cache_busted_url(url)?;
    debug!(%url, "fetching prompt");

    let response = client
        .get(url)
        .header(ACCEPT, RAW_CONTENT_ACCEPT)
        .header(CACHE_CONTROL, "no-store")
        .send()
        .await
        .context("Failed to send prompt request")?;

    let status = response.status();
    if !status.is_success() {
        bail!("Prompt request returned HTTP {status}");
    }

    let body = response
        .text()
        .await
        .context("Failed to read prompt body")?;
    let prompt = body.trim();
    if prompt.is_empty() {
        bail!("Prompt body is empty");
    }

    Ok(prompt.to_string())
}
