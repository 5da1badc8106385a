use anyhow::{Context, Result};
use vox_core::config::Config;
use vox_core::prompt::resolve_agent_config;

pub async fn run(config: &Config, url: Option<&str>, settings: bool) -> Result<()> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = config.fetch_timeout() {
        builder = builder.timeout(timeout);
    }
    let client = builder.build().context("build http client")?;

    let url = url.or(config.prompt_url.as_deref());
    let agent_config = resolve_agent_config(&client, url).await;

    if settings {
        println!("{}", agent_config.to_json()?);
    } else {
        println!("{}", agent_config.prompt());
    }
    Ok(())
}
