//! Transcript rendering command.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;
use url::Url;
use vox_core::config::Config;
use vox_core::markup::NormalizeStrategy;
use vox_core::scroll::{LineViewport, ScrollController};
use vox_core::transcript::{RenderedEntry, TranscriptRenderer};
use vox_core::visibility::show_latency_from_url;
use vox_types::Event;

pub struct RenderOptions<'a> {
    pub events: &'a Path,
    pub config: &'a Config,
    pub url: Option<&'a str>,
    pub show_latency: bool,
    pub strategy: Option<NormalizeStrategy>,
    pub text: bool,
    pub height: Option<usize>,
}

pub fn run(options: &RenderOptions<'_>) -> Result<()> {
    let input = read_input(options.events)?;
    let order = parse_events(&input)?;

    let show_latency = options.show_latency
        || options.config.show_latency
        || match options.url {
            Some(url) => {
                let url = Url::parse(url).with_context(|| format!("invalid page URL: {url}"))?;
                show_latency_from_url(&url)
            }
            None => false,
        };
    let strategy = options
        .strategy
        .unwrap_or(options.config.normalize_strategy);
    debug!(?strategy, show_latency, "rendering transcript");

    let renderer = TranscriptRenderer::from_config(&Config {
        normalize_strategy: strategy,
        show_latency,
        ..options.config.clone()
    });

    if !options.text {
        println!("{}", renderer.to_html(&order));
        return Ok(());
    }

    let lines = text_lines(&renderer.render(&order));
    let visible = match options.height {
        Some(height) => {
            let mut viewport = LineViewport::new(height);
            viewport.update_line_count(lines.len());
            ScrollController::new().after_commit(order.len(), &mut viewport);
            viewport.visible_range()
        }
        None => 0..lines.len(),
    };
    for line in &lines[visible] {
        println!("{line}");
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("read events from stdin")?;
        return Ok(input);
    }
    std::fs::read_to_string(path).with_context(|| format!("read events from {}", path.display()))
}

/// Parses JSON-lines events. Blank lines are skipped.
pub fn parse_events(input: &str) -> Result<Vec<Event>> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line).with_context(|| format!("parse event on line {}", n + 1))
        })
        .collect()
}

/// Terminal layout: a speaker header starts each turn group, bubble lines
/// are indented, latency rows are centered between dashes.
fn text_lines(entries: &[RenderedEntry]) -> Vec<String> {
    let mut lines = Vec::new();
    for entry in entries {
        match entry {
            RenderedEntry::User {
                text,
                non_word,
                first_in_sequence,
                ..
            } => {
                if *first_in_sequence {
                    lines.push("user:".to_string());
                }
                if *non_word {
                    lines.push(format!("  _{text}_"));
                } else {
                    lines.extend(text.lines().map(|line| format!("  {line}")));
                }
            }
            RenderedEntry::Agent {
                tree,
                first_in_sequence,
                ..
            } => {
                if *first_in_sequence {
                    lines.push("agent:".to_string());
                }
                lines.extend(tree.lines().into_iter().map(|line| format!("  {line}")));
            }
            RenderedEntry::Latency { text, .. } => lines.push(format!("-- {text} --")),
        }
    }
    lines
}
