use std::io::Read;

use anyhow::{Context, Result};
use vox_core::markup::{NormalizeStrategy, Normalized, Normalizer, Segment};

pub fn run(text: Option<String>, strategy: NormalizeStrategy) -> Result<()> {
    let raw = match text {
        Some(text) => text,
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("read text from stdin")?;
            input
        }
    };

    println!("{}", normalize_for_display(&raw, strategy));
    Ok(())
}

fn normalize_for_display(raw: &str, strategy: NormalizeStrategy) -> String {
    match Normalizer::new(strategy).normalize(raw) {
        Normalized::Plain(text) => text,
        Normalized::Segments(segments) => segments
            .iter()
            .map(|segment| match segment {
                Segment::Text(text) | Segment::Glyph(text) => text.as_str(),
            })
            .collect(),
    }
}
