//! Transcript assembly.
//!
//! Turns the display order into render instructions, one per visible event,
//! in the original order. Latency measurements are emitted only when the
//! latency toggle is on; a hidden measurement is skipped, not replaced.
//!
//! `TranscriptRenderer` goes one step further and produces the final
//! sanitized entries (and HTML) for the hosting page.

use tracing::debug;
use vox_types::{Event, LatencyMeasurement, Speaker};

use crate::config::Config;
use crate::grouping::ConversationSubsequence;
use crate::markup::{Normalized, Normalizer};
use crate::render::{LayoutMode, RenderTree, escape_html, render_markdown, render_segments};

/// Shown in place of an empty user utterance so the turn stays visible.
pub const EMPTY_UTTERANCE_PLACEHOLDER: &str = "<non-word utterance detected>";

/// One render instruction, borrowing from the display order.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderInstruction<'a> {
    Utterance {
        /// Position in the display order.
        index: usize,
        speaker: Speaker,
        text: &'a str,
        first_in_sequence: bool,
    },
    Latency {
        index: usize,
        measurement: &'a LatencyMeasurement,
    },
}

impl<'a> RenderInstruction<'a> {
    pub fn index(&self) -> usize {
        match self {
            RenderInstruction::Utterance { index, .. } | RenderInstruction::Latency { index, .. } => {
                *index
            }
        }
    }

    /// True for a user utterance with no words in it.
    pub fn is_non_word(&self) -> bool {
        matches!(
            self,
            RenderInstruction::Utterance {
                speaker: Speaker::User,
                text: "",
                ..
            }
        )
    }

    /// Utterance text as displayed. The stored event is never modified.
    pub fn display_text(&self) -> Option<&'a str> {
        match self {
            RenderInstruction::Utterance { .. } if self.is_non_word() => {
                Some(EMPTY_UTTERANCE_PLACEHOLDER)
            }
            RenderInstruction::Utterance { text, .. } => Some(*text),
            RenderInstruction::Latency { .. } => None,
        }
    }
}

/// Builds render instructions for `order`.
pub fn assemble(order: &[Event], show_latency: bool) -> Vec<RenderInstruction<'_>> {
    let subsequence = ConversationSubsequence::project(order);

    order
        .iter()
        .enumerate()
        .filter_map(|(index, event)| {
            let utterance = |speaker, text| RenderInstruction::Utterance {
                index,
                speaker,
                text,
                first_in_sequence: subsequence.is_first_in_sequence(index),
            };
            match event {
                Event::UserUtterance { text } => Some(utterance(Speaker::User, text.as_str())),
                Event::AgentUtterance { text } => Some(utterance(Speaker::Agent, text.as_str())),
                Event::LatencyMeasurement(measurement) => {
                    show_latency.then_some(RenderInstruction::Latency { index, measurement })
                }
            }
        })
        .collect()
}

/// A fully rendered transcript entry.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedEntry {
    User {
        index: usize,
        text: String,
        non_word: bool,
        first_in_sequence: bool,
    },
    Agent {
        index: usize,
        tree: RenderTree,
        first_in_sequence: bool,
    },
    Latency {
        index: usize,
        text: String,
    },
}

/// Renders a display order into sanitized entries.
#[derive(Debug, Clone, Default)]
pub struct TranscriptRenderer {
    normalizer: Normalizer,
    show_latency: bool,
}

impl TranscriptRenderer {
    pub fn new(normalizer: Normalizer, show_latency: bool) -> Self {
        Self {
            normalizer,
            show_latency,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Normalizer::new(config.normalize_strategy), config.show_latency)
    }

    /// Overrides the latency toggle (e.g. from the page URL).
    pub fn with_show_latency(mut self, show_latency: bool) -> Self {
        self.show_latency = show_latency;
        self
    }

    pub fn show_latency(&self) -> bool {
        self.show_latency
    }

    /// Normalizes and renders one agent utterance.
    pub fn render_agent_text(&self, raw: &str) -> RenderTree {
        match self.normalizer.normalize(raw) {
            Normalized::Plain(text) => render_markdown(&text, LayoutMode::Block),
            Normalized::Segments(segments) => render_segments(&segments),
        }
    }

    pub fn render(&self, order: &[Event]) -> Vec<RenderedEntry> {
        let instructions = assemble(order, self.show_latency);
        debug!(
            events = order.len(),
            instructions = instructions.len(),
            "render pass"
        );

        instructions
            .into_iter()
            .map(|instruction| match instruction {
                RenderInstruction::Utterance {
                    index,
                    speaker: Speaker::User,
                    first_in_sequence,
                    ..
                } => RenderedEntry::User {
                    index,
                    text: instruction.display_text().unwrap_or_default().to_string(),
                    non_word: instruction.is_non_word(),
                    first_in_sequence,
                },
                RenderInstruction::Utterance {
                    index,
                    speaker: Speaker::Agent,
                    text,
                    first_in_sequence,
                } => RenderedEntry::Agent {
                    index,
                    tree: self.render_agent_text(text),
                    first_in_sequence,
                },
                RenderInstruction::Latency { index, measurement } => RenderedEntry::Latency {
                    index,
                    text: measurement.to_string(),
                },
            })
            .collect()
    }

    /// Renders the transcript as an HTML fragment for the hosting page.
    pub fn to_html(&self, order: &[Event]) -> String {
        let mut out = String::from("<div class=\"transcript\">");
        for entry in self.render(order) {
            write_entry(&entry, &mut out);
        }
        out.push_str("</div>");
        out
    }
}

fn write_entry(entry: &RenderedEntry, out: &mut String) {
    match entry {
        RenderedEntry::User {
            text,
            non_word,
            first_in_sequence,
            ..
        } => {
            let extra = if *non_word { " non-word" } else { "" };
            open_message(Speaker::User, *first_in_sequence, extra, out);
            out.push_str("<p class=\"bubble\">");
            out.push_str(&escape_html(text));
            out.push_str("</p></div>");
        }
        RenderedEntry::Agent {
            tree,
            first_in_sequence,
            ..
        } => {
            open_message(Speaker::Agent, *first_in_sequence, "", out);
            out.push_str("<div class=\"bubble\">");
            out.push_str(&tree.to_html());
            out.push_str("</div></div>");
        }
        RenderedEntry::Latency { text, .. } => {
            out.push_str("<div class=\"latency\">");
            out.push_str(&escape_html(text));
            out.push_str("</div>");
        }
    }
}

fn open_message(speaker: Speaker, first_in_sequence: bool, extra: &str, out: &mut String) {
    let first = if first_in_sequence {
        " first-in-sequence"
    } else {
        ""
    };
    out.push_str(&format!(
        "<div class=\"message {speaker}{first}{extra}\"><span class=\"avatar\" aria-hidden=\"{}\"></span>",
        !first_in_sequence
    ));
}
