//! Core library for vox.
//!
//! Live transcript rendering for a voice agent: markup normalization,
//! sanitized text rendering, turn grouping, transcript assembly and the
//! scroll policy, plus the configuration and prompt plumbing around them.

pub mod config;
pub mod grouping;
pub mod markup;
pub mod prompt;
pub mod render;
pub mod scroll;
pub mod transcript;
pub mod visibility;
