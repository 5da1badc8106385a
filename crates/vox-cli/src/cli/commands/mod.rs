//! CLI command handlers.

pub mod config;
pub mod normalize;
pub mod prompt;
pub mod render;
pub mod voices;
