//! Configuration management for vox.
//!
//! Two kinds of configuration live here:
//! - `Config`: local settings loaded from ${VOX_HOME}/config.toml with
//!   sensible defaults.
//! - `AgentConfig`: the immutable session settings sent to the voice agent
//!   service, built once per session from the effective prompt.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::markup::NormalizeStrategy;

/// Built-in system prompt, used when no remote prompt is configured or the
/// fetch fails.
pub const DEFAULT_PROMPT: &str = r#"#Role
You are a general-purpose virtual assistant speaking to users over the phone. Your task is to help them find accurate, helpful information across a wide range of everyday topics.

#General Guidelines
-Be warm, friendly, and professional.
-Speak clearly and naturally in plain language.
-Keep most responses to 1–2 sentences and under 120 characters unless the caller asks for more detail (max: 300 characters).
-Do not use markdown formatting, like code blocks, quotes, bold, links, or italics.
-Use line breaks in lists.
-Use varied phrasing; avoid repetition.
-If unclear, ask for clarification.
-If the user's message is empty, respond with an empty message.
-If asked about your well-being, respond briefly and kindly.

#Voice-Specific Instructions
-Speak in a conversational tone—your responses will be spoken aloud.
-Pause after questions to allow for replies.
-Confirm what the customer said if uncertain.
-Never interrupt.

#Style
-Use active listening cues.
-Be warm and understanding, but concise.
-Use simple words unless the caller uses technical terms.

#Call Flow Objective
-Greet the caller and introduce yourself:
"Hi there, I'm your virtual assistant—how can I help today?"
-Your primary goal is to help users quickly find the information they're looking for. This may include:
Quick facts: "The capital of Japan is Tokyo."
Weather: "It's currently 68 degrees and cloudy in Seattle."
Local info: "There's a pharmacy nearby open until 9 PM."
Basic how-to guidance: "To restart your phone, hold the power button for 5 seconds."
FAQs: "Most returns are accepted within 30 days with a receipt."
Navigation help: "Can you tell me the address or place you're trying to reach?"
-If the request is unclear:
"Just to confirm, did you mean…?" or "Can you tell me a bit more?"
-If the request is out of scope (e.g. legal, financial, or medical advice):
"I'm not able to provide advice on that, but I can help you find someone who can."

#Off-Scope Questions
-If asked about sensitive topics like health, legal, or financial matters:
"I'm not qualified to answer that, but I recommend reaching out to a licensed professional."

#User Considerations
-Callers may be in a rush, distracted, or unsure how to phrase their question. Stay calm, helpful, and clear—especially when the user seems stressed, confused, or overwhelmed.

#Closing
-Always ask:
"Is there anything else I can help you with today?"
-Then thank them warmly and say:
"Thanks for calling. Take care and have a great day!""#;

/// Returns the default config template.
///
/// Embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for vox configuration.
    //!
    //! VOX_HOME resolution order:
    //! 1. VOX_HOME environment variable (if set)
    //! 2. ~/.config/vox (default)

    use std::path::PathBuf;

    /// Returns the vox home directory.
    pub fn vox_home() -> PathBuf {
        if let Ok(home) = std::env::var("VOX_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("vox")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        vox_home().join("config.toml")
    }
}

/// Local settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote prompt location. `None` uses the built-in prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_url: Option<String>,
    pub normalize_strategy: NormalizeStrategy,
    pub show_latency: bool,
    /// 0 disables the timeout.
    pub fetch_timeout_secs: u64,
}

impl Config {
    const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }

    /// Prompt fetch timeout, or `None` when disabled.
    pub fn fetch_timeout(&self) -> Option<Duration> {
        (self.fetch_timeout_secs > 0).then(|| Duration::from_secs(self.fetch_timeout_secs))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt_url: None,
            normalize_strategy: NormalizeStrategy::default(),
            show_latency: false,
            fetch_timeout_secs: Self::DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioFormat {
    pub encoding: &'static str,
    pub sample_rate: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioConfig {
    pub input: AudioFormat,
    pub output: AudioFormat,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            input: AudioFormat {
                encoding: "linear16",
                sample_rate: 16_000,
                container: None,
            },
            output: AudioFormat {
                encoding: "linear16",
                sample_rate: 24_000,
                container: Some("none"),
            },
        }
    }
}

/// A speech-to-text or language-model provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelProvider {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub model: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeakVoice {
    pub mode: &'static str,
    pub id: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeakProvider {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub model_id: &'static str,
    pub voice: SpeakVoice,
    pub language: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListenConfig {
    pub provider: ModelProvider,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeakConfig {
    pub provider: SpeakProvider,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThinkConfig {
    pub provider: ModelProvider,
    pub prompt: String,
    pub functions: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentSettings {
    pub listen: ListenConfig,
    pub speak: SpeakConfig,
    pub think: ThinkConfig,
}

/// The session settings message.
///
/// Built once with the effective prompt and never mutated afterwards.
/// Credentials for the speech provider are supplied by the hosting
/// environment and are not part of this value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentConfig {
    #[serde(rename = "type")]
    kind: &'static str,
    audio: AudioConfig,
    agent: AgentSettings,
    experimental: bool,
}

impl AgentConfig {
    pub fn with_prompt(prompt: impl Into<String>) -> Self {
        Self {
            kind: "Settings",
            audio: AudioConfig::default(),
            agent: AgentSettings {
                listen: ListenConfig {
                    provider: ModelProvider {
                        kind: "deepgram",
                        model: "nova-3",
                    },
                },
                speak: SpeakConfig {
                    provider: SpeakProvider {
                        kind: "cartesia",
                        model_id: "sonic-2",
                        voice: SpeakVoice {
                            mode: "id",
                            id: "a167e0f3-df7e-4d52-a9c3-f949145efdab",
                        },
                        language: "en",
                    },
                },
                think: ThinkConfig {
                    provider: ModelProvider {
                        kind: "groq",
                        model: "openai/gpt-oss-20b",
                    },
                    prompt: prompt.into(),
                    functions: Vec::new(),
                },
            },
            experimental: true,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.agent.think.prompt
    }

    /// Serializes to the JSON settings message.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize agent settings")
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::with_prompt(DEFAULT_PROMPT)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceMetadata {
    pub accent: &'static str,
    pub gender: &'static str,
    pub image: &'static str,
    pub color: &'static str,
    pub sample: &'static str,
}

/// A selectable agent voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Voice {
    pub name: &'static str,
    pub canonical_name: &'static str,
    pub metadata: VoiceMetadata,
}

pub const AVAILABLE_VOICES: &[Voice] = &[
    Voice {
        name: "Asteria",
        canonical_name: "aura-asteria-en",
        metadata: VoiceMetadata {
            accent: "American",
            gender: "Female",
            image: "https://static.deepgram.com/examples/avatars/asteria.jpg",
            color: "#7800ED",
            sample: "https://static.deepgram.com/examples/voices/asteria.wav",
        },
    },
    Voice {
        name: "Orion",
        canonical_name: "aura-orion-en",
        metadata: VoiceMetadata {
            accent: "American",
            gender: "Male",
            image: "https://static.deepgram.com/examples/avatars/orion.jpg",
            color: "#83C4FB",
            sample: "https://static.deepgram.com/examples/voices/orion.mp3",
        },
    },
    Voice {
        name: "Luna",
        canonical_name: "aura-luna-en",
        metadata: VoiceMetadata {
            accent: "American",
            gender: "Female",
            image: "https://static.deepgram.com/examples/avatars/luna.jpg",
            color: "#949498",
            sample: "https://static.deepgram.com/examples/voices/luna.wav",
        },
    },
    Voice {
        name: "Arcas",
        canonical_name: "aura-arcas-en",
        metadata: VoiceMetadata {
            accent: "American",
            gender: "Male",
            image: "https://static.deepgram.com/examples/avatars/arcas.jpg",
            color: "#DD0070",
            sample: "https://static.deepgram.com/examples/voices/arcas.mp3",
        },
    },
];

/// The first voice of the catalogue.
pub fn default_voice() -> &'static Voice {
    &AVAILABLE_VOICES[0]
}

/// Finds a voice by display or canonical name, case-insensitively.
pub fn find_voice(name: &str) -> Option<&'static Voice> {
    AVAILABLE_VOICES.iter().find(|voice| {
        voice.name.eq_ignore_ascii_case(name) || voice.canonical_name.eq_ignore_ascii_case(name)
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.normalize_strategy, NormalizeStrategy::Strip);
        assert!(!config.show_latency);
    }

    #[test]
    fn test_load_partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "normalize_strategy = \"glyph\"\n").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.normalize_strategy, NormalizeStrategy::Glyph);
        assert_eq!(config.prompt_url, None);
        assert_eq!(config.fetch_timeout_secs, 10);
    }

    #[test]
    fn test_load_invalid_config_reports_path() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "normalize_strategy = \"shout\"\n").unwrap();

        let err = Config::load_from(&config_path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config"));
    }

    #[test]
    fn test_init_creates_config_with_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("subdir").join("config.toml");

        Config::init(&config_path).unwrap();

        assert!(config_path.exists());
        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("# prompt_url ="));

        // the template parses back to the defaults
        assert_eq!(Config::load_from(&config_path).unwrap(), Config::default());
    }

    #[test]
    fn test_init_fails_if_exists() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "").unwrap();

        let result = Config::init(&config_path);
        assert!(result.is_err());
    }

    #[test]
    fn test_fetch_timeout_zero_disables() {
        let config = Config {
            fetch_timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.fetch_timeout(), None);
        assert_eq!(
            Config::default().fetch_timeout(),
            Some(Duration::from_secs(10))
        );
    }

    #[test]
    fn test_agent_config_settings_message() {
        let config = AgentConfig::with_prompt("Be brief.");
        let value: serde_json::Value = serde_json::from_str(&config.to_json().unwrap()).unwrap();

        assert_eq!(value["type"], "Settings");
        assert_eq!(value["experimental"], true);
        assert_eq!(value["audio"]["input"]["sample_rate"], 16000);
        assert!(value["audio"]["input"].get("container").is_none());
        assert_eq!(value["audio"]["output"]["sample_rate"], 24000);
        assert_eq!(value["audio"]["output"]["container"], "none");
        assert_eq!(value["agent"]["listen"]["provider"]["type"], "deepgram");
        assert_eq!(value["agent"]["listen"]["provider"]["model"], "nova-3");
        assert_eq!(value["agent"]["speak"]["provider"]["model_id"], "sonic-2");
        assert_eq!(value["agent"]["think"]["provider"]["type"], "groq");
        assert_eq!(value["agent"]["think"]["prompt"], "Be brief.");
        assert_eq!(value["agent"]["think"]["functions"], serde_json::json!([]));
    }

    #[test]
    fn test_default_agent_config_uses_builtin_prompt() {
        let config = AgentConfig::default();
        assert_eq!(config.prompt(), DEFAULT_PROMPT);
        assert!(DEFAULT_PROMPT.starts_with("#Role"));
        assert_eq!(DEFAULT_PROMPT, DEFAULT_PROMPT.trim());
    }

    #[test]
    fn test_builtin_prompt_keeps_fixed_wording() {
        assert!(DEFAULT_PROMPT.contains(
            "-Speak in a conversational tone\u{2014}your responses will be spoken aloud."
        ));
        assert!(DEFAULT_PROMPT.contains(
            "\"Hi there, I'm your virtual assistant\u{2014}how can I help today?\""
        ));
        assert!(DEFAULT_PROMPT.contains(
            "Stay calm, helpful, and clear\u{2014}especially when the user seems stressed"
        ));
        assert!(DEFAULT_PROMPT.ends_with("\"Thanks for calling. Take care and have a great day!\""));
    }

    #[test]
    fn test_voice_catalogue() {
        assert_eq!(default_voice().name, "Asteria");
        assert_eq!(AVAILABLE_VOICES.len(), 4);
        assert_eq!(find_voice("orion").map(|v| v.name), Some("Orion"));
        assert_eq!(find_voice("aura-luna-en").map(|v| v.name), Some("Luna"));
        assert!(find_voice("zeus").is_none());
    }
}
