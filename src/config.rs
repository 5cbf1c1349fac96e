//! Configuration types for the chat client.

use crate::error::{DeskError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default chat endpoint of a locally running research service.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/chat";

/// Top-level configuration for the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    /// Where the research service lives.
    pub endpoint: EndpointConfig,
    /// Conversation behaviour.
    pub chat: ChatConfig,
    /// Spoken replies.
    pub speech_output: SpeechOutputConfig,
    /// Microphone input.
    pub speech_input: SpeechInputConfig,
}

/// Research service endpoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Full URL of the `POST` chat endpoint.
    ///
    /// The health probe is derived from its origin (`<origin>/health`).
    pub url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ENDPOINT.to_owned(),
        }
    }
}

/// What happens when the user submits while a request is still in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Hold the new message and dispatch it once the in-flight one resolves.
    #[default]
    Queue,
    /// Dispatch immediately; each request tracks its own placeholder.
    Concurrent,
}

/// Conversation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Persona selected at startup.
    pub persona: String,
    /// Selectable personas. Empty means any label is accepted.
    pub personas: Vec<String>,
    /// Speak assistant replies aloud (when a synthesizer is available).
    pub voice_output: bool,
    /// Overlapping submission handling.
    pub overlap: OverlapPolicy,
    /// Show the welcome entry on startup.
    pub greeting: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            persona: crate::persona::DEFAULT_PERSONA.to_owned(),
            personas: crate::persona::BUILTIN_PERSONAS
                .iter()
                .map(|p| (*p).to_owned())
                .collect(),
            voice_output: false,
            overlap: OverlapPolicy::Queue,
            greeting: true,
        }
    }
}

/// Speech synthesis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechOutputConfig {
    /// Master switch for speech synthesis detection.
    pub enabled: bool,
    /// Synthesizer program. `None` probes `say`, `espeak-ng`, `espeak`, `spd-say`.
    pub program: Option<PathBuf>,
    /// Speaking rate multiplier (1.0 = platform default).
    pub rate: f32,
    /// Pitch multiplier (1.0 = platform default).
    pub pitch: f32,
    /// Replies longer than this many characters are truncated before speaking.
    pub max_spoken_chars: usize,
    /// Appended to truncated replies.
    pub truncation_suffix: String,
}

impl Default for SpeechOutputConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: None,
            rate: 1.0,
            pitch: 1.0,
            max_spoken_chars: 700,
            truncation_suffix: " ... (truncated)".to_owned(),
        }
    }
}

/// Speech recognition configuration.
///
/// The recognizer is an external program that records one utterance and
/// prints the final transcript on stdout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechInputConfig {
    /// Master switch for speech recognition detection.
    pub enabled: bool,
    /// Recognizer program. Without one, the microphone control is disabled.
    pub program: Option<PathBuf>,
    /// Extra arguments passed to the recognizer.
    pub args: Vec<String>,
    /// BCP 47 language tag, exported as `ACCOUNT_DESK_LANG`.
    pub lang: String,
}

impl Default for SpeechInputConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: None,
            args: Vec::new(),
            lang: "en-US".to_owned(),
        }
    }
}

impl DeskConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| DeskError::Config(e.to_string()))
    }

    /// Load from `path` if given, else from the default location when it exists,
    /// else defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let default_path = Self::default_config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| DeskError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> PathBuf {
        crate::desk_dirs::config_file()
    }

    /// Check values that would only fail later at request or speak time.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.endpoint.url)
            .map_err(|e| DeskError::Config(format!("endpoint.url `{}`: {e}", self.endpoint.url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DeskError::Config(format!(
                "endpoint.url must be http or https, got `{}`",
                url.scheme()
            )));
        }

        let persona = self.chat.persona.trim();
        if persona.is_empty() {
            return Err(DeskError::Config("chat.persona is empty".into()));
        }
        if !self.chat.personas.is_empty() && !self.chat.personas.iter().any(|p| p == persona) {
            return Err(DeskError::Config(format!(
                "chat.persona `{persona}` is not one of chat.personas"
            )));
        }

        if !(self.speech_output.rate > 0.0) {
            return Err(DeskError::Config("speech_output.rate must be positive".into()));
        }
        if !(self.speech_output.pitch > 0.0) {
            return Err(DeskError::Config("speech_output.pitch must be positive".into()));
        }
        if self.speech_output.max_spoken_chars == 0 {
            return Err(DeskError::Config(
                "speech_output.max_spoken_chars must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = DeskConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.endpoint.url, DEFAULT_ENDPOINT);
        assert_eq!(config.chat.persona, "efficient");
        assert_eq!(config.chat.overlap, OverlapPolicy::Queue);
        assert_eq!(config.speech_output.max_spoken_chars, 700);
        assert_eq!(config.speech_output.truncation_suffix, " ... (truncated)");
        assert_eq!(config.speech_input.lang, "en-US");
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = DeskConfig::default();
        config.endpoint.url = "https://research.example.com/chat".into();
        config.chat.persona = "chatty".into();
        config.chat.voice_output = true;
        config.chat.overlap = OverlapPolicy::Concurrent;

        config.save_to_file(&path).unwrap();
        let loaded = DeskConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let toml_str = r#"
[chat]
persona = "edge"
overlap = "concurrent"
"#;
        let config: DeskConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.chat.persona, "edge");
        assert_eq!(config.chat.overlap, OverlapPolicy::Concurrent);
        assert!(config.chat.greeting);
        assert_eq!(config.endpoint.url, DEFAULT_ENDPOINT);
        assert!((config.speech_output.rate - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn from_file_nonexistent_returns_error() {
        let result = DeskConfig::from_file(Path::new("/nonexistent/path/config.toml"));
        assert!(matches!(result, Err(DeskError::Io(_))));
    }

    #[test]
    fn from_file_invalid_toml_returns_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();
        assert!(matches!(
            DeskConfig::from_file(&path),
            Err(DeskError::Config(_))
        ));
    }

    #[test]
    fn validate_rejects_non_http_endpoint() {
        let mut config = DeskConfig::default();
        config.endpoint.url = "ftp://example.com/chat".into();
        assert!(config.validate().is_err());

        config.endpoint.url = "not a url".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_persona_when_list_is_set() {
        let mut config = DeskConfig::default();
        config.chat.persona = "pirate".into();
        assert!(config.validate().is_err());

        config.chat.personas.clear();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_rate_and_limit() {
        let mut config = DeskConfig::default();
        config.speech_output.rate = 0.0;
        assert!(config.validate().is_err());

        let mut config = DeskConfig::default();
        config.speech_output.max_spoken_chars = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn overlap_policy_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            overlap: OverlapPolicy,
        }

        let queue: Wrapper = toml::from_str(r#"overlap = "queue""#).unwrap();
        assert_eq!(queue.overlap, OverlapPolicy::Queue);
        let concurrent: Wrapper = toml::from_str(r#"overlap = "concurrent""#).unwrap();
        assert_eq!(concurrent.overlap, OverlapPolicy::Concurrent);
    }
}
