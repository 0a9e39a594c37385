use crate::defaults;
use crate::error::{PagecastError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineSettings,
    pub completion: CompletionConfig,
    pub speech: SpeechConfig,
    pub playback: PlaybackConfig,
}

/// Worker pool and enrichment settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineSettings {
    /// Number of pages processed concurrently (0 = auto)
    pub max_concurrency: usize,
    /// Token budget for each summary and interpretation
    pub token_budget: u32,
}

/// Text completion service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompletionConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

/// Speech synthesis service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeechConfig {
    pub base_url: String,
    pub model: String,
    pub voice: String,
    pub format: String,
    pub max_chunk_chars: usize,
    pub timeout_secs: u64,
}

/// Audio player configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaybackConfig {
    pub player: String,
    pub player_args: Vec<String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 0,
            token_budget: defaults::TOKEN_BUDGET,
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::BASE_URL.to_string(),
            model: defaults::COMPLETION_MODEL.to_string(),
            timeout_secs: defaults::COMPLETION_TIMEOUT_SECS,
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::BASE_URL.to_string(),
            model: defaults::SPEECH_MODEL.to_string(),
            voice: defaults::VOICE.to_string(),
            format: defaults::AUDIO_FORMAT.to_string(),
            max_chunk_chars: defaults::MAX_CHUNK_CHARS,
            timeout_secs: defaults::SPEECH_TIMEOUT_SECS,
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            player: defaults::PLAYER.to_string(),
            player_args: defaults::PLAYER_ARGS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e)
                if e.downcast_ref::<std::io::Error>()
                    .is_some_and(|io_err| io_err.kind() == std::io::ErrorKind::NotFound) =>
            {
                Ok(Self::default())
            }
            Err(e) => Err(e.context(format!("Failed to load config from {}", path.display()))),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - PAGECAST_MODEL → completion.model
    /// - PAGECAST_VOICE → speech.voice
    /// - PAGECAST_BASE_URL → completion.base_url and speech.base_url
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("PAGECAST_MODEL")
            && !model.is_empty()
        {
            self.completion.model = model;
        }

        if let Ok(voice) = std::env::var("PAGECAST_VOICE")
            && !voice.is_empty()
        {
            self.speech.voice = voice;
        }

        if let Ok(url) = std::env::var("PAGECAST_BASE_URL")
            && !url.is_empty()
        {
            self.completion.base_url = url.clone();
            self.speech.base_url = url;
        }

        self
    }

    /// Check values that would otherwise fail deep inside a run.
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.token_budget == 0 {
            return Err(PagecastError::ConfigInvalidValue {
                key: "pipeline.token_budget".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.speech.max_chunk_chars == 0 {
            return Err(PagecastError::ConfigInvalidValue {
                key: "speech.max_chunk_chars".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.speech.max_chunk_chars > defaults::SPEECH_INPUT_LIMIT {
            return Err(PagecastError::ConfigInvalidValue {
                key: "speech.max_chunk_chars".to_string(),
                message: format!(
                    "{} exceeds the speech service limit of {}",
                    self.speech.max_chunk_chars,
                    defaults::SPEECH_INPUT_LIMIT
                ),
            });
        }
        if self.playback.player.trim().is_empty() {
            return Err(PagecastError::ConfigInvalidValue {
                key: "playback.player".to_string(),
                message: "must name an executable".to_string(),
            });
        }
        Ok(())
    }

    /// Worker pool size, resolving 0 to the automatic default.
    pub fn effective_concurrency(&self) -> usize {
        match self.pipeline.max_concurrency {
            0 => defaults::max_concurrency(),
            n => n,
        }
    }

    /// Serialize to TOML, as written by `pagecast config init`.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| PagecastError::ConfigParse {
            message: e.to_string(),
        })
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/pagecast/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("pagecast")
            .join("config.toml")
    }
}
