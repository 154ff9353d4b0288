//! Configuration loading and validation for pitchside.
//!
//! Loads configuration from `~/.pitchside/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.pitchside/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Anthropic API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the Messages API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model used for the agent loop and the nested tool prompts
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens per model response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Reasoning budget in tokens; 0 disables the reasoning trace
    #[serde(default = "default_thinking_budget")]
    pub thinking_budget: u32,

    /// Sampling temperature (ignored while reasoning is enabled)
    #[serde(default)]
    pub temperature: f32,

    #[serde(default)]
    pub agent: AgentSettings,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub data: DataSettings,
}

fn default_api_url() -> String {
    "https://api.anthropic.com".into()
}
fn default_model() -> String {
    "claude-3-7-sonnet-20250219".into()
}
fn default_max_tokens() -> u32 {
    4000
}
fn default_thinking_budget() -> u32 {
    1024
}

/// Smallest reasoning budget the Messages API accepts.
pub const MIN_THINKING_BUDGET: u32 = 1024;

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("thinking_budget", &self.thinking_budget)
            .field("temperature", &self.temperature)
            .field("agent", &self.agent)
            .field("retry", &self.retry)
            .field("data", &self.data)
            .finish()
    }
}

/// Agent loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Model round-trips allowed per invocation
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Name of the tool whose call ends the loop
    #[serde(default = "default_completion_tool")]
    pub completion_tool: String,
}

fn default_max_iterations() -> u32 {
    15
}
fn default_completion_tool() -> String {
    "complete_task".into()
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            completion_tool: default_completion_tool(),
        }
    }
}

/// Rate-limit backoff settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts per gateway call, the first one included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: u64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay_secs() -> u64 {
    5
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_secs: default_base_delay_secs(),
        }
    }
}

/// Where the data lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSettings {
    /// Match dataset (JSON lines or a JSON array)
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,

    /// SQLite file holding team groups
    #[serde(default = "default_groups_db")]
    pub groups_db: PathBuf,

    /// Directory of saved conversations
    #[serde(default = "default_conversations_dir")]
    pub conversations_dir: PathBuf,

    /// Row cap applied to ad-hoc SQL results
    #[serde(default = "default_max_result_rows")]
    pub max_result_rows: usize,
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("data/matches.jsonl")
}
fn default_groups_db() -> PathBuf {
    AppConfig::config_dir().join("team_groups.db")
}
fn default_conversations_dir() -> PathBuf {
    AppConfig::config_dir().join("conversations")
}
fn default_max_result_rows() -> usize {
    200
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            dataset_path: default_dataset_path(),
            groups_db: default_groups_db(),
            conversations_dir: default_conversations_dir(),
            max_result_rows: default_max_result_rows(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.pitchside/config.toml).
    ///
    /// Environment overrides:
    /// - `ANTHROPIC_API_KEY`, then `PITCHSIDE_API_KEY`, when no key is configured
    /// - `PITCHSIDE_MODEL`
    /// - `PITCHSIDE_DATA_FILE`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .or_else(|| std::env::var("PITCHSIDE_API_KEY").ok())
                .filter(|k| !k.trim().is_empty());
        }

        if let Ok(model) = std::env::var("PITCHSIDE_MODEL") {
            config.model = model;
        }

        if let Ok(path) = std::env::var("PITCHSIDE_DATA_FILE") {
            config.data.dataset_path = PathBuf::from(path);
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".pitchside")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 1.0".into(),
            ));
        }

        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationError("max_tokens must be > 0".into()));
        }

        if self.thinking_budget != 0 {
            if self.thinking_budget < MIN_THINKING_BUDGET {
                return Err(ConfigError::ValidationError(format!(
                    "thinking_budget must be 0 or at least {MIN_THINKING_BUDGET}"
                )));
            }
            if self.thinking_budget >= self.max_tokens {
                return Err(ConfigError::ValidationError(
                    "thinking_budget must be smaller than max_tokens".into(),
                ));
            }
        }

        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be > 0".into(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Reasoning budget as the gateway expects it.
    pub fn reasoning_budget(&self) -> Option<u32> {
        (self.thinking_budget > 0).then_some(self.thinking_budget)
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            thinking_budget: default_thinking_budget(),
            temperature: 0.0,
            agent: AgentSettings::default(),
            retry: RetrySettings::default(),
            data: DataSettings::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
