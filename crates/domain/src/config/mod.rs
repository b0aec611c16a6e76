mod chat;
mod llm;
mod spotify;

pub use chat::*;
pub use llm::*;
pub use spotify::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub spotify: SpotifyConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl ConfigError {
    fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { severity: ConfigSeverity::Error, field: field.into(), message: message.into() }
    }
    fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { severity: ConfigSeverity::Warning, field: field.into(), message: message.into() }
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.llm.base_url.is_empty() {
            errors.push(ConfigError::error("llm.base_url", "base_url must not be empty"));
        }
        if self.llm.model.is_empty() {
            errors.push(ConfigError::error("llm.model", "model must not be empty"));
        }
        if !TEMPERATURE_RANGE.contains(&self.llm.temperature) {
            errors.push(ConfigError::error(
                "llm.temperature",
                format!("temperature {} is outside 0.0 - 2.0", self.llm.temperature),
            ));
        }
        if self.llm.api_key.is_some() {
            errors.push(ConfigError::warning(
                "llm.api_key",
                "plaintext API key in config file (prefer api_key_env)",
            ));
        }

        if self.spotify.api_base_url.is_empty() {
            errors.push(ConfigError::error("spotify.api_base_url", "api_base_url must not be empty"));
        }
        if self.spotify.accounts_base_url.is_empty() {
            errors.push(ConfigError::error(
                "spotify.accounts_base_url",
                "accounts_base_url must not be empty",
            ));
        }
        if self.spotify.search_limit == 0 || self.spotify.search_limit > 50 {
            errors.push(ConfigError::error(
                "spotify.search_limit",
                "search_limit must be between 1 and 50",
            ));
        }

        if self.chat.max_action_rounds == 0 {
            errors.push(ConfigError::error(
                "chat.max_action_rounds",
                "max_action_rounds must be greater than 0",
            ));
        }
        if self.chat.system_prompt.trim().is_empty() {
            errors.push(ConfigError::warning(
                "chat.system_prompt",
                "empty system prompt; the assistant will have no instructions",
            ));
        }

        errors
    }

    /// True when `validate()` reports at least one error-severity issue.
    pub fn has_errors(&self) -> bool {
        self.validate().iter().any(|e| e.severity == ConfigSeverity::Error)
    }
}
