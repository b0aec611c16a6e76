//! Shared utility functions for provider adapters.

use pa_domain::config::LlmConfig;
use pa_domain::error::{Error, Result};

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
///
/// Timeout errors map to [`Error::Timeout`]; everything else maps to
/// [`Error::Http`].
pub fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

/// Resolve the API key for the completion endpoint.
///
/// Precedence:
/// 1. `api_key` field (plaintext, warn)
/// 2. the environment variable named by `api_key_env`
/// 3. Error
pub fn resolve_api_key(cfg: &LlmConfig) -> Result<String> {
    if let Some(ref key) = cfg.api_key {
        tracing::warn!(
            "API key loaded from plaintext config field 'api_key'; \
             prefer 'api_key_env' instead"
        );
        return Ok(key.clone());
    }

    match std::env::var(&cfg.api_key_env) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::Config(format!(
            "environment variable '{}' not set; the LLM API key is required",
            cfg.api_key_env
        ))),
    }
}
