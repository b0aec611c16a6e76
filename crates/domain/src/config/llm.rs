use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LLM completion endpoint
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Valid sampling temperature range accepted by the completion API.
pub const TEMPERATURE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=2.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider id used in logs and error messages.
    #[serde(default = "d_provider_id")]
    pub provider_id: String,
    /// Base URL of an OpenAI-compatible chat completions API.
    #[serde(default = "d_base_url")]
    pub base_url: String,
    #[serde(default = "d_model")]
    pub model: String,
    /// Sampling temperature (0.0 - 2.0). The REPL can override it per session.
    #[serde(default = "d_temperature")]
    pub temperature: f64,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default = "d_60000u")]
    pub timeout_ms: u64,
    /// Environment variable holding the API key.
    #[serde(default = "d_api_key_env")]
    pub api_key_env: String,
    /// Plaintext API key. Prefer `api_key_env`; this exists for local testing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider_id: d_provider_id(),
            base_url: d_base_url(),
            model: d_model(),
            temperature: d_temperature(),
            max_tokens: None,
            timeout_ms: d_60000u(),
            api_key_env: d_api_key_env(),
            api_key: None,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_provider_id() -> String {
    "openai".into()
}
fn d_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn d_model() -> String {
    "gpt-4o-mini".into()
}
fn d_temperature() -> f64 {
    0.7
}
fn d_60000u() -> u64 {
    60_000
}
fn d_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_config_defaults() {
        let config = LlmConfig::default();
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.model, "gpt-4o-mini");
        assert!((config.temperature - 0.7).abs() < 1e-10);
        assert_eq!(config.api_key_env, "OPENAI_API_KEY");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn partial_llm_config_fills_defaults() {
        let json = r#"{ "model": "gpt-4o", "temperature": 1.2 }"#;
        let config: LlmConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert!((config.temperature - 1.2).abs() < 1e-10);
        assert_eq!(config.timeout_ms, 60_000);
        assert_eq!(config.provider_id, "openai");
    }

    #[test]
    fn temperature_range_bounds() {
        assert!(TEMPERATURE_RANGE.contains(&0.0));
        assert!(TEMPERATURE_RANGE.contains(&2.0));
        assert!(!TEMPERATURE_RANGE.contains(&2.1));
    }
}
