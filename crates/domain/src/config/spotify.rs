use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Spotify Web API
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Connection and credential settings for the Spotify Web API.
///
/// Credentials are never stored here directly; each `*_env` field names the
/// environment variable that holds the value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyConfig {
    #[serde(default = "d_client_id_env")]
    pub client_id_env: String,
    #[serde(default = "d_client_secret_env")]
    pub client_secret_env: String,
    #[serde(default = "d_redirect_uri_env")]
    pub redirect_uri_env: String,
    /// Environment variable that overrides `scope` when set.
    #[serde(default = "d_scope_env")]
    pub scope_env: String,
    #[serde(default = "d_scope")]
    pub scope: String,
    #[serde(default = "d_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "d_accounts_base_url")]
    pub accounts_base_url: String,
    /// Number of candidates requested per track search.
    #[serde(default = "d_search_limit")]
    pub search_limit: u32,
    #[serde(default = "d_10000u")]
    pub timeout_ms: u64,
    /// Where OAuth tokens are cached between runs.
    /// Defaults to `~/.playlist-agent/spotify-token.json` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_cache_path: Option<PathBuf>,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id_env: d_client_id_env(),
            client_secret_env: d_client_secret_env(),
            redirect_uri_env: d_redirect_uri_env(),
            scope_env: d_scope_env(),
            scope: d_scope(),
            api_base_url: d_api_base_url(),
            accounts_base_url: d_accounts_base_url(),
            search_limit: d_search_limit(),
            timeout_ms: d_10000u(),
            token_cache_path: None,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_client_id_env() -> String {
    "SPOTIPY_CLIENT_ID".into()
}
fn d_client_secret_env() -> String {
    "SPOTIPY_CLIENT_SECRET".into()
}
fn d_redirect_uri_env() -> String {
    "SPOTIPY_REDIRECT_URI".into()
}
fn d_scope_env() -> String {
    "SPOTIPY_SCOPE".into()
}
fn d_scope() -> String {
    "playlist-modify-public playlist-modify-private".into()
}
fn d_api_base_url() -> String {
    "https://api.spotify.com/v1".into()
}
fn d_accounts_base_url() -> String {
    "https://accounts.spotify.com".into()
}
fn d_search_limit() -> u32 {
    10
}
fn d_10000u() -> u64 {
    10_000
}
