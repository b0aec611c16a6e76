//! Spotify OAuth 2.0 authorization-code flow and token cache.
//!
//! Token lifecycle:
//! - `playlist-agent login` prints an authorize URL, the user approves in a
//!   browser and pastes back the redirected URL (or just the code).
//! - The code is exchanged for an access + refresh token pair which is cached
//!   at `~/.playlist-agent/spotify-token.json` with `0o600` permissions on Unix.
//! - Access tokens last one hour; a refresh happens within 5 minutes of expiry.

use pa_domain::config::SpotifyConfig;
use pa_domain::error::{Error, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Constants
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Proactive refresh window: refresh when less than 5 minutes remain.
const REFRESH_WINDOW_SECS: i64 = 300;

/// Default `expires_in` when the token response omits it.
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 3_600;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Credentials
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Application credentials registered with the Spotify developer dashboard.
///
/// `Debug` is manually implemented to redact the client secret.
#[derive(Clone)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scope: String,
}

impl std::fmt::Debug for SpotifyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("scope", &self.scope)
            .finish()
    }
}

impl SpotifyCredentials {
    /// Read credentials from the environment variables named in `cfg`.
    ///
    /// Client id, secret and redirect URI are required; the scope variable is
    /// optional and falls back to `cfg.scope`.
    pub fn from_env(cfg: &SpotifyConfig) -> Result<Self> {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let client_id = read(&cfg.client_id_env);
        let client_secret = read(&cfg.client_secret_env);
        let redirect_uri = read(&cfg.redirect_uri_env);

        match (client_id, client_secret, redirect_uri) {
            (Some(client_id), Some(client_secret), Some(redirect_uri)) => Ok(Self {
                client_id,
                client_secret,
                redirect_uri,
                scope: read(&cfg.scope_env).unwrap_or_else(|| cfg.scope.clone()),
            }),
            (id, secret, redirect) => {
                let missing: Vec<&str> = [
                    (id.is_none(), cfg.client_id_env.as_str()),
                    (secret.is_none(), cfg.client_secret_env.as_str()),
                    (redirect.is_none(), cfg.redirect_uri_env.as_str()),
                ]
                .into_iter()
                .filter_map(|(absent, name)| absent.then_some(name))
                .collect();
                Err(Error::Config(format!(
                    "Missing Spotify API credentials: {} not set",
                    missing.join(", ")
                )))
            }
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tokens
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Cached OAuth tokens.
///
/// `Debug` is manually implemented to redact secrets.
#[derive(Clone, Serialize, Deserialize)]
pub struct SpotifyTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp (seconds) when the access token expires.
    pub expires_at: i64,
    #[serde(default)]
    pub scope: Option<String>,
}

impl std::fmt::Debug for SpotifyTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyTokens")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .finish()
    }
}

impl SpotifyTokens {
    /// True when the access token expires within the refresh window of `now`.
    pub fn needs_refresh(&self, now: i64) -> bool {
        self.expires_at - now < REFRESH_WINDOW_SECS
    }
}

/// Response from the token endpoint (both initial grant and refresh).
///
/// `Debug` is manually implemented to redact secrets.
#[derive(Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish()
    }
}

impl TokenResponse {
    /// Convert into cached tokens. A refresh response usually omits the
    /// refresh token, in which case `previous_refresh` is kept.
    pub fn into_tokens(self, now: i64, previous_refresh: Option<&str>) -> Result<SpotifyTokens> {
        let refresh_token = match (self.refresh_token, previous_refresh) {
            (Some(r), _) => r,
            (None, Some(prev)) => prev.to_owned(),
            (None, None) => {
                return Err(Error::Auth("token response did not include a refresh token".into()))
            }
        };
        let expires_in = self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS) as i64;
        Ok(SpotifyTokens {
            access_token: self.access_token,
            refresh_token,
            expires_at: now + expires_in,
            scope: self.scope,
        })
    }
}

/// Error body returned by the accounts service.
#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Token storage
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Persistent file-based store for Spotify tokens.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `cfg.token_cache_path`, or `~/.playlist-agent/spotify-token.json`.
    pub fn from_config(cfg: &SpotifyConfig) -> Result<Self> {
        if let Some(ref p) = cfg.token_cache_path {
            return Ok(Self::new(p.clone()));
        }
        let home = dirs::home_dir().ok_or_else(|| {
            Error::Auth("unable to determine home directory for Spotify token storage".into())
        })?;
        Ok(Self::new(home.join(".playlist-agent").join("spotify-token.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load cached tokens, or `None` when nothing has been stored yet.
    ///
    /// Acquires a shared (read) lock to prevent reading while another
    /// process is writing.
    pub fn load(&self) -> Result<Option<SpotifyTokens>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let file = std::fs::File::open(&self.path)?;
        fs2::FileExt::lock_shared(&file)
            .map_err(|e| Error::Auth(format!("token store lock failed: {e}")))?;
        let raw = std::io::read_to_string(&file)?;
        fs2::FileExt::unlock(&file)
            .map_err(|e| Error::Auth(format!("token store unlock failed: {e}")))?;
        let tokens: SpotifyTokens = serde_json::from_str(&raw)
            .map_err(|e| Error::Auth(format!("corrupt token store: {e}")))?;
        Ok(Some(tokens))
    }

    /// Write tokens to disk, creating the parent directory if needed.
    ///
    /// On Unix the file is opened with mode `0o600` from the start so tokens
    /// are never world-readable. An exclusive file lock prevents concurrent
    /// writes from corrupting the store.
    pub fn save(&self, tokens: &SpotifyTokens) -> Result<()> {
        use std::io::Write;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(tokens)?;

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let file = options.open(&self.path)?;
        fs2::FileExt::lock_exclusive(&file)
            .map_err(|e| Error::Auth(format!("token store lock failed: {e}")))?;
        let mut writer = std::io::BufWriter::new(file);
        writer.write_all(json.as_bytes())?;
        writer.flush()?;
        // Lock is released when the file is dropped.
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Authorization-code flow
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Build the URL the user opens to approve access.
pub fn authorize_url(accounts_base_url: &str, creds: &SpotifyCredentials, state: &str) -> Result<String> {
    let base = format!("{}/authorize", accounts_base_url.trim_end_matches('/'));
    let url = Url::parse_with_params(
        &base,
        &[
            ("client_id", creds.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", creds.redirect_uri.as_str()),
            ("scope", creds.scope.as_str()),
            ("state", state),
        ],
    )
    .map_err(|e| Error::Config(format!("invalid accounts_base_url '{base}': {e}")))?;
    Ok(url.into())
}

/// Pull the authorization code out of what the user pasted.
///
/// Accepts either the full redirected URL (`...?code=...&state=...`) or the
/// bare code. When a URL carries a `state`, it must match `expected_state`.
pub fn extract_code(input: &str, expected_state: &str) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::Auth("no authorization code provided".into()));
    }

    let Ok(url) = Url::parse(input) else {
        return Ok(input.to_owned());
    };

    let mut code = None;
    let mut state = None;
    for (k, v) in url.query_pairs() {
        match k.as_ref() {
            "code" => code = Some(v.into_owned()),
            "state" => state = Some(v.into_owned()),
            "error" => return Err(Error::Auth(format!("authorization denied: {v}"))),
            _ => {}
        }
    }

    if let Some(state) = state {
        if state != expected_state {
            return Err(Error::Auth("state mismatch in redirected URL".into()));
        }
    }
    code.ok_or_else(|| Error::Auth("redirected URL has no 'code' parameter".into()))
}

/// Exchange an authorization code for tokens.
pub async fn exchange_code(
    client: &reqwest::Client,
    accounts_base_url: &str,
    creds: &SpotifyCredentials,
    code: &str,
) -> Result<TokenResponse> {
    token_request(
        client,
        accounts_base_url,
        creds,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", creds.redirect_uri.as_str()),
        ],
        "code exchange",
    )
    .await
}

/// Refresh an access token using a refresh token.
pub async fn refresh_token(
    client: &reqwest::Client,
    accounts_base_url: &str,
    creds: &SpotifyCredentials,
    refresh_tok: &str,
) -> Result<TokenResponse> {
    token_request(
        client,
        accounts_base_url,
        creds,
        &[("grant_type", "refresh_token"), ("refresh_token", refresh_tok)],
        "token refresh",
    )
    .await
}

async fn token_request(
    client: &reqwest::Client,
    accounts_base_url: &str,
    creds: &SpotifyCredentials,
    form: &[(&str, &str)],
    what: &str,
) -> Result<TokenResponse> {
    let url = format!("{}/api/token", accounts_base_url.trim_end_matches('/'));
    let resp = client
        .post(&url)
        .basic_auth(&creds.client_id, Some(&creds.client_secret))
        .form(form)
        .send()
        .await
        .map_err(|e| Error::Auth(format!("{what} request failed: {e}")))?;

    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| Error::Auth(format!("reading {what} response: {e}")))?;

    if !status.is_success() {
        let detail = match serde_json::from_str::<OAuthErrorResponse>(&body) {
            Ok(err) => match err.error_description {
                Some(desc) => format!("{}: {desc}", err.error),
                None => err.error,
            },
            Err(_) => body,
        };
        return Err(Error::Auth(format!(
            "{what} returned HTTP {}: {detail}",
            status.as_u16()
        )));
    }

    serde_json::from_str(&body).map_err(|e| Error::Auth(format!("parsing {what} response: {e}")))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> SpotifyCredentials {
        SpotifyCredentials {
            client_id: "cid".into(),
            client_secret: "secret".into(),
            redirect_uri: "http://localhost:8888/callback".into(),
            scope: "playlist-modify-public playlist-modify-private".into(),
        }
    }

    fn tokens(expires_at: i64) -> SpotifyTokens {
        SpotifyTokens {
            access_token: "at".into(),
            refresh_token: "rt".into(),
            expires_at,
            scope: None,
        }
    }

    #[test]
    fn needs_refresh_inside_window() {
        assert!(tokens(1_000 + 299).needs_refresh(1_000));
        assert!(tokens(900).needs_refresh(1_000));
        assert!(!tokens(1_000 + 301).needs_refresh(1_000));
    }

    #[test]
    fn refresh_response_keeps_previous_refresh_token() {
        let resp = TokenResponse {
            access_token: "new".into(),
            refresh_token: None,
            expires_in: Some(3600),
            scope: None,
        };
        let t = resp.into_tokens(100, Some("old-rt")).unwrap();
        assert_eq!(t.access_token, "new");
        assert_eq!(t.refresh_token, "old-rt");
        assert_eq!(t.expires_at, 3700);
    }

    #[test]
    fn initial_grant_without_refresh_token_fails() {
        let resp = TokenResponse {
            access_token: "new".into(),
            refresh_token: None,
            expires_in: None,
            scope: None,
        };
        assert!(resp.into_tokens(0, None).is_err());
    }

    #[test]
    fn debug_redacts_secrets() {
        let rendered = format!("{:?} {:?}", tokens(0), creds());
        assert!(!rendered.contains("\"at\""));
        assert!(!rendered.contains("secret\""));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn authorize_url_carries_query() {
        let url = authorize_url("https://accounts.spotify.com/", &creds(), "st1").unwrap();
        assert!(url.starts_with("https://accounts.spotify.com/authorize?"));
        assert!(url.contains("client_id=cid"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("state=st1"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8888%2Fcallback"));
    }

    #[test]
    fn extract_code_from_redirect_url() {
        let code = extract_code("http://localhost:8888/callback?code=abc123&state=st1", "st1").unwrap();
        assert_eq!(code, "abc123");
    }

    #[test]
    fn extract_code_accepts_bare_code() {
        assert_eq!(extract_code("  abc123\n", "st1").unwrap(), "abc123");
    }

    #[test]
    fn extract_code_rejects_state_mismatch_and_errors() {
        assert!(extract_code("http://localhost/cb?code=abc&state=other", "st1").is_err());
        let err = extract_code("http://localhost/cb?error=access_denied&state=st1", "st1").unwrap_err();
        assert!(err.to_string().contains("access_denied"));
        assert!(extract_code("", "st1").is_err());
    }

    #[test]
    fn store_roundtrip_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("nested").join("token.json"));
        assert!(store.load().unwrap().is_none());

        store.save(&tokens(42)).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.access_token, "at");
        assert_eq!(loaded.expires_at, 42);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn corrupt_store_is_auth_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "not json").unwrap();
        let err = TokenStore::new(&path).load().unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[test]
    fn credentials_report_every_missing_variable() {
        let cfg = SpotifyConfig {
            client_id_env: "PA_TEST_SPOTIFY_ID_MISSING".into(),
            client_secret_env: "PA_TEST_SPOTIFY_SECRET_MISSING".into(),
            redirect_uri_env: "PA_TEST_SPOTIFY_REDIRECT_MISSING".into(),
            ..Default::default()
        };
        let err = SpotifyCredentials::from_env(&cfg).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, Error::Config(_)));
        assert!(msg.contains("Missing Spotify API credentials"));
        assert!(msg.contains("PA_TEST_SPOTIFY_ID_MISSING"));
        assert!(msg.contains("PA_TEST_SPOTIFY_REDIRECT_MISSING"));
    }

    #[test]
    fn credentials_scope_falls_back_to_config() {
        std::env::set_var("PA_TEST_SPOTIFY_ID_OK", "id");
        std::env::set_var("PA_TEST_SPOTIFY_SECRET_OK", "secret");
        std::env::set_var("PA_TEST_SPOTIFY_REDIRECT_OK", "http://localhost/cb");
        let cfg = SpotifyConfig {
            client_id_env: "PA_TEST_SPOTIFY_ID_OK".into(),
            client_secret_env: "PA_TEST_SPOTIFY_SECRET_OK".into(),
            redirect_uri_env: "PA_TEST_SPOTIFY_REDIRECT_OK".into(),
            scope_env: "PA_TEST_SPOTIFY_SCOPE_UNSET".into(),
            ..Default::default()
        };
        let creds = SpotifyCredentials::from_env(&cfg).unwrap();
        assert_eq!(creds.client_id, "id");
        assert_eq!(creds.scope, cfg.scope);
    }
}
