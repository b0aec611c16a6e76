//! REST implementation of [`MusicService`].
//!
//! `RestSpotifyClient` wraps a `reqwest::Client` and translates every trait
//! method into the corresponding Spotify Web API call. The access token is
//! refreshed transparently when it is close to expiry and the refreshed
//! token is written back to the cache.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use pa_domain::config::SpotifyConfig;
use pa_domain::error::{Error, Result};
use pa_domain::trace::TraceEvent;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::auth::{self, SpotifyCredentials, SpotifyTokens, TokenStore};
use crate::provider::MusicService;
use crate::types::{
    AddTracksBody, CreatePlaylistBody, PlaylistObject, SearchResponse, SnapshotResponse,
    SpotifyUser, TrackCandidate,
};

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
pub fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A REST-based client for the Spotify Web API.
///
/// Created once at startup and shared for the lifetime of the process.
/// The underlying `reqwest::Client` maintains a connection pool.
pub struct RestSpotifyClient {
    http: Client,
    api_base_url: String,
    accounts_base_url: String,
    credentials: SpotifyCredentials,
    store: TokenStore,
    tokens: Mutex<SpotifyTokens>,
    timeout: Duration,
}

impl RestSpotifyClient {
    /// The configured request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build a client from config, credentials, and the token cache.
    ///
    /// Fails when no token has been cached yet; the user has to run
    /// `playlist-agent login` first.
    pub fn new(cfg: &SpotifyConfig, credentials: SpotifyCredentials, store: TokenStore) -> Result<Self> {
        let tokens = store.load()?.ok_or_else(|| {
            Error::Auth(format!(
                "no cached Spotify token at {}; run `playlist-agent login` first",
                store.path().display()
            ))
        })?;

        let timeout = Duration::from_millis(cfg.timeout_ms);
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            http,
            api_base_url: cfg.api_base_url.trim_end_matches('/').to_owned(),
            accounts_base_url: cfg.accounts_base_url.clone(),
            credentials,
            store,
            tokens: Mutex::new(tokens),
            timeout,
        })
    }

    // ── request helpers ──────────────────────────────────────────────

    /// Build the full URL for a path like `/me`.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    /// Current access token, refreshing it first when it is about to expire.
    async fn access_token(&self) -> Result<String> {
        let mut tokens = self.tokens.lock().await;
        let now = chrono::Utc::now().timestamp();
        if tokens.needs_refresh(now) {
            tracing::info!(expires_at = tokens.expires_at, "refreshing Spotify access token");
            let resp = auth::refresh_token(
                &self.http,
                &self.accounts_base_url,
                &self.credentials,
                &tokens.refresh_token,
            )
            .await?;
            let refreshed = resp.into_tokens(now, Some(&tokens.refresh_token))?;
            if let Err(e) = self.store.save(&refreshed) {
                tracing::warn!(error = %e, "failed to persist refreshed Spotify token");
            }
            *tokens = refreshed;
        }
        Ok(tokens.access_token.clone())
    }

    /// Decorate a `RequestBuilder` with auth and a trace id.
    async fn decorate(&self, rb: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.access_token().await?;
        Ok(rb
            .bearer_auth(token)
            .header("X-Trace-Id", Uuid::new_v4().to_string()))
    }

    /// Send a request once, mapping non-2xx statuses to domain errors.
    ///
    /// * 401 / 403 become [`Error::Auth`].
    /// * Every other failure status becomes [`Error::Spotify`].
    /// * Emits a `TraceEvent::SpotifyCall` for every attempt.
    async fn execute(&self, endpoint: &str, rb: RequestBuilder) -> Result<Response> {
        let rb = self.decorate(rb).await?;
        let start = Instant::now();
        let result = rb.send().await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(resp) => {
                let status = resp.status();
                TraceEvent::SpotifyCall {
                    endpoint: endpoint.to_owned(),
                    status: status.as_u16(),
                    duration_ms,
                }
                .emit();

                if status.is_success() {
                    return Ok(resp);
                }
                let body = resp.text().await.unwrap_or_default();
                if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                    return Err(Error::Auth(format!(
                        "{endpoint} auth failed ({}): {body}",
                        status.as_u16()
                    )));
                }
                Err(Error::Spotify(format!(
                    "{endpoint} returned {}: {body}",
                    status.as_u16()
                )))
            }
            Err(e) => {
                TraceEvent::SpotifyCall {
                    endpoint: endpoint.to_owned(),
                    status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                    duration_ms,
                }
                .emit();
                Err(from_reqwest(e))
            }
        }
    }

    async fn parse<T: serde::de::DeserializeOwned>(endpoint: &str, resp: Response) -> Result<T> {
        let body = resp.text().await.map_err(from_reqwest)?;
        serde_json::from_str(&body)
            .map_err(|e| Error::Spotify(format!("failed to parse {endpoint} response: {e}: {body}")))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait]
impl MusicService for RestSpotifyClient {
    async fn current_user(&self) -> Result<SpotifyUser> {
        let endpoint = "GET /me";
        let resp = self.execute(endpoint, self.http.get(self.url("/me"))).await?;
        Self::parse(endpoint, resp).await
    }

    async fn create_playlist(&self, user_id: &str, name: &str) -> Result<String> {
        let endpoint = "POST /users/{user_id}/playlists";
        let url = self.url(&format!("/users/{user_id}/playlists"));
        let body = CreatePlaylistBody { name, public: true };
        let resp = self.execute(endpoint, self.http.post(url).json(&body)).await?;
        let playlist: PlaylistObject = Self::parse(endpoint, resp).await?;
        tracing::debug!(playlist_id = %playlist.id, name = %playlist.name, "playlist created");
        Ok(playlist.id)
    }

    async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<TrackCandidate>> {
        let endpoint = "GET /search";
        let limit = limit.to_string();
        let rb = self
            .http
            .get(self.url("/search"))
            .query(&[("q", query), ("type", "track"), ("limit", limit.as_str())]);
        let resp = self.execute(endpoint, rb).await?;
        let search: SearchResponse = Self::parse(endpoint, resp).await?;
        Ok(search.into_candidates())
    }

    async fn add_tracks(&self, user_id: &str, playlist_id: &str, uris: &[String]) -> Result<()> {
        let endpoint = "POST /playlists/{playlist_id}/tracks";
        let url = self.url(&format!("/playlists/{playlist_id}/tracks"));
        let resp = self
            .execute(endpoint, self.http.post(url).json(&AddTracksBody { uris }))
            .await?;
        let snapshot: SnapshotResponse = Self::parse(endpoint, resp).await?;
        tracing::debug!(
            user_id = %user_id,
            playlist_id = %playlist_id,
            count = uris.len(),
            snapshot_id = %snapshot.snapshot_id,
            "tracks added"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> SpotifyCredentials {
        SpotifyCredentials {
            client_id: "cid".into(),
            client_secret: "secret".into(),
            redirect_uri: "http://localhost/cb".into(),
            scope: "playlist-modify-public".into(),
        }
    }

    #[test]
    fn new_without_cached_token_asks_for_login() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        let err = RestSpotifyClient::new(&SpotifyConfig::default(), creds(), store)
            .err()
            .unwrap();
        assert!(matches!(err, Error::Auth(_)));
        assert!(err.to_string().contains("playlist-agent login"));
    }

    #[test]
    fn new_with_cached_token_builds_urls() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        store
            .save(&SpotifyTokens {
                access_token: "at".into(),
                refresh_token: "rt".into(),
                expires_at: i64::MAX,
                scope: None,
            })
            .unwrap();
        let cfg = SpotifyConfig {
            api_base_url: "https://api.spotify.com/v1/".into(),
            ..Default::default()
        };
        let client = RestSpotifyClient::new(&cfg, creds(), store).unwrap();
        assert_eq!(client.url("/me"), "https://api.spotify.com/v1/me");
        assert_eq!(client.timeout(), Duration::from_millis(10_000));
    }

    #[tokio::test]
    async fn fresh_token_is_used_without_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        store
            .save(&SpotifyTokens {
                access_token: "still-valid".into(),
                refresh_token: "rt".into(),
                expires_at: chrono::Utc::now().timestamp() + 3_600,
                scope: None,
            })
            .unwrap();
        let client = RestSpotifyClient::new(&SpotifyConfig::default(), creds(), store).unwrap();
        assert_eq!(client.access_token().await.unwrap(), "still-valid");
    }
}
