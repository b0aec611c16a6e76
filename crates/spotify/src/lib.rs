//! `pa-spotify`: Spotify Web API client for the playlist agent.
//!
//! Provides the [`MusicService`] trait the playlist actions are written
//! against, a production REST implementation ([`RestSpotifyClient`]),
//! typed DTOs for the endpoints we call, and the OAuth
//! authorization-code flow with an on-disk token cache.
//!
//! | Operation         | Endpoint                              |
//! |-------------------|---------------------------------------|
//! | `current_user`    | `GET /me`                             |
//! | `create_playlist` | `POST /users/{user_id}/playlists`     |
//! | `search_tracks`   | `GET /search?type=track`              |
//! | `add_tracks`      | `POST /playlists/{playlist_id}/tracks`|
//!
//! # Quick start
//!
//! ```rust,no_run
//! use pa_domain::config::SpotifyConfig;
//! use pa_spotify::{MusicService, RestSpotifyClient, SpotifyCredentials, TokenStore};
//!
//! # async fn example() -> pa_domain::error::Result<()> {
//! let cfg = SpotifyConfig::default();
//! let creds = SpotifyCredentials::from_env(&cfg)?;
//! let client = RestSpotifyClient::new(&cfg, creds, TokenStore::from_config(&cfg)?)?;
//!
//! let me = client.current_user().await?;
//! let hits = client.search_tracks("track:Teardrop artist:Massive Attack", 10).await?;
//! println!("{} sees {} candidates", me.label(), hits.len());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod provider;
pub mod rest;
pub mod types;

// ── Re-exports for ergonomic imports ─────────────────────────────────

pub use auth::{SpotifyCredentials, SpotifyTokens, TokenStore};
pub use provider::MusicService;
pub use rest::{from_reqwest, RestSpotifyClient};
pub use types::{SpotifyUser, TrackCandidate, MAX_URIS_PER_ADD};
