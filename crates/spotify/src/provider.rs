//! The `MusicService` trait defines the interface the playlist actions use
//! to talk to a music catalogue (the Spotify Web API, or a test double).

use async_trait::async_trait;
use pa_domain::error::Result;

use crate::types::{SpotifyUser, TrackCandidate};

/// Abstraction over the music-service API surface.
///
/// All methods return `pa_domain::error::Result`. Implementations perform no
/// retries; a failed call is reported to the caller as-is.
#[async_trait]
pub trait MusicService: Send + Sync {
    /// The authenticated user (GET /me).
    async fn current_user(&self) -> Result<SpotifyUser>;

    /// Create a playlist owned by `user_id` and return its id
    /// (POST /users/{user_id}/playlists).
    async fn create_playlist(&self, user_id: &str, name: &str) -> Result<String>;

    /// Search the track catalogue (GET /search?type=track), returning at most
    /// `limit` candidates in the service's ranking order.
    async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<TrackCandidate>>;

    /// Append `uris` to a playlist (POST /playlists/{playlist_id}/tracks).
    ///
    /// Callers keep each batch within [`crate::types::MAX_URIS_PER_ADD`].
    async fn add_tracks(&self, user_id: &str, playlist_id: &str, uris: &[String]) -> Result<()>;
}
