//! Data Transfer Objects for the subset of the Spotify Web API we call.
//!
//! Only the fields the agent reads are modelled; everything else in the
//! responses is ignored by serde.

use serde::{Deserialize, Serialize};

/// Maximum number of item URIs accepted by a single add-items request.
pub const MAX_URIS_PER_ADD: usize = 100;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Domain-facing types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// GET /me: the authenticated user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotifyUser {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl SpotifyUser {
    /// Display name, falling back to the user id when none is set.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.id)
    }
}

/// A search hit reduced to what track resolution needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackCandidate {
    pub name: String,
    /// Name of the first credited artist.
    pub artist: String,
    /// Spotify popularity, 0-100.
    pub popularity: u32,
    pub uri: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Wire types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// POST /users/{user_id}/playlists: request body.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePlaylistBody<'a> {
    pub name: &'a str,
    pub public: bool,
}

/// POST /users/{user_id}/playlists: response body.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistObject {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// POST /playlists/{playlist_id}/tracks: request body.
#[derive(Debug, Clone, Serialize)]
pub struct AddTracksBody<'a> {
    pub uris: &'a [String],
}

/// POST /playlists/{playlist_id}/tracks: response body.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotResponse {
    pub snapshot_id: String,
}

/// GET /search?type=track: response body.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub tracks: Option<Paging<TrackObject>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Paging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackObject {
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub popularity: u32,
    #[serde(default)]
    pub artists: Vec<ArtistObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistObject {
    pub name: String,
}

impl From<TrackObject> for TrackCandidate {
    fn from(t: TrackObject) -> Self {
        let artist = t
            .artists
            .into_iter()
            .next()
            .map(|a| a.name)
            .unwrap_or_default();
        Self {
            name: t.name,
            artist,
            popularity: t.popularity,
            uri: t.uri,
        }
    }
}

impl SearchResponse {
    /// Flatten the track page into candidates, preserving result order.
    pub fn into_candidates(self) -> Vec<TrackCandidate> {
        self.tracks
            .map(|p| p.items.into_iter().map(TrackCandidate::from).collect())
            .unwrap_or_default()
    }
}
