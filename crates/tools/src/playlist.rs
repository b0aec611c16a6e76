//! Playlist operations exposed to the model: create a playlist, and resolve
//! and add a batch of songs.
//!
//! Request types are deserialized straight from the model's arguments, so
//! serde enforces required fields and types before anything runs.

use std::sync::Arc;

use pa_domain::error::{Error, Result};
use pa_domain::trace::TraceEvent;
use pa_spotify::{MusicService, MAX_URIS_PER_ADD};
use serde::{Deserialize, Serialize};

use crate::resolve::{TrackQuery, TrackResolver};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePlaylistRequest {
    pub playlist_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddTracksRequest {
    /// Target playlist; the last playlist created in this exchange when absent.
    #[serde(default)]
    pub playlist_id: Option<String>,
    pub songs: Vec<TrackQuery>,
}

impl CreatePlaylistRequest {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.playlist_name.trim().is_empty() {
            return Err("playlist_name must not be empty".into());
        }
        Ok(())
    }
}

impl AddTracksRequest {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.playlist_id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            return Err("playlist_id must not be empty when given".into());
        }
        Ok(())
    }

    /// The explicit target, if the model supplied one.
    pub fn target(&self) -> Option<&str> {
        self.playlist_id.as_deref()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Results
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A playlist created during the current exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistHandle {
    pub id: String,
    pub name: String,
}

/// Outcome of an add-tracks call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddTracksOutcome {
    pub playlist_id: String,
    pub added_uris: Vec<String>,
    /// Songs with no search results; they were skipped.
    pub unresolved: Vec<TrackQuery>,
    /// Set when an add request failed part-way; `added_uris` then lists
    /// only the batches the service accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AddTracksOutcome {
    pub fn is_partial(&self) -> bool {
        self.error.is_some()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Operations
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Playlist operations bound to one authenticated user.
#[derive(Clone)]
pub struct PlaylistOps {
    music: Arc<dyn MusicService>,
    resolver: TrackResolver,
    user_id: String,
}

impl PlaylistOps {
    pub fn new(music: Arc<dyn MusicService>, user_id: impl Into<String>, search_limit: u32) -> Self {
        let resolver = TrackResolver::new(music.clone(), search_limit);
        Self { music, resolver, user_id: user_id.into() }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Create a playlist. Every call creates a new one.
    pub async fn create_playlist(&self, req: &CreatePlaylistRequest) -> Result<PlaylistHandle> {
        let name = req.playlist_name.trim();
        let id = self.music.create_playlist(&self.user_id, name).await?;
        tracing::info!(playlist_id = %id, name = %name, "created playlist");
        TraceEvent::PlaylistCreated { playlist_id: id.clone(), name: name.to_owned() }.emit();
        Ok(PlaylistHandle { id, name: name.to_owned() })
    }

    /// Resolve every song independently and add the hits to `playlist_id`.
    ///
    /// Songs without search results are skipped and reported in
    /// `unresolved`. When nothing resolves no add request is sent. A failed
    /// search aborts before anything is written. A failed add stops at that
    /// batch; the outcome keeps the batches already written and carries the
    /// failure in `error`.
    pub async fn add_tracks(&self, playlist_id: &str, songs: &[TrackQuery]) -> Result<AddTracksOutcome> {
        let mut resolved = Vec::with_capacity(songs.len());
        let mut unresolved = Vec::new();

        for song in songs {
            match self.resolver.resolve(song).await? {
                Some(m) => {
                    tracing::debug!(
                        track = %song.track_name,
                        artist = %song.artist_name,
                        uri = %m.uri,
                        score = m.score,
                        "resolved track"
                    );
                    resolved.push(m.uri);
                }
                None => {
                    tracing::warn!(
                        track = %song.track_name,
                        artist = %song.artist_name,
                        "no search results; skipping track"
                    );
                    unresolved.push(song.clone());
                }
            }
        }

        let mut added_uris = Vec::with_capacity(resolved.len());
        let mut error = None;
        for chunk in resolved.chunks(MAX_URIS_PER_ADD) {
            match self.music.add_tracks(&self.user_id, playlist_id, chunk).await {
                Ok(()) => added_uris.extend_from_slice(chunk),
                Err(e) => {
                    let message = match e {
                        Error::Spotify(msg) => format!("adding tracks to {playlist_id}: {msg}"),
                        other => other.to_string(),
                    };
                    tracing::warn!(
                        playlist_id = %playlist_id,
                        added = added_uris.len(),
                        pending = resolved.len() - added_uris.len(),
                        error = %message,
                        "add request failed"
                    );
                    error = Some(message);
                    break;
                }
            }
        }

        tracing::info!(
            playlist_id = %playlist_id,
            requested = songs.len(),
            added = added_uris.len(),
            unresolved = unresolved.len(),
            "added tracks"
        );

        Ok(AddTracksOutcome {
            playlist_id: playlist_id.to_owned(),
            added_uris,
            unresolved,
            error,
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pa_spotify::{SpotifyUser, TrackCandidate};
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Catalogue keyed by search query; records every mutating call.
    #[derive(Default)]
    struct FakeCatalogue {
        results: HashMap<String, Vec<TrackCandidate>>,
        fail_search: bool,
        /// Zero-based index of the add request that fails.
        fail_add_at: Option<usize>,
        created: Mutex<Vec<(String, String)>>,
        added: Mutex<Vec<(String, Vec<String>)>>,
    }

    #[async_trait]
    impl MusicService for FakeCatalogue {
        async fn current_user(&self) -> Result<SpotifyUser> {
            Ok(SpotifyUser { id: "u1".into(), display_name: None })
        }
        async fn create_playlist(&self, user_id: &str, name: &str) -> Result<String> {
            let mut created = self.created.lock();
            created.push((user_id.into(), name.into()));
            Ok(format!("p{}", created.len()))
        }
        async fn search_tracks(&self, query: &str, _limit: u32) -> Result<Vec<TrackCandidate>> {
            if self.fail_search {
                return Err(Error::Http("connection reset".into()));
            }
            Ok(self.results.get(query).cloned().unwrap_or_default())
        }
        async fn add_tracks(&self, _user_id: &str, playlist_id: &str, uris: &[String]) -> Result<()> {
            let mut added = self.added.lock();
            if self.fail_add_at == Some(added.len()) {
                return Err(Error::Spotify("429 rate limited".into()));
            }
            added.push((playlist_id.into(), uris.to_vec()));
            Ok(())
        }
    }

    fn hit(name: &str, artist: &str, uri: &str) -> Vec<TrackCandidate> {
        vec![TrackCandidate { name: name.into(), artist: artist.into(), popularity: 50, uri: uri.into() }]
    }

    #[test]
    fn create_request_rejects_unknown_and_missing_fields() {
        assert!(serde_json::from_value::<CreatePlaylistRequest>(serde_json::json!({})).is_err());
        assert!(serde_json::from_value::<CreatePlaylistRequest>(
            serde_json::json!({"playlist_name": "x", "public": true})
        )
        .is_err());
        let req: CreatePlaylistRequest =
            serde_json::from_value(serde_json::json!({"playlist_name": "  "})).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn add_request_playlist_id_is_optional() {
        let req: AddTracksRequest = serde_json::from_value(serde_json::json!({
            "songs": [{"track_name": "Teardrop", "artist_name": "Massive Attack"}]
        }))
        .unwrap();
        assert!(req.target().is_none());
        assert!(req.validate().is_ok());
        assert!(serde_json::from_value::<AddTracksRequest>(serde_json::json!({"songs": "x"})).is_err());
        assert!(serde_json::from_value::<AddTracksRequest>(
            serde_json::json!({"songs": [], "position": 0})
        )
        .is_err());
    }

    #[tokio::test]
    async fn create_playlist_returns_handle() {
        let music = Arc::new(FakeCatalogue::default());
        let ops = PlaylistOps::new(music.clone(), "u1", 10);
        let handle = ops
            .create_playlist(&CreatePlaylistRequest { playlist_name: " Chill ".into() })
            .await
            .unwrap();
        assert_eq!(handle, PlaylistHandle { id: "p1".into(), name: "Chill".into() });
        assert_eq!(music.created.lock()[0], ("u1".to_string(), "Chill".to_string()));
    }

    #[tokio::test]
    async fn misses_are_skipped_not_fatal() {
        let mut music = FakeCatalogue::default();
        music.results.insert(
            "track:Teardrop artist:Massive Attack".into(),
            hit("Teardrop", "Massive Attack", "spotify:track:t"),
        );
        let music = Arc::new(music);
        let ops = PlaylistOps::new(music.clone(), "u1", 10);

        let songs = vec![
            TrackQuery::new("Teardrop", "Massive Attack"),
            TrackQuery::new("Nonexistent Song", "Nobody"),
        ];
        let outcome = ops.add_tracks("p1", &songs).await.unwrap();
        assert_eq!(outcome.added_uris, vec!["spotify:track:t".to_string()]);
        assert_eq!(outcome.unresolved, vec![TrackQuery::new("Nonexistent Song", "Nobody")]);
        assert_eq!(music.added.lock().len(), 1);
    }

    #[tokio::test]
    async fn nothing_resolved_sends_no_add_request() {
        let music = Arc::new(FakeCatalogue::default());
        let ops = PlaylistOps::new(music.clone(), "u1", 10);
        let outcome = ops
            .add_tracks("p1", &[TrackQuery::new("A", "B")])
            .await
            .unwrap();
        assert!(outcome.added_uris.is_empty());
        assert!(music.added.lock().is_empty());
    }

    #[tokio::test]
    async fn adds_are_chunked_at_service_limit() {
        let mut music = FakeCatalogue::default();
        let mut songs = Vec::new();
        for i in 0..230 {
            let q = TrackQuery::new(format!("Song {i}"), "Band");
            music.results.insert(q.search_query(), hit(&format!("Song {i}"), "Band", &format!("spotify:track:{i}")));
            songs.push(q);
        }
        let music = Arc::new(music);
        let ops = PlaylistOps::new(music.clone(), "u1", 10);
        let outcome = ops.add_tracks("p1", &songs).await.unwrap();
        assert_eq!(outcome.added_uris.len(), 230);

        let added = music.added.lock();
        let sizes: Vec<usize> = added.iter().map(|(_, uris)| uris.len()).collect();
        assert_eq!(sizes, vec![100, 100, 30]);
        assert_eq!(added[2].1[29], "spotify:track:229");
    }

    #[tokio::test]
    async fn failed_batch_keeps_earlier_batches_in_outcome() {
        let mut music = FakeCatalogue { fail_add_at: Some(1), ..Default::default() };
        let mut songs = Vec::new();
        for i in 0..150 {
            let q = TrackQuery::new(format!("Song {i}"), "Band");
            music.results.insert(q.search_query(), hit(&format!("Song {i}"), "Band", &format!("spotify:track:{i}")));
            songs.push(q);
        }
        let music = Arc::new(music);
        let ops = PlaylistOps::new(music.clone(), "u1", 10);

        let outcome = ops.add_tracks("p1", &songs).await.unwrap();
        assert!(outcome.is_partial());
        assert_eq!(outcome.added_uris.len(), 100);
        assert_eq!(outcome.added_uris[99], "spotify:track:99");
        assert!(outcome.error.as_deref().unwrap().contains("429 rate limited"));
        assert_eq!(music.added.lock().len(), 1);

        let payload = serde_json::to_value(&outcome).unwrap();
        assert_eq!(payload["added_uris"].as_array().unwrap().len(), 100);
        assert!(payload["error"].is_string());
    }

    #[tokio::test]
    async fn search_failure_propagates() {
        let music = Arc::new(FakeCatalogue { fail_search: true, ..Default::default() });
        let ops = PlaylistOps::new(music, "u1", 10);
        let err = ops.add_tracks("p1", &[TrackQuery::new("A", "B")]).await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }
}
