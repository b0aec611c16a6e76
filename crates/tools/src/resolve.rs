//! Track resolution: turn a `(track, artist)` pair into a catalogue URI.

use std::sync::Arc;

use pa_domain::error::Result;
use pa_domain::trace::TraceEvent;
use pa_spotify::{MusicService, TrackCandidate};
use serde::{Deserialize, Serialize};

use crate::fuzzy::partial_ratio_ci;

/// A song the model asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackQuery {
    pub track_name: String,
    pub artist_name: String,
}

impl TrackQuery {
    pub fn new(track_name: impl Into<String>, artist_name: impl Into<String>) -> Self {
        Self { track_name: track_name.into(), artist_name: artist_name.into() }
    }

    /// Field-filtered catalogue search string.
    pub fn search_query(&self) -> String {
        format!("track:{} artist:{}", self.track_name, self.artist_name)
    }

    /// The text scored against each candidate: `"<artist> <track>"`.
    pub fn match_text(&self) -> String {
        format!("{} {}", self.artist_name, self.track_name)
    }
}

/// The winning candidate for a query.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackMatch {
    pub name: String,
    pub artist: String,
    pub popularity: u32,
    pub uri: String,
    pub score: u8,
}

/// Pick the best candidate for `query`.
///
/// Highest fuzzy score wins; on equal score the strictly more popular
/// candidate wins; remaining ties keep the earliest candidate.
pub fn best_match(query: &TrackQuery, candidates: &[TrackCandidate]) -> Option<TrackMatch> {
    let text = query.match_text();
    let mut best: Option<(&TrackCandidate, u8)> = None;

    for candidate in candidates {
        let score = partial_ratio_ci(&text, &format!("{} {}", candidate.artist, candidate.name));
        let better = match best {
            None => true,
            Some((current, current_score)) => {
                score > current_score
                    || (score == current_score && candidate.popularity > current.popularity)
            }
        };
        if better {
            best = Some((candidate, score));
        }
    }

    best.map(|(c, score)| TrackMatch {
        name: c.name.clone(),
        artist: c.artist.clone(),
        popularity: c.popularity,
        uri: c.uri.clone(),
        score,
    })
}

/// Searches the music service and scores the results.
#[derive(Clone)]
pub struct TrackResolver {
    music: Arc<dyn MusicService>,
    search_limit: u32,
}

impl TrackResolver {
    pub fn new(music: Arc<dyn MusicService>, search_limit: u32) -> Self {
        Self { music, search_limit }
    }

    /// Resolve one query. `Ok(None)` means the search returned nothing;
    /// search failures are returned as errors without retrying.
    pub async fn resolve(&self, query: &TrackQuery) -> Result<Option<TrackMatch>> {
        let q = query.search_query();
        let candidates = self.music.search_tracks(&q, self.search_limit).await?;

        match best_match(query, &candidates) {
            Some(m) => {
                TraceEvent::TrackResolved {
                    query: q,
                    uri: m.uri.clone(),
                    score: m.score,
                    candidates: candidates.len(),
                }
                .emit();
                Ok(Some(m))
            }
            None => {
                TraceEvent::TrackUnresolved { query: q, candidates: 0 }.emit();
                Ok(None)
            }
        }
    }
}
