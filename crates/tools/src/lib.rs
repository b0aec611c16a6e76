//! Playlist tools for the agent.
//!
//! - `fuzzy`: 0-100 string similarity used to rank search results
//! - `resolve`: `(track, artist)` to catalogue URI via search + scoring
//! - `playlist`: the create-playlist and add-tracks operations

pub mod fuzzy;
pub mod playlist;
pub mod resolve;

pub use playlist::{AddTracksOutcome, AddTracksRequest, CreatePlaylistRequest, PlaylistHandle, PlaylistOps};
pub use resolve::{best_match, TrackMatch, TrackQuery, TrackResolver};
