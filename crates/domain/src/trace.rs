use serde::Serialize;

/// Structured trace events emitted across all PlaylistAgent crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    LlmRequest {
        provider: String,
        model: String,
        duration_ms: u64,
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
        tool_calls: usize,
    },
    SpotifyCall {
        endpoint: String,
        status: u16,
        duration_ms: u64,
    },
    ActionInvoked {
        action: String,
        is_error: bool,
        duration_ms: u64,
    },
    PlaylistCreated {
        playlist_id: String,
        name: String,
    },
    TrackResolved {
        query: String,
        uri: String,
        score: u8,
        candidates: usize,
    },
    TrackUnresolved {
        query: String,
        candidates: usize,
    },
    TranscriptAppend {
        session_id: String,
        lines: usize,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "pa_event");
    }
}
