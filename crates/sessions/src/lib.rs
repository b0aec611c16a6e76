//! Conversation state for the playlist agent.
//!
//! [`ConversationStore`] holds the ordered turns of one chat and projects
//! them into the shape the completion API expects. [`TranscriptWriter`]
//! optionally mirrors every appended turn into an append-only JSONL file.

pub mod conversation;
pub mod transcript;

pub use conversation::ConversationStore;
pub use transcript::{TranscriptLine, TranscriptWriter};

/// Generate a fresh session id for a new chat.
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
