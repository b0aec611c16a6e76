use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Chat session
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are an AI chatbot designed to create and populate Spotify playlists for users.
Maintain a clear, conversational, brief tone.
If the user has a specific request, just do what they ask.
Whatever information they don't provide, exercise creative liberty and fill it in yourself.
For example, if they describe a playlist they want but don't give you a name, just name it yourself.
If they describe a playlist but don't tell you specific songs to add, add them yourself.
By default, add 20 songs at a time unless otherwise specified.
If the user does NOT have a specific request, have a conversation with the user about their taste.
Figure out what they like and don't like, both broadly and specifically.
When you feel like you have a good grasp on their taste, suggest a tailor-made playlist for them.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Fixed instruction that always opens the conversation.
    #[serde(default = "d_system_prompt")]
    pub system_prompt: String,
    /// Maximum number of action rounds the model may request while
    /// answering a single user message.
    #[serde(default = "d_5")]
    pub max_action_rounds: usize,
    /// When set, every appended turn is mirrored to `<dir>/<session>.jsonl`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_dir: Option<PathBuf>,
    /// Readline history file. Defaults to `~/.playlist-agent/history.txt`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_path: Option<PathBuf>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            system_prompt: d_system_prompt(),
            max_action_rounds: d_5(),
            transcript_dir: None,
            history_path: None,
        }
    }
}

fn d_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.into()
}
fn d_5() -> usize {
    5
}
