//! The conversation store: an ordered, append-only log of turns that always
//! opens with the system instruction.
//!
//! Turns are [`Message`]s. Assistant turns that request actions carry the
//! validated calls as tool-use parts; tool-result turns carry the action name
//! and the call id they answer.

use std::collections::HashSet;
use std::sync::Arc;

use pa_domain::error::{Error, Result};
use pa_domain::tool::{ContentPart, Message, MessageContent, Role};
use serde_json::Value;

use crate::transcript::{TranscriptLine, TranscriptWriter};

/// Mirrors appended turns into a JSONL transcript.
struct TranscriptMirror {
    writer: Arc<TranscriptWriter>,
    session_id: String,
}

pub struct ConversationStore {
    turns: Vec<Message>,
    transcript: Option<TranscriptMirror>,
}

impl ConversationStore {
    /// Create a store holding only the system instruction.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            turns: vec![Message::system(system_prompt)],
            transcript: None,
        }
    }

    /// Mirror every turn (including the system instruction) into
    /// `<transcript dir>/<session_id>.jsonl`.
    pub fn with_transcript(mut self, writer: Arc<TranscriptWriter>, session_id: impl Into<String>) -> Self {
        let mirror = TranscriptMirror { writer, session_id: session_id.into() };
        let lines: Vec<TranscriptLine> = self.turns.iter().map(transcript_line).collect();
        mirror_lines(&mirror, &lines);
        self.transcript = Some(mirror);
        self
    }

    /// Append a user or assistant text turn.
    ///
    /// Empty content is logged and ignored; returns whether a turn was added.
    /// System and tool-result turns have dedicated entry points and are
    /// rejected here.
    pub fn append(&mut self, role: Role, content: &str) -> bool {
        match role {
            Role::User | Role::Assistant => {}
            Role::System | Role::Tool => {
                tracing::warn!(role = role.as_str(), "append only accepts user or assistant turns");
                return false;
            }
        }
        if content.trim().is_empty() {
            tracing::warn!(role = role.as_str(), "ignoring empty message");
            return false;
        }
        let msg = match role {
            Role::User => Message::user(content),
            _ => Message::assistant(content),
        };
        self.push(msg);
        true
    }

    /// Record an assistant turn that requested one or more actions.
    ///
    /// `content` may be empty. Each call is `(call_id, action_name, arguments)`.
    pub fn append_action_request(&mut self, content: &str, calls: Vec<(String, String, Value)>) {
        if calls.is_empty() {
            self.append(Role::Assistant, content);
            return;
        }
        self.push(Message::assistant_tool_use(content, calls));
    }

    /// Record the result of an action. Error payloads are recorded like any
    /// other result.
    ///
    /// Fails only when no earlier assistant turn requested `call_id`.
    pub fn append_tool_result(
        &mut self,
        call_id: &str,
        action_name: &str,
        content: &str,
        is_error: bool,
    ) -> Result<()> {
        if !self.pending_call_ids().contains(call_id) {
            return Err(Error::Other(format!(
                "tool result for '{action_name}' ({call_id}) has no matching action request"
            )));
        }
        self.push(Message::tool_result(call_id, action_name, content, is_error));
        Ok(())
    }

    /// The conversation in wire order, starting with exactly one system turn.
    pub fn project(&self) -> Vec<Message> {
        self.turns.clone()
    }

    pub fn turns(&self) -> &[Message] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Message> {
        self.turns.last()
    }

    /// Number of turns, counting the system instruction.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Always false: the system instruction is never removed.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Drop everything but the system instruction.
    pub fn clear(&mut self) {
        self.turns.truncate(1);
        if let Some(ref mirror) = self.transcript {
            let mut line = TranscriptWriter::line("system", "conversation reset");
            line.metadata = Some(serde_json::json!({ "reset": true }));
            mirror_lines(mirror, &[line]);
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.transcript.as_ref().map(|m| m.session_id.as_str())
    }

    // ── Private helpers ───────────────────────────────────────────────

    fn push(&mut self, msg: Message) {
        if let Some(ref mirror) = self.transcript {
            mirror_lines(mirror, &[transcript_line(&msg)]);
        }
        self.turns.push(msg);
    }

    /// Call ids requested by the most recent action-requesting assistant turn.
    fn pending_call_ids(&self) -> HashSet<&str> {
        self.turns
            .iter()
            .rev()
            .filter(|m| m.role == Role::Assistant)
            .find_map(|m| match &m.content {
                MessageContent::Parts(parts) => {
                    let ids: HashSet<&str> = parts
                        .iter()
                        .filter_map(|p| match p {
                            ContentPart::ToolUse { id, .. } => Some(id.as_str()),
                            _ => None,
                        })
                        .collect();
                    (!ids.is_empty()).then_some(ids)
                }
                MessageContent::Text(_) => None,
            })
            .unwrap_or_default()
    }
}

fn transcript_line(msg: &Message) -> TranscriptLine {
    let mut line = TranscriptWriter::line(msg.role.as_str(), &msg.content.extract_all_text());
    if let MessageContent::Parts(parts) = &msg.content {
        let meta: Vec<Value> = parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::ToolUse { id, name, input } => Some(serde_json::json!({
                    "call_id": id, "action": name, "arguments": input,
                })),
                ContentPart::ToolResult { tool_use_id, name, is_error, .. } => Some(serde_json::json!({
                    "call_id": tool_use_id, "action": name, "is_error": is_error,
                })),
                ContentPart::Text { .. } => None,
            })
            .collect();
        if !meta.is_empty() {
            line.metadata = Some(Value::Array(meta));
        }
    }
    line
}

fn mirror_lines(mirror: &TranscriptMirror, lines: &[TranscriptLine]) {
    if let Err(e) = mirror.writer.append(&mirror.session_id, lines) {
        tracing::warn!(session_id = %mirror.session_id, error = %e, "transcript write failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> ConversationStore {
        ConversationStore::new("You build playlists.")
    }

    #[test]
    fn starts_with_single_system_turn() {
        let s = store();
        let projected = s.project();
        assert_eq!(projected.len(), 1);
        assert_eq!(projected[0].role, Role::System);
        assert_eq!(projected[0].content.text(), Some("You build playlists."));
    }

    #[test]
    fn empty_content_never_grows_the_store() {
        let mut s = store();
        assert!(!s.append(Role::User, ""));
        assert!(!s.append(Role::Assistant, "   \n"));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn append_rejects_system_and_tool_roles() {
        let mut s = store();
        assert!(!s.append(Role::System, "second system prompt"));
        assert!(!s.append(Role::Tool, "{}"));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn projection_is_repeatable() {
        let mut s = store();
        s.append(Role::User, "hi");
        s.append(Role::Assistant, "hello");
        assert_eq!(s.project(), s.project());
        assert_eq!(s.project().iter().filter(|m| m.role == Role::System).count(), 1);
    }

    #[test]
    fn tool_result_requires_matching_request() {
        let mut s = store();
        s.append(Role::User, "make a playlist");
        assert!(s.append_tool_result("c1", "create_playlist", "{}", false).is_err());

        s.append_action_request("", vec![("c1".into(), "create_playlist".into(), json!({"playlist_name": "Chill"}))]);
        s.append_tool_result("c1", "create_playlist", r#"{"error":"boom"}"#, true).unwrap();

        assert_eq!(s.len(), 4);
        assert_eq!(s.last().unwrap().action_name(), Some("create_playlist"));
        assert!(s.append_tool_result("c9", "create_playlist", "{}", false).is_err());
    }

    #[test]
    fn action_request_without_calls_is_plain_text() {
        let mut s = store();
        s.append_action_request("just text", Vec::new());
        assert_eq!(s.last().unwrap().content.text(), Some("just text"));
        s.append_action_request("", Vec::new());
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn clear_keeps_only_system_turn() {
        let mut s = store();
        s.append(Role::User, "hi");
        s.append(Role::Assistant, "hello");
        s.clear();
        assert_eq!(s.len(), 1);
        assert_eq!(s.turns()[0].role, Role::System);
    }

    #[test]
    fn transcript_mirrors_every_turn() {
        let dir = tempfile::tempdir().unwrap();
        let writer = Arc::new(TranscriptWriter::new(dir.path()));
        let mut s = store().with_transcript(writer.clone(), "sess");
        s.append(Role::User, "hi");
        s.append(Role::User, "");
        s.append_action_request("", vec![("c1".into(), "create_playlist".into(), json!({}))]);
        s.append_tool_result("c1", "create_playlist", r#"{"playlist_id":"p1"}"#, false).unwrap();

        let lines = writer.read("sess").unwrap();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].role, "system");
        assert_eq!(lines[3].role, "tool");
        assert_eq!(lines[3].metadata.as_ref().unwrap()[0]["action"], "create_playlist");
        assert_eq!(s.session_id(), Some("sess"));
    }
}
