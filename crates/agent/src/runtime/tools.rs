//! Action registry for the runtime: builds the tool definitions exposed to
//! the LLM, validates requested calls, and dispatches them to the playlist
//! operations.
//!
//! Dispatch never fails. Every outcome, including unknown action names and
//! failed music-service calls, comes back as a JSON payload the model can
//! read; failures are `{"error": "..."}`.

use std::time::Instant;

use serde::Deserialize;
use serde_json::Value;

use pa_domain::error::{Error, Result};
use pa_domain::tool::{ToolCall, ToolDefinition};
use pa_domain::trace::TraceEvent;
use pa_tools::{AddTracksRequest, CreatePlaylistRequest, PlaylistHandle, PlaylistOps};

pub const CREATE_PLAYLIST: &str = "create_playlist";
pub const ADD_TRACKS_TO_PLAYLIST: &str = "add_tracks_to_playlist";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tool definitions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Build the set of tool definitions exposed to the LLM.
pub fn build_tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: CREATE_PLAYLIST.into(),
            description: "Create a new, empty Spotify playlist for the user. Returns its playlist_id.".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "playlist_name": {
                        "type": "string",
                        "description": "Name of the playlist to create"
                    }
                },
                "required": ["playlist_name"],
                "additionalProperties": false
            }),
        },
        ToolDefinition {
            name: ADD_TRACKS_TO_PLAYLIST.into(),
            description: "Search for songs and add the best matches to a playlist. \
                          Omit playlist_id to use the playlist created earlier in this exchange."
                .into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "playlist_id": {
                        "type": "string",
                        "description": "Target playlist id (optional)"
                    },
                    "songs": {
                        "type": "array",
                        "description": "Songs to add",
                        "items": {
                            "type": "object",
                            "properties": {
                                "track_name": { "type": "string", "description": "Song title" },
                                "artist_name": { "type": "string", "description": "Performing artist" }
                            },
                            "required": ["track_name", "artist_name"]
                        }
                    }
                },
                "required": ["songs"],
                "additionalProperties": false
            }),
        },
    ]
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Validated requests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A requested action after its arguments passed validation.
#[derive(Debug, Clone)]
pub enum ActionRequest {
    CreatePlaylist(CreatePlaylistRequest),
    AddTracks(AddTracksRequest),
    /// A name the registry does not know. Answered with an error payload.
    Unknown(String),
}

/// One tool call, parsed and validated, ready to dispatch.
#[derive(Debug, Clone)]
pub struct ParsedCall {
    pub call_id: String,
    pub name: String,
    /// The parsed argument object, as recorded in the conversation.
    pub arguments: Value,
    pub action: ActionRequest,
}

fn typed<T: for<'de> Deserialize<'de>>(name: &str, arguments: &Value) -> Result<T> {
    T::deserialize(arguments).map_err(|e| Error::MalformedArguments {
        action: name.to_owned(),
        message: format!("invalid {name} arguments: {e}"),
    })
}

fn checked(name: &str, outcome: std::result::Result<(), String>) -> Result<()> {
    outcome.map_err(|message| Error::MalformedArguments { action: name.to_owned(), message })
}

/// Parse a raw tool call into a [`ParsedCall`].
///
/// Invalid JSON or arguments that do not match the action's request type
/// yield [`Error::MalformedArguments`]. Unknown names are not an error here.
pub fn parse_call(tc: &ToolCall) -> Result<ParsedCall> {
    let arguments = tc.parse_arguments()?;
    let name = tc.tool_name.as_str();

    let action = match name {
        CREATE_PLAYLIST => {
            let req: CreatePlaylistRequest = typed(name, &arguments)?;
            checked(name, req.validate())?;
            ActionRequest::CreatePlaylist(req)
        }
        ADD_TRACKS_TO_PLAYLIST => {
            let req: AddTracksRequest = typed(name, &arguments)?;
            checked(name, req.validate())?;
            ActionRequest::AddTracks(req)
        }
        other => ActionRequest::Unknown(other.to_owned()),
    };

    Ok(ParsedCall {
        call_id: tc.call_id.clone(),
        name: tc.tool_name.clone(),
        arguments,
        action,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Dispatch
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// State scoped to one user message and the action rounds it triggers.
#[derive(Debug, Clone, Default)]
pub struct ExchangeContext {
    /// The last playlist created in this exchange.
    pub last_playlist: Option<PlaylistHandle>,
}

/// Maps action names onto the playlist operations.
#[derive(Clone)]
pub struct ActionRegistry {
    ops: PlaylistOps,
    definitions: Vec<ToolDefinition>,
}

impl ActionRegistry {
    pub fn new(ops: PlaylistOps) -> Self {
        Self { ops, definitions: build_tool_definitions() }
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Run one action. Returns `(content, is_error)`.
    pub async fn dispatch(&self, call: &ParsedCall, ctx: &mut ExchangeContext) -> (String, bool) {
        let start = Instant::now();
        let (content, is_error) = match &call.action {
            ActionRequest::CreatePlaylist(req) => self.dispatch_create(req, ctx).await,
            ActionRequest::AddTracks(req) => self.dispatch_add_tracks(req, ctx).await,
            ActionRequest::Unknown(name) => {
                tracing::warn!(action = %name, "model requested an unknown action");
                error_payload(format!("unknown action '{name}'"))
            }
        };

        TraceEvent::ActionInvoked {
            action: call.name.clone(),
            is_error,
            duration_ms: start.elapsed().as_millis() as u64,
        }
        .emit();

        (content, is_error)
    }

    async fn dispatch_create(&self, req: &CreatePlaylistRequest, ctx: &mut ExchangeContext) -> (String, bool) {
        match self.ops.create_playlist(req).await {
            Ok(handle) => {
                let payload = serde_json::json!({ "playlist_id": handle.id });
                ctx.last_playlist = Some(handle);
                (payload.to_string(), false)
            }
            Err(e) => {
                tracing::warn!(error = %e, "create_playlist failed");
                error_payload(e.to_string())
            }
        }
    }

    async fn dispatch_add_tracks(&self, req: &AddTracksRequest, ctx: &ExchangeContext) -> (String, bool) {
        let playlist_id = match req.target().or(ctx.last_playlist.as_ref().map(|h| h.id.as_str())) {
            Some(id) => id.to_owned(),
            None => {
                return error_payload(
                    "no target playlist: pass playlist_id or create a playlist first".to_owned(),
                )
            }
        };

        match self.ops.add_tracks(&playlist_id, &req.songs).await {
            Ok(outcome) => match serde_json::to_string(&outcome) {
                // A partial add still reports the tracks that were written.
                Ok(s) => (s, outcome.is_partial()),
                Err(e) => error_payload(format!("serializing result: {e}")),
            },
            Err(e) => {
                tracing::warn!(playlist_id = %playlist_id, error = %e, "add_tracks_to_playlist failed");
                error_payload(e.to_string())
            }
        }
    }
}

fn error_payload(message: String) -> (String, bool) {
    (serde_json::json!({ "error": message }).to_string(), true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &str) -> ToolCall {
        ToolCall { call_id: "c1".into(), tool_name: name.into(), arguments: args.into() }
    }

    #[test]
    fn definitions_cover_both_actions() {
        let defs = build_tool_definitions();
        let names: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec![CREATE_PLAYLIST, ADD_TRACKS_TO_PLAYLIST]);
        assert_eq!(defs[0].parameters["required"][0], "playlist_name");
        assert_eq!(defs[1].parameters["required"][0], "songs");
        for def in &defs {
            assert_eq!(def.parameters["additionalProperties"], false, "{}", def.name);
        }
    }

    #[test]
    fn parse_valid_create() {
        let parsed = parse_call(&call(CREATE_PLAYLIST, r#"{"playlist_name":"Chill"}"#)).unwrap();
        assert!(matches!(parsed.action, ActionRequest::CreatePlaylist(ref r) if r.playlist_name == "Chill"));
        assert_eq!(parsed.arguments["playlist_name"], "Chill");
    }

    #[test]
    fn parse_rejects_bad_json() {
        let err = parse_call(&call(CREATE_PLAYLIST, r#"{"playlist_name":"#)).unwrap_err();
        assert!(matches!(err, Error::MalformedArguments { .. }));
    }

    #[test]
    fn parse_rejects_schema_mismatch() {
        let err = parse_call(&call(ADD_TRACKS_TO_PLAYLIST, r#"{"songs":[{"track_name":"x"}]}"#)).unwrap_err();
        assert!(err.to_string().contains("artist_name"));

        let err = parse_call(&call(CREATE_PLAYLIST, r#"{"playlist_name":42}"#)).unwrap_err();
        assert!(matches!(err, Error::MalformedArguments { ref action, .. } if action == CREATE_PLAYLIST));

        let err = parse_call(&call(CREATE_PLAYLIST, r#"{"playlist_name":""}"#)).unwrap_err();
        assert!(err.to_string().contains("must not be empty"));

        let err = parse_call(&call(ADD_TRACKS_TO_PLAYLIST, r#"{"songs":[],"shuffle":true}"#)).unwrap_err();
        assert!(err.to_string().contains("shuffle"));
    }

    #[test]
    fn unknown_action_parses_as_unknown() {
        let parsed = parse_call(&call("delete_everything", "{}")).unwrap();
        assert!(matches!(parsed.action, ActionRequest::Unknown(ref n) if n == "delete_everything"));
    }

    #[test]
    fn error_payload_shape() {
        let (content, is_error) = error_payload("boom".into());
        assert!(is_error);
        let v: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(v["error"], "boom");
    }
}
