//! Runtime construction shared by the `chat` and `run` subcommands.
//!
//! [`build_runtime`] resolves credentials, authenticates against Spotify and
//! wires the dispatch loop. [`build_dispatch_loop`] does the wiring alone so
//! tests can hand in scripted clients.

use std::sync::Arc;

use anyhow::Context;

use pa_domain::config::{Config, ConfigSeverity};
use pa_providers::{LlmProvider, OpenAiCompatProvider};
use pa_sessions::{ConversationStore, TranscriptWriter};
use pa_spotify::{MusicService, RestSpotifyClient, SpotifyCredentials, SpotifyUser, TokenStore};
use pa_tools::PlaylistOps;

use crate::runtime::{ActionRegistry, DispatchLoop, LoopSettings};

/// Wire a dispatch loop from already-constructed clients.
pub fn build_dispatch_loop(
    config: &Config,
    provider: Arc<dyn LlmProvider>,
    music: Arc<dyn MusicService>,
    user_id: &str,
) -> DispatchLoop {
    let ops = PlaylistOps::new(music, user_id, config.spotify.search_limit);
    let registry = ActionRegistry::new(ops);

    let mut store = ConversationStore::new(config.chat.system_prompt.clone());
    if let Some(ref dir) = config.chat.transcript_dir {
        let session_id = pa_sessions::new_session_id();
        tracing::info!(dir = %dir.display(), session_id = %session_id, "transcript enabled");
        store = store.with_transcript(Arc::new(TranscriptWriter::new(dir)), session_id);
    }

    let settings = LoopSettings {
        model: Some(config.llm.model.clone()),
        temperature: config.llm.temperature,
        max_tokens: config.llm.max_tokens,
        max_action_rounds: config.chat.max_action_rounds,
    };

    DispatchLoop::new(provider, registry, store, settings)
}

/// Validate config, build both clients, authenticate, and return the loop
/// together with the authenticated user.
pub async fn build_runtime(config: &Config) -> anyhow::Result<(DispatchLoop, SpotifyUser)> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if config.has_errors() {
        anyhow::bail!(
            "config validation failed with {} error(s)",
            issues
                .iter()
                .filter(|i| i.severity == ConfigSeverity::Error)
                .count()
        );
    }

    // ── LLM provider ─────────────────────────────────────────────────
    let provider: Arc<dyn LlmProvider> = Arc::new(
        OpenAiCompatProvider::from_config(&config.llm).context("initializing LLM provider")?,
    );
    tracing::info!(
        provider = provider.provider_id(),
        model = %config.llm.model,
        "LLM provider ready"
    );

    // ── Spotify ──────────────────────────────────────────────────────
    let credentials = SpotifyCredentials::from_env(&config.spotify)?;
    let store = TokenStore::from_config(&config.spotify)?;
    let client = RestSpotifyClient::new(&config.spotify, credentials, store)
        .context("initializing Spotify client")?;
    let music: Arc<dyn MusicService> = Arc::new(client);

    let user = music
        .current_user()
        .await
        .context("authenticating with Spotify")?;
    tracing::info!(user_id = %user.id, "Spotify user authenticated");

    let dispatch = build_dispatch_loop(config, provider, music, &user.id);
    Ok((dispatch, user))
}
