//! The dispatch loop: one user message in, one assistant reply out, with
//! as many action rounds in between as the model asks for (bounded).

use std::sync::Arc;

use pa_domain::config::TEMPERATURE_RANGE;
use pa_domain::error::{Error, Result};
use pa_domain::tool::Role;
use pa_providers::{ChatRequest, LlmProvider, ToolChoice};
use pa_sessions::ConversationStore;

use super::tools::{self, ActionRegistry, ExchangeContext, ParsedCall};

/// Knobs the loop reads on every request.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    /// Model override; `None` uses the provider default.
    pub model: Option<String>,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    pub max_action_rounds: usize,
}

pub struct DispatchLoop {
    provider: Arc<dyn LlmProvider>,
    registry: ActionRegistry,
    store: ConversationStore,
    settings: LoopSettings,
}

impl DispatchLoop {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        registry: ActionRegistry,
        store: ConversationStore,
        settings: LoopSettings,
    ) -> Self {
        Self { provider, registry, store, settings }
    }

    /// Run one user turn to completion and return the final assistant text.
    ///
    /// Every appended turn stays in the conversation even when the turn
    /// fails, so the next user message continues from a consistent log.
    /// A response whose calls do not all parse is discarded whole.
    pub async fn handle_user_turn(&mut self, text: &str) -> Result<String> {
        let mut ctx = ExchangeContext::default();
        if !self.store.append(Role::User, text) {
            return Err(Error::Other("message is empty".into()));
        }

        let mut rounds = 0usize;
        loop {
            let req = self.build_request();
            let resp = self.provider.chat(&req).await?;

            if resp.tool_calls.is_empty() {
                if !self.store.append(Role::Assistant, &resp.content) {
                    tracing::warn!(finish_reason = ?resp.finish_reason, "model returned an empty reply");
                }
                return Ok(resp.content);
            }

            if rounds >= self.settings.max_action_rounds {
                tracing::warn!(
                    rounds,
                    requested = resp.tool_calls.len(),
                    "model kept requesting actions past the round limit"
                );
                return Err(Error::ActionRoundLimit(self.settings.max_action_rounds));
            }
            rounds += 1;

            let calls = resp
                .tool_calls
                .iter()
                .map(tools::parse_call)
                .collect::<Result<Vec<ParsedCall>>>()?;

            tracing::debug!(
                round = rounds,
                actions = ?calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
                "model requested actions"
            );

            self.store.append_action_request(
                &resp.content,
                calls
                    .iter()
                    .map(|c| (c.call_id.clone(), c.name.clone(), c.arguments.clone()))
                    .collect(),
            );

            for call in &calls {
                let (content, is_error) = self.registry.dispatch(call, &mut ctx).await;
                self.store.append_tool_result(&call.call_id, &call.name, &content, is_error)?;
            }
        }
    }

    fn build_request(&self) -> ChatRequest {
        ChatRequest {
            messages: self.store.project(),
            tools: self.registry.definitions().to_vec(),
            tool_choice: ToolChoice::Auto,
            temperature: Some(self.settings.temperature as f32),
            max_tokens: self.settings.max_tokens,
            model: self.settings.model.clone(),
        }
    }

    pub fn conversation(&self) -> &ConversationStore {
        &self.store
    }

    /// Forget everything but the system instruction.
    pub fn reset(&mut self) {
        self.store.clear();
    }

    pub fn temperature(&self) -> f64 {
        self.settings.temperature
    }

    /// Change the sampling temperature for subsequent turns.
    pub fn set_temperature(&mut self, temperature: f64) -> Result<()> {
        if !TEMPERATURE_RANGE.contains(&temperature) {
            return Err(Error::Config(format!(
                "temperature must be between {} and {}",
                TEMPERATURE_RANGE.start(),
                TEMPERATURE_RANGE.end()
            )));
        }
        self.settings.temperature = temperature;
        Ok(())
    }

    pub fn provider_id(&self) -> &str {
        self.provider.provider_id()
    }

    pub fn model(&self) -> &str {
        self.settings.model.as_deref().unwrap_or_else(|| self.provider.default_model())
    }
}
