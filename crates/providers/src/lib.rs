//! LLM provider abstraction and the OpenAI-compatible chat completions
//! adapter used by the playlist agent.

pub mod openai_compat;
pub mod traits;
pub mod util;

// Re-exports for convenience.
pub use openai_compat::OpenAiCompatProvider;
pub use traits::{ChatRequest, ChatResponse, LlmProvider, ToolChoice, Usage};
