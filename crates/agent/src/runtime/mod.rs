//! Core runtime: the action registry the model calls into and the dispatch
//! loop that drives one user turn through the LLM and back.

pub mod tools;
pub mod turn;

pub use tools::{build_tool_definitions, ActionRegistry, ActionRequest, ExchangeContext, ParsedCall};
pub use turn::{DispatchLoop, LoopSettings};
