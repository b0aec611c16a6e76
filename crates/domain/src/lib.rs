//! Shared types for the playlist agent: the error enum, conversation and
//! tool-call messages, configuration, and structured trace events.

pub mod config;
pub mod error;
pub mod tool;
pub mod trace;
