//! `pa-agent`: the playlist agent runtime and its command-line front end.

pub mod bootstrap;
pub mod cli;
pub mod runtime;
