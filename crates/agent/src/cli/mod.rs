pub mod chat;
pub mod config;
pub mod login;
pub mod run;

use clap::{Parser, Subcommand};

/// playlist-agent: chat with an LLM that builds Spotify playlists.
#[derive(Debug, Parser)]
#[command(name = "playlist-agent", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the interactive chat (default when no subcommand is given).
    Chat,
    /// Send a single message and print the reply.
    Run {
        /// The message to send.
        message: String,
    },
    /// Authorize playlist access on Spotify and cache the token.
    Login,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path in `PA_CONFIG` (or `config.toml`).
/// A missing file yields the defaults. Returns the config and the path used.
pub fn load_config() -> anyhow::Result<(pa_domain::config::Config, String)> {
    let config_path = std::env::var("PA_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        pa_domain::config::Config::default()
    };

    Ok((config, config_path))
}
