use clap::Parser;
use tracing_subscriber::EnvFilter;

use pa_agent::cli::{self, Cli, Command, ConfigCommand};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Credentials usually live in a local .env file.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_cli_tracing();

    match cli.command {
        None | Some(Command::Chat) => {
            let (config, _config_path) = cli::load_config()?;
            cli::chat::chat(&config).await
        }
        Some(Command::Run { message }) => {
            let (config, _config_path) = cli::load_config()?;
            let code = cli::run::run(&config, &message).await?;
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Some(Command::Login) => {
            let (config, _config_path) = cli::load_config()?;
            cli::login::login(&config).await
        }
        Some(Command::Config(ConfigCommand::Validate)) => {
            let (config, config_path) = cli::load_config()?;
            if !cli::config::validate(&config, &config_path) {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let (config, _config_path) = cli::load_config()?;
            cli::config::show(&config)
        }
    }
}

/// Quiet tracing for interactive commands: warnings and above to stderr,
/// overridable through `RUST_LOG`.
fn init_cli_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
