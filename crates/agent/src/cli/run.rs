//! `playlist-agent run`: one-shot execution command.
//!
//! Sends a single message through the dispatch loop, prints the reply to
//! stdout and exits. Useful for scripting.

use pa_domain::config::Config;

use crate::bootstrap;

/// Execute a single exchange and print the reply.
///
/// Returns the process exit code: 0 on success, 1 on failure.
pub async fn run(config: &Config, message: &str) -> anyhow::Result<i32> {
    let (mut dispatch, user) = bootstrap::build_runtime(config).await?;
    tracing::debug!(user = %user.label(), "running one-shot exchange");

    match dispatch.handle_user_turn(message).await {
        Ok(reply) => {
            println!("{reply}");
            Ok(0)
        }
        Err(e) => {
            eprintln!("error: {e}");
            Ok(1)
        }
    }
}
