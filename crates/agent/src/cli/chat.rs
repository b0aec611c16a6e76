//! `playlist-agent chat`: interactive REPL command.
//!
//! Opens a readline loop that sends each line to the dispatch loop and
//! prints the assistant's reply. Slash-commands adjust the conversation.

use std::path::PathBuf;

use pa_domain::config::Config;
use pa_domain::tool::{ContentPart, MessageContent, Role};

use crate::bootstrap;
use crate::runtime::DispatchLoop;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Public entry point
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Run the interactive chat REPL.
pub async fn chat(config: &Config) -> anyhow::Result<()> {
    // 1. Boot the runtime; authentication failure ends the program here.
    let (mut dispatch, user) = bootstrap::build_runtime(config).await?;
    eprintln!("Successfully authenticated user {}", user.label());

    // 2. Initialize rustyline editor with persistent history.
    let history_path = history_path(config);
    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let mut rl = rustyline::DefaultEditor::new()?;
    let _ = rl.load_history(&history_path);

    // 3. Welcome message on stderr; stdout carries only replies.
    eprintln!("Playlist agent  |  model: {}", dispatch.model());
    eprintln!("Type /help for commands, Ctrl+D to exit");
    eprintln!();

    // 4. REPL loop. Each turn is awaited before the next line is read.
    loop {
        match rl.readline("you> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                rl.add_history_entry(&line).ok();

                if trimmed.starts_with('/') {
                    if handle_slash_command(trimmed, &mut dispatch) {
                        break;
                    }
                    continue;
                }

                match dispatch.handle_user_turn(trimmed).await {
                    Ok(reply) => println!("\n{reply}\n"),
                    Err(e) => eprintln!("\x1B[31merror: {e}\x1B[0m"),
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                eprintln!("(Use Ctrl+D or /exit to quit)");
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                break;
            }
            Err(e) => {
                eprintln!("\x1B[31mreadline error: {e}\x1B[0m");
                break;
            }
        }
    }

    rl.save_history(&history_path).ok();
    eprintln!("Goodbye!");
    Ok(())
}

fn history_path(config: &Config) -> PathBuf {
    config.chat.history_path.clone().unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_default()
            .join(".playlist-agent")
            .join("history.txt")
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Slash command handling
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Process a slash command. Returns `true` if the REPL should exit.
pub fn handle_slash_command(input: &str, dispatch: &mut DispatchLoop) -> bool {
    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).filter(|s| !s.is_empty());

    match cmd {
        "/exit" | "/quit" => return true,

        "/temperature" => match arg {
            Some(raw) => match raw.parse::<f64>() {
                Ok(t) => match dispatch.set_temperature(t) {
                    Ok(()) => eprintln!("Temperature set to {t}"),
                    Err(e) => eprintln!("\x1B[31merror: {e}\x1B[0m"),
                },
                Err(_) => eprintln!("Not a number: {raw}"),
            },
            None => {
                eprintln!("Current temperature: {}", dispatch.temperature());
                eprintln!("Usage: /temperature <0-2>");
            }
        },

        "/reset" => {
            dispatch.reset();
            eprintln!("Conversation cleared.");
        }

        "/history" => {
            for turn in dispatch.conversation().turns() {
                eprintln!("{}", render_turn(turn.role, &turn.content));
            }
        }

        "/help" => {
            eprintln!("Commands:");
            eprintln!("  /temperature <0-2>  Set the sampling temperature");
            eprintln!("  /reset              Clear the conversation");
            eprintln!("  /history            Print the conversation so far");
            eprintln!("  /exit, /quit        Exit the chat");
            eprintln!("  /help               Show this help");
        }

        other => {
            eprintln!("Unknown command: {other}  (type /help for a list)");
        }
    }

    false
}

fn render_turn(role: Role, content: &MessageContent) -> String {
    let text = content.extract_all_text();
    let mut line = format!("[{}] {}", role.as_str(), text);
    if role == Role::System {
        // The system prompt is long; the first line is enough to recognise it.
        let mut lines = text.lines();
        if let (Some(first), Some(_)) = (lines.next(), lines.next()) {
            line = format!("[{}] {first} ...", role.as_str());
        }
    }
    let actions: Vec<String> = match content {
        MessageContent::Parts(parts) => parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::ToolUse { name, input, .. } => Some(format!("{name}({input})")),
                _ => None,
            })
            .collect(),
        MessageContent::Text(_) => Vec::new(),
    };
    if !actions.is_empty() {
        line.push_str(&format!(" -> {}", actions.join(", ")));
    }
    line
}
