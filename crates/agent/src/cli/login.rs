//! `playlist-agent login`: Spotify authorization-code flow.
//!
//! Prints the authorize URL, reads back the URL the browser was redirected
//! to, exchanges the code and caches the tokens for later runs.

use std::io::BufRead;
use std::time::Duration;

use anyhow::Context;

use pa_domain::config::Config;
use pa_spotify::auth::{authorize_url, exchange_code, extract_code};
use pa_spotify::{SpotifyCredentials, TokenStore};

pub async fn login(config: &Config) -> anyhow::Result<()> {
    let cfg = &config.spotify;
    let creds = SpotifyCredentials::from_env(cfg)?;
    let store = TokenStore::from_config(cfg)?;

    // 1. Send the user to the consent page.
    let state = uuid::Uuid::new_v4().simple().to_string();
    let url = authorize_url(&cfg.accounts_base_url, &creds, &state)?;

    eprintln!();
    eprintln!("To authorize playlist access, open:");
    eprintln!("  {url}");
    eprintln!();
    eprintln!("Then paste the URL you were redirected to (or just the code):");

    // 2. Read the redirect back.
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("reading redirect URL from stdin")?;
    let code = extract_code(input.trim(), &state)?;

    // 3. Exchange and persist.
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(cfg.timeout_ms))
        .build()
        .context("building HTTP client")?;
    let response = exchange_code(&client, &cfg.accounts_base_url, &creds, &code).await?;
    let tokens = response.into_tokens(chrono::Utc::now().timestamp(), None)?;
    store.save(&tokens)?;

    eprintln!();
    eprintln!("Login successful. Token cached at {}", store.path().display());
    Ok(())
}
