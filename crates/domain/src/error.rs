/// Shared error type used across all PlaylistAgent crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    #[error("Spotify: {0}")]
    Spotify(String),

    #[error("config: {0}")]
    Config(String),

    #[error("auth: {0}")]
    Auth(String),

    /// The model asked for an action with arguments that do not satisfy the
    /// action's declared schema (or are not JSON at all).
    #[error("malformed arguments for '{action}': {message}")]
    MalformedArguments { action: String, message: String },

    #[error("action round limit reached ({0} rounds) without a final reply")]
    ActionRoundLimit(usize),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
