use thiserror::Error;

/// Errors from the Plex Media Server client.
#[derive(Debug, Error)]
pub enum PlexError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid server address: {0}")]
    Address(#[from] url::ParseError),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("library '{0}' not found on server")]
    LibraryNotFound(String),

    #[error("library '{library}' uses the '{agent}' agent, expected '{required}'")]
    AgentMismatch {
        library: String,
        agent: String,
        required: String,
    },
}
