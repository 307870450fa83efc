//! Error types for trackobot-core

use thiserror::Error;

/// Main error type for the trackobot-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Settings database error
    #[error("settings database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP transport error (connection refused, timeout, TLS handshake)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The profile service answered, but not with what we asked for
    #[error("service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// TLS client setup error
    #[error("TLS error: {0}")]
    Tls(String),

    /// The pipeline task is no longer running
    #[error("pipeline has shut down")]
    Closed,
}

impl Error {
    /// Status code reported alongside a failed upload.
    ///
    /// HTTP statuses pass through; transport errors and malformed replies map to 0.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Service { status, .. } => *status,
            Error::Http(e) => e.status().map(|s| s.as_u16()).unwrap_or(0),
            _ => 0,
        }
    }

    pub(crate) fn malformed_reply(message: impl Into<String>) -> Self {
        Error::Service {
            status: 0,
            message: message.into(),
        }
    }
}

/// Result type alias for trackobot-core
pub type Result<T> = std::result::Result<T, Error>;
