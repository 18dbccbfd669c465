//! Crate-wide error type.
//!
//! Configuration problems are caught before the first request goes out.
//! Everything else is scoped to the single file being produced, so the
//! orchestrator can record it and move on.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocgenError {
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The endpoint answered with a non-success HTTP status.
    #[error("endpoint returned status {status}: {body}")]
    Endpoint { status: u16, body: String },

    /// The request never produced an HTTP status (connect, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid endpoint response: {0}")]
    InvalidResponse(String),

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DocgenError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Pre-flight errors that make the whole run pointless.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, DocgenError>;
