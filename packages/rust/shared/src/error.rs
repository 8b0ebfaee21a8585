//! Error types for rfctrans.
//!
//! Library crates use [`RfcTransError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all rfctrans operations.
#[derive(Debug, thiserror::Error)]
pub enum RfcTransError {
    /// The remote source confirmed the document does not exist.
    ///
    /// This is the only failure the orchestrator recovers from.
    #[error("RFC {0} not found at the remote source")]
    RfcNotFound(String),

    /// Translation was requested before the document was fetched.
    #[error("no fetched document for RFC {0}; run the fetch stage first")]
    MissingSourceDocument(String),

    /// Rendering was requested before the document was translated.
    #[error("no translation for RFC {0}; run the translate stage first")]
    MissingTranslation(String),

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while talking to a remote source.
    #[error("network error: {0}")]
    Network(String),

    /// Malformed text, XML or HTML.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Translation endpoint error or unexpected response.
    #[error("translation error: {0}")]
    Translation(String),

    /// Chat-model error during summarization.
    #[error("summarize error: {0}")]
    Summarize(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad identifier, inconsistent artifact, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, RfcTransError>;

impl RfcTransError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is the recoverable "document does not exist" case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RfcNotFound(_))
    }
}
