//! Centralized error types for stmtscan.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the stmtscan library.
#[derive(Error, Debug)]
pub enum StmtError {
    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The message source has no message with this id.
    #[error("Message not found: {0}")]
    MessageNotFound(String),

    /// A message or attachment could not be fetched from its source.
    #[error("Retrieval failed for '{id}': {reason}")]
    Retrieval { id: String, reason: String },

    /// A transport encoding or text encoding could not be decoded.
    #[error("Decoding error: {0}")]
    Decode(String),

    /// The document-text extractor could not read a PDF.
    #[error("PDF extraction error: {0}")]
    Pdf(String),

    /// The statement `Date` header does not match the expected format.
    #[error("Invalid statement date '{value}': {reason}")]
    InvalidDate { value: String, reason: String },

    /// Malformed JSON in a message, attachment or store file.
    #[error("JSON error in '{path}': {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The statement store could not be read or written.
    #[error("Store error: {0}")]
    Store(String),
}

/// Convenience alias for `Result<T, StmtError>`.
pub type Result<T> = std::result::Result<T, StmtError>;

impl StmtError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a `Json` variant from a path and a `serde_json::Error`.
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    /// Create a `Retrieval` variant for a message or attachment id.
    pub fn retrieval(id: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Retrieval {
            id: id.into(),
            reason: reason.to_string(),
        }
    }

    /// `true` for errors that abort a statement parse rather than degrade it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidDate { .. } | Self::Store(_))
    }
}

/// Allow `?` on `std::io::Error` when no path context is available
/// (rare, prefer `StmtError::io`).
impl From<std::io::Error> for StmtError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}
