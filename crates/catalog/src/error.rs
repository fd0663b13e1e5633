//! Error types for the catalog crate.

use thiserror::Error;

/// Errors raised while loading candidate data or talking to a candidate store.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading or writing a file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// File contents are not the expected JSON shape
    #[error("Parse error in {file}: {reason}")]
    ParseError { file: String, reason: String },

    /// A record failed validation
    #[error("Invalid record {name:?}: {reason}")]
    InvalidRecord { name: String, reason: String },

    /// The backing store could not be reached or answered with an error.
    ///
    /// The message must not carry credentials or full URLs.
    #[error("Candidate store unavailable: {0}")]
    Unavailable(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CatalogError>;
