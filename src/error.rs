//! Error types for sdformat
//!
//! This module defines the hard-failure error type of the library. Problems
//! found while validating a document are not errors in this sense: they are
//! returned as data (see [`crate::validators::ValidationError`]).

use thiserror::Error;

/// Result type alias using sdformat Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sdformat operations
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed document text
    #[error("XML error: {0}")]
    Xml(String),

    /// Malformed or inconsistent schema definition
    #[error("schema error: {0}")]
    Schema(String),

    /// No schema is registered for the requested format version
    #[error("unsupported SDFormat version [{0}]")]
    UnsupportedVersion(String),

    /// Resource loading error
    #[error("resource error: {0}")]
    Resource(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<roxmltree::Error> for Error {
    fn from(err: roxmltree::Error) -> Self {
        Error::Schema(err.to_string())
    }
}
