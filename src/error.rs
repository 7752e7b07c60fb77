//! Error types for the Xiphos library.
//!
//! All fallible operations in this crate return [`Result`], whose error type
//! is the [`XiphosError`] enum. Configuration problems (an unknown sort
//! field, an empty sort specification) surface once, before any document is
//! compared; storage-layer I/O failures propagate unmodified through the
//! accessor call that raised them.
//!
//! # Examples
//!
//! ```
//! use xiphos::error::{Result, XiphosError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(XiphosError::invalid_argument("sort spec must not be empty"))
//! }
//!
//! assert!(example_operation().is_err());
//! ```

use std::io;

use anyhow;
use thiserror::Error;

/// The main error type for Xiphos operations.
#[derive(Error, Debug)]
pub enum XiphosError {
    /// I/O errors propagated from the storage layer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Field-related errors (unknown field, wrong doc-values type).
    #[error("Field error: {0}")]
    Field(String),

    /// Sort-configuration errors (bad sort spec, missing comparator input).
    #[error("Sort error: {0}")]
    Sort(String),

    /// Segment-related errors (bad context, accessor failure).
    #[error("Segment error: {0}")]
    Segment(String),

    /// Invalid operation for the current state.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error.
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with [`XiphosError`].
pub type Result<T> = std::result::Result<T, XiphosError>;

impl XiphosError {
    /// Create a new field error.
    pub fn field<S: Into<String>>(msg: S) -> Self {
        XiphosError::Field(msg.into())
    }

    /// Create a new sort-configuration error.
    pub fn sort<S: Into<String>>(msg: S) -> Self {
        XiphosError::Sort(msg.into())
    }

    /// Create a new segment error.
    pub fn segment<S: Into<String>>(msg: S) -> Self {
        XiphosError::Segment(msg.into())
    }

    /// Create a new invalid operation error.
    pub fn invalid_operation<S: Into<String>>(msg: S) -> Self {
        XiphosError::InvalidOperation(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        XiphosError::Other(format!("Invalid argument: {}", msg.into()))
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        XiphosError::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = XiphosError::field("year has no doc values");
        assert_eq!(error.to_string(), "Field error: year has no doc values");

        let error = XiphosError::sort("empty sort spec");
        assert_eq!(error.to_string(), "Sort error: empty sort spec");

        let error = XiphosError::invalid_argument("k must be positive");
        assert_eq!(
            error.to_string(),
            "Error: Invalid argument: k must be positive"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "segment file not found");
        let error = XiphosError::from(io_error);

        match error {
            XiphosError::Io(_) => {}
            _ => panic!("Expected IO error variant"),
        }
    }
}
