//! Unified error types for the gridreduce pipeline
//!
//! Library code returns [`GridResult`]. The CLI wraps these in `anyhow` at the
//! command boundary, the same way every other front-end of the network model does.
//!
//! # Failure classes
//!
//! - [`GridError::Geometry`]: a cell or outline could not be repaired. Hard failure.
//! - [`GridError::MissingData`]: a zone lacks an outline. Callers warn and skip;
//!   it only becomes fatal when nothing at all can be produced.
//! - [`GridError::UnresolvedNode`]: a bus id does not resolve to a substation.
//!   Hard failure, since it would silently corrupt connectivity.

use thiserror::Error;

/// Unified error type for all gridreduce operations.
#[derive(Error, Debug)]
pub enum GridError {
    /// I/O errors (file access, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// A polygon is empty or invalid after the repair attempt
    #[error("Geometry error for '{id}': {reason}")]
    Geometry { id: String, reason: String },

    /// A zone lacks an outline or other required input
    #[error("Missing data: {0}")]
    MissingData(String),

    /// A bus id has no entry in a busmap stage
    #[error("Unresolved node '{id}': no entry in {stage}")]
    UnresolvedNode { id: String, stage: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network structure errors
    #[error("Network error: {0}")]
    Network(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

impl GridError {
    /// Shorthand for a [`GridError::Geometry`] naming the offending element.
    pub fn geometry(id: impl Into<String>, reason: impl Into<String>) -> Self {
        GridError::Geometry {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`GridError::UnresolvedNode`].
    pub fn unresolved(id: impl Into<String>, stage: impl Into<String>) -> Self {
        GridError::UnresolvedNode {
            id: id.into(),
            stage: stage.into(),
        }
    }
}

/// Convenience type alias for Results using GridError.
pub type GridResult<T> = Result<T, GridError>;

impl From<anyhow::Error> for GridError {
    fn from(err: anyhow::Error) -> Self {
        GridError::Other(err.to_string())
    }
}

impl From<String> for GridError {
    fn from(s: String) -> Self {
        GridError::Other(s)
    }
}

impl From<&str> for GridError {
    fn from(s: &str) -> Self {
        GridError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        GridError::Parse(err.to_string())
    }
}
