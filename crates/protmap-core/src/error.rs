//! Error types for protmap-core.
//!
//! Errors are split by how far they propagate:
//!
//! | Type          | Scope                                                   |
//! |---------------|---------------------------------------------------------|
//! | [`LoadError`] | Startup only. The process must not serve sessions.      |
//! | [`QueryError`]| One client message. The session keeps running.          |
//! | [`TermError`] | One term lookup. `NotFound` means "matches nothing".    |
//!
//! A lookup that finds nothing (an unknown search term, an unknown protein)
//! is not an error at all and is represented by an empty collection.

use std::path::PathBuf;

/// Failure while building the point table or one of its indices.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{path}: required column `{column}` is missing from the header")]
    MissingColumn { path: String, column: &'static str },

    #[error("{path}:{line}: column `{column}` has malformed value {value:?}")]
    MalformedCell {
        path: String,
        line: usize,
        column: &'static str,
        value: String,
    },

    #[error("{path}:{line}: expected {expected} tab-separated fields, found {found}")]
    MalformedLine {
        path: String,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("{path} is empty")]
    Empty { path: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

/// A malformed client request. Reported back to the sender as an error event.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("unknown message type {0:?}")]
    UnknownMessageType(String),

    #[error("field `{field}` is not a finite number: {value:?}")]
    NotANumber { field: &'static str, value: String },

    #[error("field `{field}` must be a [min, max] pair, got {value:?}")]
    MalformedRange { field: &'static str, value: String },

    #[error("field `{field}` has the wrong shape: {reason}")]
    WrongShape { field: &'static str, reason: String },
}

/// Failure resolving an `(ontology, term)` membership set.
#[derive(Debug, thiserror::Error)]
pub enum TermError {
    /// No membership file exists for this key.
    #[error("no membership data for {ontology}/{term}")]
    NotFound { ontology: String, term: String },

    /// The file exists but could not be read.
    #[error("failed to read term file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TermError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TermError::NotFound { .. })
    }
}
