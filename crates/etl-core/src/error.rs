//! Error taxonomy shared by all pipeline stages.
//!
//! Every stage surfaces its failures through [`EtlError`]; nothing below the
//! orchestrator catches and suppresses an error from a lower layer. There is
//! no retry or backoff anywhere in the pipeline: a failure ends the run.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by extraction, transformation, loading, and modeling.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EtlError {
    /// An input resource (file path) does not exist.
    #[error("source not found: {path}")]
    NotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// Input exists but its content could not be parsed.
    #[error("malformed input from {source_id}: {message}")]
    Parse {
        /// Identifier of the offending source (path or URL).
        source_id: String,
        /// What went wrong.
        message: String,
    },

    /// API extraction failed: transport error, timeout, or non-2xx status.
    #[error("network error: {0}")]
    Network(String),

    /// A transform was given arguments or data it cannot work with.
    #[error("{0}")]
    Value(String),

    /// A value could not be coerced to the requested column type.
    #[error("cannot coerce column '{column}' to {target}: offending value '{value}'")]
    Type {
        /// Column being converted.
        column: String,
        /// Target type name.
        target: String,
        /// First value that failed to coerce.
        value: String,
    },

    /// A referenced column does not exist in the table.
    #[error("unknown column: {column}")]
    Key {
        /// The missing column name.
        column: String,
    },

    /// The destination database could not be reached or opened.
    #[error("database connection error: {0}")]
    Connection(String),

    /// The destination table exists with an incompatible column set.
    #[error("schema mismatch: {0}")]
    Schema(String),

    /// A fact row's natural key did not resolve to a dimension row.
    #[error("referential integrity violation: {0}")]
    Integrity(String),

    /// Underlying I/O failure outside the cases above.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure inside the dataframe engine.
    #[error("dataframe error: {0}")]
    Frame(#[from] polars::error::PolarsError),
}

impl EtlError {
    /// Error for a missing input path.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Error for malformed content from a named source.
    pub fn parse(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    /// Error for a column reference that does not resolve.
    pub fn unknown_column(column: impl Into<String>) -> Self {
        Self::Key {
            column: column.into(),
        }
    }
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, EtlError>;
