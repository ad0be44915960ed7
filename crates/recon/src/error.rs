use thiserror::Error;

use crate::model::SourceKind;

/// Structural failures. Any of these aborts the run before a report exists.
///
/// Per-record problems (bad dates, bad durations, unknown names) are not
/// errors; they are counted in [`crate::diagnostics::Diagnostics`].
#[derive(Debug, Error)]
pub enum ReconError {
    /// A required source file is absent.
    #[error("{kind} source: file not found: {path}")]
    MissingSource { kind: SourceKind, path: String },

    /// A required column is not present in a source's header row.
    #[error("{kind} source: missing column '{column}'")]
    MissingColumn { kind: SourceKind, column: String },

    /// The CSV reader rejected the file.
    #[error("{kind} source: {message}")]
    Csv { kind: SourceKind, message: String },

    /// Config TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Config validation error (override chain, bad tier table, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),

    /// Date window is malformed or inverted.
    #[error("invalid date window: {0}")]
    InvalidWindow(String),

    /// Writing the report failed.
    #[error("cannot write {path}: {message}")]
    Write { path: String, message: String },

    /// IO error (file read, etc.).
    #[error("IO error: {0}")]
    Io(String),
}

pub type ReconResult<T> = Result<T, ReconError>;
