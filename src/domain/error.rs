//! Domain error types.
//!
//! Only structural and destination failures are errors. Row-level problems are
//! reported as [`RowWarning`] values and never abort a batch.

use std::fmt;

/// Top-level error type for reportrecon.
#[derive(Debug, thiserror::Error)]
pub enum ReconError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("cannot decode {source_name}: {reason}")]
    SourceFormat { source_name: String, reason: String },

    #[error("{source_name} is missing required column {column}")]
    MissingColumn { source_name: String, column: String },

    #[error("no {table} header found in report")]
    HeaderNotFound { table: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&ReconError> for std::process::ExitCode {
    fn from(err: &ReconError) -> Self {
        let code: u8 = match err {
            ReconError::Io(_) => 1,
            ReconError::ConfigParse { .. }
            | ReconError::ConfigMissing { .. }
            | ReconError::ConfigInvalid { .. } => 2,
            ReconError::Database { .. } | ReconError::DatabaseQuery { .. } => 3,
            ReconError::SourceFormat { .. } | ReconError::MissingColumn { .. } => 4,
            ReconError::HeaderNotFound { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// The row's primary identifier was absent or unparsable; the row was dropped.
    MissingIdentifier,
    /// A timestamp was filled with the processing instant.
    SyntheticTimestamp,
}

/// A non-fatal problem with a single source row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowWarning {
    /// Zero-based row index in the source (grid row or data-file line).
    pub row: usize,
    pub kind: WarningKind,
    pub message: String,
}

impl RowWarning {
    pub fn new(row: usize, kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            row,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for RowWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}", self.row + 1, self.message)
    }
}
