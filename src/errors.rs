use std::io;

use thiserror::Error;

use crate::types::{ColumnName, Filename, LabelName, Severity};

/// Error type for ingestion, extraction, splitting, encoding, and persistence failures.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("column schemas differ: {left:?} vs {right:?}")]
    SchemaMismatch {
        left: Vec<ColumnName>,
        right: Vec<ColumnName>,
    },
    #[error("label '{label}' for '{filename}' is not in the label dictionary")]
    UnknownLabel { label: LabelName, filename: Filename },
    #[error("severity {0} is not one of -1, 0, 1, 2, 3")]
    InvalidSeverity(Severity),
    #[error(
        "severity {severity} has {held_out} held-out records but no training records to split"
    )]
    EmptyStratum { severity: Severity, held_out: usize },
    #[error("malformed input at {location}: {reason}")]
    Malformed { location: String, reason: String },
    #[error("no report found for '{0}'")]
    MissingReport(Filename),
    #[error("filename '{0}' occurs more than once")]
    DuplicateFilename(Filename),
    #[error("expected {expected} {what}, found {found}")]
    UnexpectedCount {
        what: String,
        expected: usize,
        found: usize,
    },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
