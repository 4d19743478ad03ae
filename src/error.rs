//! Typed failures raised by the loader and the marker.
//!
//! Setup failures (`MissingAttendance`, `HeaderNotFound`, `InvalidConfig`)
//! abort a run. Everything else is scoped to a single score file.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarkError {
    #[error("attendance file '{}' not found", .0.display())]
    MissingAttendance(PathBuf),

    #[error("could not find attendance header row with 'Roll No.'")]
    HeaderNotFound,

    #[error("no roll number column found (columns: {})", .columns.join(", "))]
    NoRollColumn { columns: Vec<String> },

    #[error("'{0}' not found in attendance data")]
    UnknownSession(String),

    #[error("unsupported table format: '{}'", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("cannot write legacy .xls workbook '{}'", .0.display())]
    LegacyWorkbook(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl MarkError {
    /// Short machine-friendly tag, used for the `error_type` ledger column.
    pub fn kind(&self) -> &'static str {
        match self {
            MarkError::MissingAttendance(_) => "missing_attendance",
            MarkError::HeaderNotFound => "header_not_found",
            MarkError::NoRollColumn { .. } => "no_roll_column",
            MarkError::UnknownSession(_) => "unknown_session",
            MarkError::UnsupportedFormat(_) => "unsupported_format",
            MarkError::LegacyWorkbook(_) => "legacy_workbook",
            MarkError::InvalidConfig(_) => "invalid_config",
        }
    }
}
