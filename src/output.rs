//! Run ledger: one CSV row per attempted score file.

use std::fs::OpenOptions;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use tracing::debug;

use crate::marker::MarkStats;

#[derive(Debug, Default, Serialize)]
pub struct ProcessingRecord {
    pub timestamp: DateTime<Utc>,
    pub file: String,
    pub session: String,
    pub destination: Option<String>,
    pub rows: usize,
    pub present: usize,
    pub absent: usize,
    pub unmatched: usize,
    pub unresolved: usize,
    pub error_type: Option<String>,
    pub error_message: Option<String>,
}

impl ProcessingRecord {
    pub fn from_stats(file: &str, session: &str, destination: &Path, stats: &MarkStats) -> Self {
        ProcessingRecord {
            timestamp: Utc::now(),
            file: file.to_string(),
            session: session.to_string(),
            destination: Some(destination.display().to_string()),
            rows: stats.rows,
            present: stats.present,
            absent: stats.absent,
            unmatched: stats.unmatched,
            unresolved: stats.unresolved,
            ..Default::default()
        }
    }

    /// Create an error record for a file that could not be processed
    pub fn from_error(file: &str, session: &str, error_type: &str, error_message: &str) -> Self {
        ProcessingRecord {
            timestamp: Utc::now(),
            file: file.to_string(),
            session: session.to_string(),
            error_type: Some(error_type.to_string()),
            error_message: Some(error_message.to_string()),
            ..Default::default()
        }
    }
}

/// Appends a [`ProcessingRecord`] as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &Path, record: &ProcessingRecord) -> Result<()> {
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, "Appending ledger record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    writer.serialize(record)?;
    writer.flush()?;

    Ok(())
}
