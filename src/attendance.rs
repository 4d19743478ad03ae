//! Attendance loader.
//!
//! The attendance sheet is a CSV export with a multi-row header: a row that
//! starts with a "Roll ..." cell, followed by two sub-header rows, followed
//! by one row per student. Presence cells sit at fixed column offsets given
//! by [`SessionLayout`].

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use tracing::{debug, info, warn};

use crate::config::SessionLayout;
use crate::error::MarkError;
use crate::normalize::{is_present, roll_key};
use crate::table::Cell;

/// Number of sub-header rows between the header row and the first student.
const SUBHEADER_ROWS: usize = 2;

/// One student row from the attendance sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRecord {
    pub raw_roll: String,
    pub name: String,
    pub surname: String,
    pub key: Option<u64>,
    /// Presence per session, index 0 is session 1.
    pub presence: Vec<bool>,
}

impl AttendanceRecord {
    pub fn attended(&self, session: u32) -> Option<bool> {
        let idx = (session as usize).checked_sub(1)?;
        self.presence.get(idx).copied()
    }
}

/// Roll key to presence for a single session.
pub type SessionLookup = HashMap<u64, bool>;

/// Parsed attendance sheet. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Attendance {
    records: Vec<AttendanceRecord>,
    layout: SessionLayout,
}

impl Attendance {
    /// Reads and parses the attendance file at `path`.
    ///
    /// # Errors
    ///
    /// Fails with [`MarkError::MissingAttendance`] if the file does not exist
    /// and [`MarkError::HeaderNotFound`] if no roll header row is present.
    pub fn load(path: &Path, layout: &SessionLayout) -> Result<Self> {
        if !path.exists() {
            return Err(MarkError::MissingAttendance(path.to_path_buf()).into());
        }
        let bytes =
            std::fs::read(path).with_context(|| format!("reading '{}'", path.display()))?;
        let attendance = Self::parse(&bytes, layout)?;
        info!(
            path = %path.display(),
            students = attendance.records.len(),
            sessions = layout.session_count,
            "Attendance loaded"
        );
        Ok(attendance)
    }

    /// Parses attendance CSV bytes. Invalid UTF-8 sequences are dropped.
    pub fn parse(bytes: &[u8], layout: &SessionLayout) -> Result<Self> {
        let text = decode_dropping_invalid(bytes);
        let rows = read_rows(&text)?;

        let header_idx = find_header_row(&rows).ok_or(MarkError::HeaderNotFound)?;
        debug!(header_idx, "Attendance header row located");

        let records = rows
            .iter()
            .skip(header_idx + 1 + SUBHEADER_ROWS)
            .filter(|row| row.len() >= 3)
            .map(|row| parse_record(row, layout))
            .collect();

        Ok(Self {
            records,
            layout: layout.clone(),
        })
    }

    pub fn records(&self) -> &[AttendanceRecord] {
        &self.records
    }

    /// Builds the key-to-presence map for `label`.
    ///
    /// Returns `None` when `label` is not one of the configured sessions.
    /// Records without a roll key are left out. If two records share a key
    /// the later one wins.
    pub fn lookup(&self, label: &str) -> Option<SessionLookup> {
        let (session, _) = self.layout.labels().find(|(_, l)| l == label)?;

        let mut map = SessionLookup::with_capacity(self.records.len());
        for record in &self.records {
            let Some(key) = record.key else { continue };
            let present = record.attended(session).unwrap_or(false);
            if map.insert(key, present).is_some() {
                warn!(key, roll = %record.raw_roll, "Duplicate roll key in attendance; later row wins");
            }
        }
        Some(map)
    }
}

/// Decodes UTF-8, skipping invalid byte sequences and a leading BOM.
fn decode_dropping_invalid(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

/// The csv reader drops empty lines, but they still count toward the
/// header offset. Each empty line outside a quoted field becomes `""`,
/// a one-cell row that is otherwise ignored.
fn mark_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_quotes = false;
    for line in text.split_inclusive('\n') {
        let content = line.trim_end_matches(['\r', '\n']);
        if !in_quotes && content.is_empty() {
            out.push_str("\"\"");
        }
        out.push_str(line);
        if content.matches('"').count() % 2 == 1 {
            in_quotes = !in_quotes;
        }
    }
    out
}

fn read_rows(text: &str) -> Result<Vec<Vec<String>>> {
    let text = mark_blank_lines(text);
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("parsing attendance CSV")?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

fn find_header_row(rows: &[Vec<String>]) -> Option<usize> {
    rows.iter().position(|row| {
        row.iter()
            .take(3)
            .any(|cell| cell.trim().to_lowercase().starts_with("roll"))
    })
}

fn parse_record(row: &[String], layout: &SessionLayout) -> AttendanceRecord {
    let raw_roll = row[0].trim().to_string();
    let presence = (1..=layout.session_count)
        .map(|session| {
            let cell = row
                .get(layout.presence_column(session))
                .map(|v| Cell::from_text(v));
            is_present(cell.as_ref())
        })
        .collect();

    AttendanceRecord {
        key: roll_key(&raw_roll),
        name: row[1].trim().to_string(),
        surname: row[2].trim().to_string(),
        raw_roll,
        presence,
    }
}
