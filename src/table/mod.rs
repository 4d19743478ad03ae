//! In-memory score tables and their on-disk formats.
//!
//! A table is read whole and written whole. CSV files go through the `csv`
//! crate, XLSX workbooks through `calamine` (read) and `rust_xlsxwriter`
//! (write). Column order is always preserved.

mod delimited;
mod xlsx;

use std::fmt;
use std::path::Path;

use anyhow::Result;
use tracing::debug;

use crate::error::MarkError;

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Cell {
    /// Builds a cell from a raw text field, mapping `""` to [`Cell::Empty`].
    pub fn from_text(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Int(v) => write!(f, "{v}"),
            Cell::Float(v) => write!(f, "{v}"),
            Cell::Bool(v) => write!(f, "{v}"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// Column names plus row-major cells. Rows may be shorter than the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ScoreTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { columns, rows }
    }

    /// Index of the column named exactly `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Names every cell position: rows wider than the header get
    /// `Unnamed: <index>` columns.
    pub fn widen_to_rows(&mut self) {
        let widest = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        for i in self.columns.len()..widest {
            self.columns.push(format!("Unnamed: {i}"));
        }
    }

    /// Returns the index of `name`, appending it (filled with `default` on
    /// every row) when it does not exist yet.
    pub fn ensure_column(&mut self, name: &str, default: Cell) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.widen_to_rows();
        let idx = self.columns.len();
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            if row.len() < idx {
                row.resize(idx, Cell::Empty);
            }
            row.push(default.clone());
        }
        idx
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Sets a cell, padding a short row with empty cells first.
    pub fn set(&mut self, row: usize, col: usize, value: Cell) {
        if let Some(r) = self.rows.get_mut(row) {
            if r.len() <= col {
                r.resize(col + 1, Cell::Empty);
            }
            r[col] = value;
        }
    }
}

/// On-disk table formats recognized by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Xlsx,
    /// Legacy Excel 97-2003 workbook: readable, never written.
    Xls,
}

impl TableFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(TableFormat::Csv),
            "xlsx" => Some(TableFormat::Xlsx),
            "xls" => Some(TableFormat::Xls),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Format a marked table of this format is saved as.
    pub fn output_format(self) -> Self {
        match self {
            TableFormat::Xls => TableFormat::Xlsx,
            other => other,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            TableFormat::Csv => "csv",
            TableFormat::Xlsx => "xlsx",
            TableFormat::Xls => "xls",
        }
    }
}

/// Reads a whole table, choosing the reader from the file extension.
pub fn read_table(path: &Path) -> Result<ScoreTable> {
    let format =
        TableFormat::from_path(path).ok_or_else(|| MarkError::UnsupportedFormat(path.into()))?;
    debug!(path = %path.display(), ?format, "Reading score table");
    match format {
        TableFormat::Csv => delimited::read(path),
        TableFormat::Xlsx | TableFormat::Xls => xlsx::read(path),
    }
}

/// Writes a whole table, choosing the writer from the file extension.
pub fn write_table(table: &ScoreTable, path: &Path) -> Result<()> {
    let format =
        TableFormat::from_path(path).ok_or_else(|| MarkError::UnsupportedFormat(path.into()))?;
    debug!(path = %path.display(), ?format, rows = table.rows.len(), "Writing score table");
    match format {
        TableFormat::Csv => delimited::write(table, path),
        TableFormat::Xlsx => xlsx::write(table, path),
        TableFormat::Xls => Err(MarkError::LegacyWorkbook(path.into()).into()),
    }
}
