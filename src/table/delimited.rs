use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};

use super::{Cell, ScoreTable};

/// Reads a CSV score table. The first record is the header; every data
/// field is kept as text. Rows wider than the header add `Unnamed: <i>`
/// columns.
pub(super) fn read(path: &Path) -> Result<ScoreTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening '{}'", path.display()))?;

    let columns = reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("reading '{}'", path.display()))?;
        rows.push(record.iter().map(Cell::from_text).collect());
    }

    let mut table = ScoreTable::new(columns, rows);
    table.widen_to_rows();
    Ok(table)
}

/// Writes the table as CSV, padding every row to the header width.
pub(super) fn write(table: &ScoreTable, path: &Path) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("creating '{}'", path.display()))?;

    writer.write_record(&table.columns)?;
    let width = table.columns.len();
    for row in &table.rows {
        let mut fields = row.iter().map(|c| c.to_string()).collect::<Vec<_>>();
        if fields.len() < width {
            fields.resize(width, String::new());
        }
        writer.write_record(&fields)?;
    }
    writer.flush()?;

    Ok(())
}
