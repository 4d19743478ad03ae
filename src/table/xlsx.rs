use std::path::Path;

use anyhow::{Context, Result, anyhow};
use calamine::{Data, Reader, open_workbook_auto};
use rust_xlsxwriter::{ColNum, RowNum, Workbook};

use super::{Cell, ScoreTable};

/// Reads the first worksheet. Its first row is the header; blank header
/// cells are named `Unnamed: <index>`. Cells keep their sheet position even
/// when the used range does not start at `A1`.
pub(super) fn read(path: &Path) -> Result<ScoreTable> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("opening '{}'", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("'{}' has no worksheets", path.display()))?
        .with_context(|| format!("reading first worksheet of '{}'", path.display()))?;

    let Some((row0, col0)) = range.start() else {
        return Ok(ScoreTable::default());
    };
    let (row0, col0) = (row0 as usize, col0 as usize);
    let width = col0 + range.width();

    let mut grid = vec![vec![Cell::Empty; width]; row0];
    grid.extend(range.rows().map(|row| {
        let mut cells = vec![Cell::Empty; col0];
        cells.extend(row.iter().map(to_cell));
        cells
    }));

    let mut grid = grid.into_iter();
    let Some(header) = grid.next() else {
        return Ok(ScoreTable::default());
    };
    let columns = header
        .into_iter()
        .enumerate()
        .map(|(i, cell)| match cell {
            Cell::Empty => format!("Unnamed: {i}"),
            other => other.to_string(),
        })
        .collect::<Vec<_>>();

    Ok(ScoreTable::new(columns, grid.collect()))
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::Int(v) => Cell::Int(*v),
        Data::Float(v) => Cell::Float(*v),
        Data::Bool(v) => Cell::Bool(*v),
        Data::String(s) => Cell::from_text(s),
        other => Cell::Text(other.to_string()),
    }
}

/// Writes the table as a single-sheet workbook.
pub(super) fn write(table: &ScoreTable, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (c, name) in table.columns.iter().enumerate() {
        sheet.write_string(0, col_num(c)?, name.as_str())?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let row_num = RowNum::try_from(r + 1).context("too many rows for xlsx")?;
        for (c, cell) in row.iter().enumerate() {
            let col = col_num(c)?;
            match cell {
                Cell::Empty => {}
                Cell::Int(v) => {
                    sheet.write_number(row_num, col, *v as f64)?;
                }
                Cell::Float(v) => {
                    sheet.write_number(row_num, col, *v)?;
                }
                Cell::Bool(v) => {
                    sheet.write_boolean(row_num, col, *v)?;
                }
                Cell::Text(s) => {
                    sheet.write_string(row_num, col, s.as_str())?;
                }
            }
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("saving '{}'", path.display()))?;
    Ok(())
}

fn col_num(c: usize) -> Result<ColNum> {
    ColNum::try_from(c).context("too many columns for xlsx")
}
