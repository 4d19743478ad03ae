//! Session marker: rewrites rubric marks in one score table from attendance.

use tracing::{debug, trace};

use crate::attendance::Attendance;
use crate::config::MarkerConfig;
use crate::error::MarkError;
use crate::normalize::cell_roll_key;
use crate::table::{Cell, ScoreTable};

/// Per-table outcome counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MarkStats {
    pub rows: usize,
    /// Rows matched and marked present.
    pub present: usize,
    /// Rows matched and marked absent.
    pub absent: usize,
    /// Rows with a roll key that has no attendance entry.
    pub unmatched: usize,
    /// Rows whose roll cell has no digits.
    pub unresolved: usize,
}

/// Finds the roll-number column.
///
/// Aliases are tried in order with a trimmed, case-insensitive exact match;
/// failing that, the first column whose name contains "roll" is used.
pub fn find_roll_column(columns: &[String], aliases: &[String]) -> Option<usize> {
    for alias in aliases {
        let alias = alias.trim().to_lowercase();
        if let Some(idx) = columns
            .iter()
            .position(|c| c.trim().to_lowercase() == alias)
        {
            return Some(idx);
        }
    }
    columns
        .iter()
        .position(|c| c.trim().to_lowercase().contains("roll"))
}

/// Rewrites rubric and total columns of `table` for session `label`.
///
/// Matched rows get every rubric parameter set to its points when present
/// (0 when absent) and the total set to their sum, replacing any previous
/// marks. Rows without a roll key, or whose key is unknown to the
/// attendance sheet, keep their cells. Missing rubric and total columns
/// are appended with 0.
pub fn mark_session(
    table: &mut ScoreTable,
    attendance: &Attendance,
    label: &str,
    config: &MarkerConfig,
) -> Result<MarkStats, MarkError> {
    let roll_col =
        find_roll_column(&table.columns, &config.roll_aliases).ok_or_else(|| {
            MarkError::NoRollColumn {
                columns: table.columns.clone(),
            }
        })?;

    let lookup = attendance
        .lookup(label)
        .ok_or_else(|| MarkError::UnknownSession(label.to_string()))?;

    let rubric_cols = config
        .rubric
        .items
        .iter()
        .map(|item| (table.ensure_column(&item.name, Cell::Int(0)), item.points))
        .collect::<Vec<_>>();
    let total_col = table.ensure_column(&config.total_column, Cell::Int(0));
    debug!(
        roll_column = %table.columns[roll_col],
        label,
        students = lookup.len(),
        "Marking session"
    );

    let mut stats = MarkStats {
        rows: table.rows.len(),
        ..MarkStats::default()
    };

    for row in 0..table.rows.len() {
        let Some(key) = table.get(row, roll_col).and_then(cell_roll_key) else {
            stats.unresolved += 1;
            continue;
        };
        let Some(&present) = lookup.get(&key) else {
            trace!(key, "No attendance entry for roll");
            stats.unmatched += 1;
            continue;
        };

        let mut total = 0;
        for &(col, points) in &rubric_cols {
            let mark = if present { points } else { 0 };
            table.set(row, col, Cell::Int(mark));
            total += mark;
        }
        table.set(row, total_col, Cell::Int(total));

        if present {
            stats.present += 1;
        } else {
            stats.absent += 1;
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionLayout;

    const SHEET: &str = "Roll No.,Name,Surname\n,,\n,,\n14,Jane,Doe,P\n15,John,Roe,A\n";

    fn attendance() -> Attendance {
        Attendance::parse(SHEET.as_bytes(), &SessionLayout::default()).unwrap()
    }

    fn text(s: &str) -> Cell {
        Cell::from_text(s)
    }

    fn names(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    fn score_table() -> ScoreTable {
        ScoreTable::new(
            names(&["Roll No", "Name", "Oral Presentation", "Total"]),
            vec![
                vec![text("CS-014"), text("Jane"), Cell::Int(1), Cell::Int(1)],
                vec![text("15"), text("John"), Cell::Int(3), Cell::Int(7)],
                vec![text("TBD"), text("Nobody"), Cell::Int(2), Cell::Int(2)],
                vec![text("99"), text("Visitor"), Cell::Int(5), Cell::Int(5)],
            ],
        )
    }

    #[test]
    fn test_find_roll_column_alias_order() {
        let cols = names(&["Name", "rollnumber", " ROLL NO. "]);
        let aliases = MarkerConfig::default().roll_aliases;
        // "Roll No." comes before "RollNumber" in the alias list
        assert_eq!(find_roll_column(&cols, &aliases), Some(2));
    }

    #[test]
    fn test_find_roll_column_substring_fallback() {
        let aliases = MarkerConfig::default().roll_aliases;
        let cols = names(&["Name", "Enrollment", "Student roll id"]);
        assert_eq!(find_roll_column(&cols, &aliases), Some(1));
        assert_eq!(find_roll_column(&names(&["Name", "ID"]), &aliases), None);
    }

    #[test]
    fn test_present_row_gets_full_marks() {
        let mut table = score_table();
        let config = MarkerConfig::default();
        mark_session(&mut table, &attendance(), "Session 1", &config).unwrap();

        let oral = table.column_index("Oral Presentation").unwrap();
        let total = table.column_index("Total").unwrap();
        for item in &config.rubric.items {
            let col = table.column_index(&item.name).unwrap();
            assert_eq!(table.get(0, col), Some(&Cell::Int(item.points)));
        }
        assert_eq!(table.get(0, oral), Some(&Cell::Int(3)));
        assert_eq!(table.get(0, total), Some(&Cell::Int(10)));
    }

    #[test]
    fn test_absent_row_is_zeroed() {
        let mut table = score_table();
        let config = MarkerConfig::default();
        mark_session(&mut table, &attendance(), "Session 1", &config).unwrap();

        for item in &config.rubric.items {
            let col = table.column_index(&item.name).unwrap();
            assert_eq!(table.get(1, col), Some(&Cell::Int(0)));
        }
        let total = table.column_index("Total").unwrap();
        assert_eq!(table.get(1, total), Some(&Cell::Int(0)));
    }

    #[test]
    fn test_unresolved_and_unmatched_rows_untouched() {
        let original = score_table();
        let mut table = original.clone();
        let stats =
            mark_session(&mut table, &attendance(), "Session 1", &MarkerConfig::default())
                .unwrap();

        // existing columns keep their values; appended columns hold the fill value
        for row in [2, 3] {
            for col in 0..original.columns.len() {
                assert_eq!(table.get(row, col), original.get(row, col));
            }
        }
        assert_eq!(
            stats,
            MarkStats {
                rows: 4,
                present: 1,
                absent: 1,
                unmatched: 1,
                unresolved: 1,
            }
        );
    }

    #[test]
    fn test_missing_columns_appended_in_rubric_order() {
        let mut table = score_table();
        mark_session(&mut table, &attendance(), "Session 1", &MarkerConfig::default()).unwrap();

        assert_eq!(
            table.columns,
            names(&[
                "Roll No",
                "Name",
                "Oral Presentation",
                "Total",
                "Timely completion, punctuality",
                "Performance, involvement, efficiency",
                "Documentation, neatness",
            ])
        );
        // appended columns default to 0 on unmatched rows
        assert_eq!(table.get(3, 4), Some(&Cell::Int(0)));
    }

    #[test]
    fn test_marking_is_idempotent() {
        let config = MarkerConfig::default();
        let att = attendance();
        let mut once = score_table();
        mark_session(&mut once, &att, "Session 1", &config).unwrap();
        let mut twice = once.clone();
        mark_session(&mut twice, &att, "Session 1", &config).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn test_overwrites_rather_than_accumulates() {
        let mut table = ScoreTable::new(
            names(&["Roll", "Oral Presentation", "Total"]),
            vec![vec![text("14"), Cell::Int(99), Cell::Int(500)]],
        );
        mark_session(&mut table, &attendance(), "Session 1", &MarkerConfig::default()).unwrap();

        assert_eq!(table.get(0, 1), Some(&Cell::Int(3)));
        assert_eq!(table.get(0, 2), Some(&Cell::Int(10)));
    }

    #[test]
    fn test_no_roll_column() {
        let mut table = ScoreTable::new(names(&["Name", "Total"]), vec![]);
        let err = mark_session(&mut table, &attendance(), "Session 1", &MarkerConfig::default())
            .unwrap_err();
        assert!(matches!(err, MarkError::NoRollColumn { .. }));
    }

    #[test]
    fn test_unknown_session() {
        let mut table = score_table();
        let before = table.clone();
        let err = mark_session(&mut table, &attendance(), "Session 9", &MarkerConfig::default())
            .unwrap_err();
        assert!(matches!(err, MarkError::UnknownSession(ref l) if l == "Session 9"));
        assert_eq!(table, before);
    }

    #[test]
    fn test_numeric_roll_cells_match() {
        let mut table = ScoreTable::new(
            names(&["Roll", "Total"]),
            vec![vec![Cell::Float(14.0), Cell::Empty]],
        );
        let stats =
            mark_session(&mut table, &attendance(), "Session 1", &MarkerConfig::default())
                .unwrap();
        assert_eq!(stats.present, 1);
        assert_eq!(table.get(0, 1), Some(&Cell::Int(10)));
    }
}
