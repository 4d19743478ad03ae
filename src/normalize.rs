//! Roll-number and presence normalization shared by the loader and the marker.

use std::sync::LazyLock;

use regex::Regex;

use crate::table::Cell;

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid regex"));

/// Tokens that count as "present", compared trimmed and lowercased.
const PRESENT_TOKENS: &[&str] = &["p", "present", "yes", "y", "1", "attended", "true"];

/// Extracts the join key from a raw roll token: the first run of decimal
/// digits, parsed as an integer.
///
/// `"CS-014"` and `"014"` both yield `14`; `"absent"` yields `None`. A run
/// too long for `u64` also yields `None`.
pub fn roll_key(raw: &str) -> Option<u64> {
    DIGITS.find(raw).and_then(|m| m.as_str().parse().ok())
}

/// Roll key of a table cell. Numeric cells are rendered first, so `14.0`
/// and `"14"` resolve to the same key.
pub fn cell_roll_key(cell: &Cell) -> Option<u64> {
    match cell {
        Cell::Empty | Cell::Bool(_) => None,
        Cell::Float(v) if !v.is_finite() => None,
        other => roll_key(&other.to_string()),
    }
}

pub fn is_present_token(raw: &str) -> bool {
    let token = raw.trim().to_lowercase();
    PRESENT_TOKENS.contains(&token.as_str())
}

/// Presence flag of an attendance cell. A missing cell means absent.
pub fn is_present(cell: Option<&Cell>) -> bool {
    match cell {
        None | Some(Cell::Empty) => false,
        Some(Cell::Int(v)) => *v != 0,
        Some(Cell::Float(v)) => !v.is_nan() && *v != 0.0,
        Some(Cell::Bool(v)) => *v,
        Some(Cell::Text(s)) => is_present_token(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roll_key_examples() {
        assert_eq!(roll_key("CS-014"), Some(14));
        assert_eq!(roll_key("014"), Some(14));
        assert_eq!(roll_key("absent"), None);
        assert_eq!(roll_key(""), None);
    }

    #[test]
    fn test_roll_key_takes_first_run_only() {
        assert_eq!(roll_key("B21-007"), Some(21));
        assert_eq!(roll_key("  roll 3 of 40"), Some(3));
    }

    #[test]
    fn test_roll_key_overflow_is_unresolved() {
        assert_eq!(roll_key("123456789012345678901234567890"), None);
    }

    #[test]
    fn test_cell_roll_key() {
        assert_eq!(cell_roll_key(&Cell::Float(14.0)), Some(14));
        assert_eq!(cell_roll_key(&Cell::Int(14)), Some(14));
        assert_eq!(cell_roll_key(&Cell::Text("CS-014".into())), Some(14));
        assert_eq!(cell_roll_key(&Cell::Empty), None);
        assert_eq!(cell_roll_key(&Cell::Float(f64::NAN)), None);
    }

    #[test]
    fn test_presence_truthy() {
        assert!(is_present(Some(&Cell::Text("P".into()))));
        assert!(is_present(Some(&Cell::Text("Yes".into()))));
        assert!(is_present(Some(&Cell::Text("1".into()))));
        assert!(is_present(Some(&Cell::Float(1.0))));
        assert!(is_present(Some(&Cell::Text(" attended ".into()))));
        assert!(is_present(Some(&Cell::Bool(true))));
    }

    #[test]
    fn test_presence_falsy() {
        assert!(!is_present(Some(&Cell::Text("".into()))));
        assert!(!is_present(Some(&Cell::Text("0".into()))));
        assert!(!is_present(Some(&Cell::Int(0))));
        assert!(!is_present(Some(&Cell::Text("absent".into()))));
        assert!(!is_present(Some(&Cell::Text("A".into()))));
        assert!(!is_present(None));
    }
}
