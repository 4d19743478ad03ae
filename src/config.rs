//! Run configuration: rubric, column names and the attendance layout.
//!
//! Everything has a built-in default. A JSON file may override any subset:
//! ```json
//! {
//!   "rubric": [
//!     { "name": "Timely completion, punctuality", "points": 2 },
//!     { "name": "Oral Presentation", "points": 8 }
//!   ],
//!   "layout": { "session_count": 6 }
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::MarkError;

/// One graded parameter and the points awarded for attending.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RubricItem {
    pub name: String,
    pub points: i64,
}

/// Ordered rubric. Order decides where missing columns are appended.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Rubric {
    pub items: Vec<RubricItem>,
}

impl Rubric {
    pub fn total_points(&self) -> i64 {
        self.items.iter().map(|i| i.points).sum()
    }
}

impl Default for Rubric {
    fn default() -> Self {
        let items = [
            ("Timely completion, punctuality", 2),
            ("Performance, involvement, efficiency", 4),
            ("Oral Presentation", 3),
            ("Documentation, neatness", 1),
        ]
        .into_iter()
        .map(|(name, points)| RubricItem {
            name: name.to_string(),
            points,
        })
        .collect();
        Self { items }
    }
}

/// Where presence cells sit in an attendance row.
///
/// Session `n` (1-based) is read from column
/// `presence_offset + (n - 1) * session_stride`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionLayout {
    pub session_count: u32,
    pub presence_offset: usize,
    pub session_stride: usize,
    pub label_prefix: String,
}

impl Default for SessionLayout {
    fn default() -> Self {
        Self {
            session_count: 4,
            presence_offset: 3,
            session_stride: 2,
            label_prefix: "Session ".to_string(),
        }
    }
}

impl SessionLayout {
    pub fn label(&self, session: u32) -> String {
        format!("{}{}", self.label_prefix, session)
    }

    pub fn presence_column(&self, session: u32) -> usize {
        self.presence_offset + (session as usize).saturating_sub(1) * self.session_stride
    }

    pub fn labels(&self) -> impl Iterator<Item = (u32, String)> + '_ {
        (1..=self.session_count).map(|n| (n, self.label(n)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub rubric: Rubric,
    pub total_column: String,
    pub roll_aliases: Vec<String>,
    pub layout: SessionLayout,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            rubric: Rubric::default(),
            total_column: "Total".to_string(),
            roll_aliases: ["Roll", "Roll No", "Roll No.", "RollNumber"]
                .into_iter()
                .map(String::from)
                .collect(),
            layout: SessionLayout::default(),
        }
    }
}

impl MarkerConfig {
    /// Loads the config from a JSON file at `path` and validates it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config '{}'", path.display()))?;
        let config: MarkerConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing config '{}'", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MarkError> {
        if self.rubric.items.is_empty() {
            return Err(MarkError::InvalidConfig("rubric is empty".into()));
        }
        let mut seen = HashSet::new();
        for item in &self.rubric.items {
            if !seen.insert(item.name.as_str()) {
                return Err(MarkError::InvalidConfig(format!(
                    "duplicate rubric parameter '{}'",
                    item.name
                )));
            }
            if item.name == self.total_column {
                return Err(MarkError::InvalidConfig(format!(
                    "rubric parameter '{}' collides with the total column",
                    item.name
                )));
            }
        }
        if self.layout.session_stride == 0 {
            return Err(MarkError::InvalidConfig("session_stride must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rubric_totals_ten() {
        let config = MarkerConfig::default();
        assert_eq!(config.rubric.items.len(), 4);
        assert_eq!(config.rubric.total_points(), 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_layout_columns() {
        let layout = SessionLayout::default();
        assert_eq!(layout.presence_column(1), 3);
        assert_eq!(layout.presence_column(2), 5);
        assert_eq!(layout.presence_column(4), 9);
        assert_eq!(layout.label(3), "Session 3");
        assert_eq!(layout.labels().count(), 4);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: MarkerConfig =
            serde_json::from_str(r#"{ "layout": { "session_count": 6 } }"#).unwrap();

        assert_eq!(config.layout.session_count, 6);
        assert_eq!(config.layout.session_stride, 2);
        assert_eq!(config.total_column, "Total");
        assert_eq!(config.rubric, Rubric::default());
    }

    #[test]
    fn test_rubric_order_is_kept() {
        let config: MarkerConfig = serde_json::from_str(
            r#"{ "rubric": [ { "name": "B", "points": 5 }, { "name": "A", "points": 1 } ] }"#,
        )
        .unwrap();

        let names = config
            .rubric
            .items
            .iter()
            .map(|i| i.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(config.rubric.total_points(), 6);
    }

    #[test]
    fn test_validate_rejects_bad_configs() {
        let mut config = MarkerConfig::default();
        config.rubric.items.clear();
        assert!(matches!(config.validate(), Err(MarkError::InvalidConfig(_))));

        let mut config = MarkerConfig::default();
        config.layout.session_stride = 0;
        assert!(config.validate().is_err());

        let mut config = MarkerConfig::default();
        let dup = config.rubric.items[0].clone();
        config.rubric.items.push(dup);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("marker.json");
        std::fs::write(&path, r#"{ "total_column": "Score" }"#).unwrap();

        let config = MarkerConfig::load(&path).unwrap();
        assert_eq!(config.total_column, "Score");
    }
}
