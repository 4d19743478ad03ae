//! Finds `experiment_<N>.<ext>` score files in a directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::table::TableFormat;

const PREFIX: &str = "experiment_";

/// How a single file name relates to the `experiment_<N>` pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    Match { session: u32, format: TableFormat },
    /// Not a score file; ignored silently.
    Skip,
    /// Looks like a score file but `<N>` is not a number.
    BadNumber(String),
}

/// A score file to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreFile {
    pub path: PathBuf,
    pub file_name: String,
    pub session: u32,
    pub format: TableFormat,
}

impl ScoreFile {
    /// File name the marked table is saved under. Legacy `.xls` workbooks
    /// are saved as `.xlsx` next to the original.
    pub fn output_file_name(&self) -> String {
        let output = self.format.output_format();
        if output == self.format {
            return self.file_name.clone();
        }
        Path::new(&self.file_name)
            .with_extension(output.extension())
            .to_string_lossy()
            .into_owned()
    }
}

/// Result of scanning the experiments directory.
#[derive(Debug, Default)]
pub struct Discovered {
    /// Score files, sorted by file name.
    pub files: Vec<ScoreFile>,
    /// Names that look like score files but carry no session number.
    pub bad_names: Vec<String>,
}

/// Classifies a file name. The prefix and extension match case-insensitively;
/// the session number is the stem segment after `experiment_`, up to the
/// next `_`.
pub fn parse_experiment_name(file_name: &str) -> Discovery {
    let path = Path::new(file_name);
    let Some(format) = TableFormat::from_path(path) else {
        return Discovery::Skip;
    };
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return Discovery::Skip;
    };
    let Some(rest) = stem
        .get(..PREFIX.len())
        .filter(|head| head.eq_ignore_ascii_case(PREFIX))
        .and_then(|_| stem.get(PREFIX.len()..))
    else {
        return Discovery::Skip;
    };

    let segment = rest.split('_').next().unwrap_or_default();
    match segment.parse::<u32>() {
        Ok(session) => Discovery::Match { session, format },
        Err(_) => Discovery::BadNumber(segment.to_string()),
    }
}

/// Scans `dir` for score files.
pub fn discover(dir: &Path) -> Result<Discovered> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("reading experiments directory '{}'", dir.display()))?;

    let mut found = Discovered::default();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };

        match parse_experiment_name(&file_name) {
            Discovery::Match { session, format } => found.files.push(ScoreFile {
                path,
                file_name,
                session,
                format,
            }),
            Discovery::Skip => debug!(file = %file_name, "Not a score file"),
            Discovery::BadNumber(segment) => {
                warn!(file = %file_name, segment = %segment, "Skipping file due to unexpected naming");
                found.bad_names.push(file_name);
            }
        }
    }

    found.files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    found.bad_names.sort();
    Ok(found)
}
