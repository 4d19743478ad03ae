//! The whole run: load attendance once, then mark every score file in turn.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::attendance::Attendance;
use crate::config::MarkerConfig;
use crate::discover::{ScoreFile, discover};
use crate::error::MarkError;
use crate::marker::{MarkStats, mark_session};
use crate::output::{ProcessingRecord, append_record};
use crate::table::{read_table, write_table};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub attendance: PathBuf,
    pub experiments_dir: PathBuf,
    /// Overwrite inputs in place when `None`.
    pub output_dir: Option<PathBuf>,
    /// Optional CSV ledger to append one row per file to.
    pub summary: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub failed: usize,
    /// Files named like score files whose session number did not parse.
    pub skipped: usize,
}

/// Reads one score table, marks it for `label` and writes it to `out_path`.
#[tracing::instrument(skip(attendance, config), fields(file = %path.display(), session = label))]
pub fn process_file(
    path: &Path,
    out_path: &Path,
    attendance: &Attendance,
    label: &str,
    config: &MarkerConfig,
) -> Result<MarkStats> {
    let mut table = read_table(path)?;
    let stats = mark_session(&mut table, attendance, label, config)?;
    write_table(&table, out_path)?;
    Ok(stats)
}

/// Where a score file's result goes: a same-named file in `output_dir`,
/// or the input path itself. A legacy `.xls` input is saved as `.xlsx`
/// in either place.
pub fn destination(file: &ScoreFile, output_dir: Option<&Path>) -> PathBuf {
    let file_name = file.output_file_name();
    match output_dir {
        Some(dir) => dir.join(file_name),
        None => file.path.with_file_name(file_name),
    }
}

/// Runs the whole batch.
///
/// # Errors
///
/// Fails before touching any score file if the config is invalid, the
/// attendance sheet is missing or has no header, or the experiments
/// directory cannot be listed. Failures on individual score files are
/// logged and counted instead.
pub fn run(options: &RunOptions, config: &MarkerConfig) -> Result<RunSummary> {
    config.validate()?;
    let attendance = Attendance::load(&options.attendance, &config.layout)?;

    let discovered = discover(&options.experiments_dir)?;
    info!(
        dir = %options.experiments_dir.display(),
        files = discovered.files.len(),
        skipped = discovered.bad_names.len(),
        rubric_points = config.rubric.total_points(),
        "Score files discovered"
    );

    if let Some(dir) = &options.output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory '{}'", dir.display()))?;
    }

    let mut summary = RunSummary {
        skipped: discovered.bad_names.len(),
        ..RunSummary::default()
    };
    for file in &discovered.files {
        let label = config.layout.label(file.session);
        let out_path = destination(file, options.output_dir.as_deref());
        if file.format.output_format() != file.format {
            info!(file = %file.file_name, destination = %out_path.display(), "Saving legacy workbook as xlsx");
        }

        let record = match process_file(&file.path, &out_path, &attendance, &label, config) {
            Ok(stats) => {
                summary.processed += 1;
                info!(
                    file = %file.file_name,
                    session = %label,
                    destination = %out_path.display(),
                    present = stats.present,
                    absent = stats.absent,
                    unmatched = stats.unmatched,
                    "Processed score sheet"
                );
                ProcessingRecord::from_stats(&file.file_name, &label, &out_path, &stats)
            }
            Err(e) => {
                summary.failed += 1;
                let message = format!("{e:#}");
                warn!(file = %file.file_name, error = %message, "Error processing file");
                let kind = e
                    .downcast_ref::<MarkError>()
                    .map_or("processing_error", MarkError::kind);
                ProcessingRecord::from_error(&file.file_name, &label, kind, &message)
            }
        };

        if let Some(ledger) = &options.summary {
            if let Err(e) = append_record(ledger, &record) {
                warn!(ledger = %ledger.display(), error = %e, "Failed to append ledger record");
            }
        }
    }

    info!(
        processed = summary.processed,
        failed = summary.failed,
        skipped = summary.skipped,
        "Finished processing score files"
    );
    Ok(summary)
}
