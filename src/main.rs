//! CLI entry point for the attendance marker.
//!
//! Loads one attendance sheet and rewrites the rubric marks of every
//! `experiment_<N>` score sheet in a directory.

use anyhow::Result;
use attendance_marker::config::MarkerConfig;
use attendance_marker::pipeline::{RunOptions, run};
use clap::Parser;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{
    EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "attendance-marker")]
#[command(
    about = "Apply attendance-based marks to experiment sheets using roll number matching",
    long_about = None
)]
struct Cli {
    /// Path to the attendance CSV file
    #[arg(long, env = "ATTENDANCE_FILE")]
    attendance: PathBuf,

    /// Directory containing experiment_1.xlsx, experiment_2.csv, ...
    #[arg(long, env = "EXPERIMENTS_DIR")]
    experiments_dir: PathBuf,

    /// Directory to write updated sheets to (overwrites originals if omitted)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// JSON file overriding the rubric, column names or attendance layout
    #[arg(short, long, env = "MARKER_CONFIG")]
    config: Option<PathBuf>,

    /// CSV file to append one result row per processed sheet to
    #[arg(long)]
    summary: Option<PathBuf>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/attendance_marker.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("attendance_marker.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter("RUST_LOG", "info")?);

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(env_filter("RUST_LOG_JSON", "debug")?);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            info!(path = %path.display(), "Loading marker config");
            MarkerConfig::load(path)?
        }
        None => MarkerConfig::default(),
    };
    debug!(?config, "Effective configuration");

    let options = RunOptions {
        attendance: cli.attendance,
        experiments_dir: cli.experiments_dir,
        output_dir: cli.output_dir,
        summary: cli.summary,
    };
    run(&options, &config)?;

    Ok(())
}

/// Filter from `var`, falling back to `default` as the base directive.
fn env_filter(var: &str, default: &str) -> Result<EnvFilter> {
    Ok(EnvFilter::from_env(var).add_directive(default.parse()?))
}
