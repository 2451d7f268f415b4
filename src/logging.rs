use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use indicatif::ProgressStyle;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Level;
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%F %T%.3f"))
    }
}

pub fn console_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

pub fn log_file_name(run_time: &DateTime<Local>) -> String {
    format!("{}_runlog.log", run_time.format("%Y%m%d_%H%M%S"))
}

pub fn copy_progress_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {wide_msg}",
    )
    .map(|style| style.progress_chars("#>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar())
}

fn scan_progress_style() -> ProgressStyle {
    ProgressStyle::with_template("{span_child_prefix}{spinner:.blue} {span_name} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Console output goes through the progress bar writer; the run log file gets
/// INFO and above without colors. Returns the log file path.
pub fn setup_logging(
    verbose: u8,
    log_dir: &Path,
    run_time: &DateTime<Local>,
) -> Result<PathBuf> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Cannot create log directory {}", log_dir.display()))?;
    let log_path = log_dir.join(log_file_name(run_time));
    let log_file = File::create(&log_path)
        .with_context(|| format!("Cannot create log file {}", log_path.display()))?;

    let indicatif_layer = IndicatifLayer::new().with_progress_style(scan_progress_style());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_timer(LocalTimer)
                .with_writer(indicatif_layer.get_stderr_writer())
                .with_filter(Targets::default().with_default(console_level(verbose))),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_timer(LocalTimer)
                .with_writer(Mutex::new(log_file))
                .with_filter(LevelFilter::INFO),
        )
        .with(indicatif_layer)
        .try_init()?;

    Ok(log_path)
}
