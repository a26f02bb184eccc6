use anyhow::{anyhow, Context, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const FILTER_ENV: &str = "STUDENT_DASHBOARD_LOG";

/// Send tracing output to a log file; the terminal belongs to the TUI.
///
/// The filter comes from `STUDENT_DASHBOARD_LOG` and defaults to `info`.
pub fn init() -> Result<PathBuf> {
    let path = log_path().ok_or_else(|| anyhow!("Could not determine cache directory"))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file at {}", path.display()))?;

    let filter = EnvFilter::try_from_env(FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))?;

    Ok(path)
}

fn log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("student-dashboard").join("dashboard.log"))
}
