//! Tracing subscriber setup
//!
//! File-based logging with environment-based filtering (RUST_LOG, default
//! INFO). Logs must go to a file, never stderr: the terminal is owned by
//! the TUI while the editor runs.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global tracing subscriber writing to `log_file_path`.
pub fn init_global(log_file_path: &Path) -> Result<()> {
    if let Some(parent) = log_file_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let log_file = File::create(log_file_path)
        .with_context(|| format!("creating log file {}", log_file_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(env_filter)
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .init();

    Ok(())
}

/// Default log file location (`<data dir>/quill/quill.log`).
pub fn default_log_path() -> std::path::PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("quill")
        .join("quill.log")
}
