//! Tracing subscriber setup.
//!
//! Filter comes from `RUST_LOG` (default `warn`). The terminal dashboard owns
//! stdout/stderr while running, so it logs to a file instead.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::{AppError, EXIT_RUNTIME};

pub const TUI_LOG_FILE: &str = "brent-dash.log";

pub enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
}

pub fn init(target: LogTarget<'_>) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    // A subscriber may already be installed (e.g. by an embedding host); keep it.
    match target {
        LogTarget::Stderr => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
        LogTarget::File(path) => {
            let file = File::create(path).map_err(|e| {
                AppError::new(
                    EXIT_RUNTIME,
                    format!("Failed to create log file '{}': {e}", path.display()),
                )
            })?;
            let _ = builder.with_ansi(false).with_writer(Mutex::new(file)).try_init();
        }
    }
    Ok(())
}
