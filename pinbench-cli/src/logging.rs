//! Logging setup
//!
//! Two sinks: the per-run log file receives everything at debug level,
//! the console (stderr) shows info, or debug with `--verbose`.
//! `RUST_LOG` overrides the console filter.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

fn console_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "info" })
    })
}

/// Console-only logging, used for listing and dry runs.
pub fn init_console(verbose: bool) {
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(console_filter(verbose));
    // A subscriber may already be installed (tests, embedding)
    let _ = tracing_subscriber::registry().with(console).try_init();
}

/// Console plus the run log at `log_path`.
pub fn init_with_file(log_path: &Path, verbose: bool) -> anyhow::Result<()> {
    let file = File::create(log_path)?;
    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_filter(LevelFilter::DEBUG);
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(console_filter(verbose));
    let _ = tracing_subscriber::registry()
        .with(file_layer)
        .with(console)
        .try_init();
    Ok(())
}
