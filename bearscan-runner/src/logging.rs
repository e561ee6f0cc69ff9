//! Tracing subscriber setup.
//!
//! Noisy HTTP modules are pinned to `warn` so per-ticker logs stay
//! readable. `RUST_LOG`, when set, replaces the whole filter.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

/// Modules filtered to `warn` regardless of the base level.
pub const NOISY_MODULES: &[&str] = &["hyper", "hyper_util", "reqwest", "h2", "rustls", "polars"];

fn build_filter(level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let mut directives = level.to_ascii_lowercase();
    for module in NOISY_MODULES {
        directives.push_str(&format!(",{module}=warn"));
    }
    EnvFilter::new(directives)
}

/// Log to stderr in the given format. Safe to call more than once; later
/// calls are ignored.
pub fn init_logging(level: &str, format: LogFormat) {
    let subscriber = tracing_subscriber::registry().with(build_filter(level));

    match format {
        LogFormat::Json => {
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true)
                .with_writer(std::io::stderr);
            let _ = subscriber.with(layer).try_init();
        }
        LogFormat::Pretty => {
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(true)
                .with_target(false)
                .with_writer(std::io::stderr);
            let _ = subscriber.with(layer).try_init();
        }
    }

    tracing::debug!(level, ?format, "logging initialized");
}

/// Log to a file, appending. Used by the TUI, which owns the terminal.
pub fn init_file_logging(level: &str, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(Mutex::new(file));
    let _ = tracing_subscriber::registry()
        .with(build_filter(level))
        .with(layer)
        .try_init();

    tracing::info!(path = %path.display(), "logging initialized");
    Ok(())
}
