//! bearscan runner: turns a universe and a configuration into a scan report.
//!
//! This crate builds on `bearscan-core` to provide:
//! - TOML scan configuration with validation
//! - Series loading with memo/cache/download/synthetic fallback
//! - A per-run series memo, invalidated at the start of every pass
//! - The parallel scan over a universe, with progress and cancellation
//! - Reports: candidate ordering, notices, CSV and JSON export
//! - Logging initialisation shared by the binaries

pub mod config;
pub mod loader;
pub mod logging;
pub mod memo;
pub mod report;
pub mod scan;

pub use config::{ConfigError, LogFormat, ScanConfig, SortKey};
pub use loader::{generate_synthetic_bars, load_series, LoadError, LoadOptions, LoadedSeries};
pub use memo::SeriesMemo;
pub use report::{Exclusion, ExportError, Notice, ScanReport, ScanSummary};
pub use scan::{build_provider, run_scan, ScanContext, ScanError, ScanProgress};
