//! Scan configuration, loaded from TOML.
//!
//! Every section and field has a default, so an empty file (or no file) is
//! a valid configuration. CLI flags override individual fields after load.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use bearscan_core::ScreenCriteria;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::loader::LoadOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration for one scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub scan: ScanSection,
    pub criteria: ScreenCriteria,
    pub data: DataSection,
    pub output: OutputSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSection {
    /// Calendar days of history requested from the provider.
    pub lookback_days: u32,
    /// Provider volume is in shares; the screen works in lots.
    pub shares_per_lot: u64,
    /// Worker threads for the scan. 0 uses the rayon global pool.
    pub threads: usize,
    /// Evaluate as of this date instead of today.
    pub as_of: Option<NaiveDate>,
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            lookback_days: 90,
            shares_per_lot: 1_000,
            threads: 0,
            as_of: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    pub cache_dir: PathBuf,
    /// Read `{SYMBOL}.csv` files from here instead of calling Yahoo.
    pub csv_dir: Option<PathBuf>,
    pub offline: bool,
    pub synthetic: bool,
    pub max_cache_age_hours: u64,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("data"),
            csv_dir: None,
            offline: false,
            synthetic: false,
            max_cache_age_hours: 12,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub sort: SortKey,
    /// Keep only the first N candidates after sorting. 0 keeps all.
    pub top: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Candidate table ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Ticker symbol, ascending.
    #[default]
    Symbol,
    /// Deviation above MA20, largest first.
    Deviation,
    /// Bear score, highest first.
    Score,
}

impl SortKey {
    pub const ALL: [SortKey; 3] = [SortKey::Symbol, SortKey::Deviation, SortKey::Score];

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Symbol => "symbol",
            SortKey::Deviation => "deviation",
            SortKey::Score => "score",
        }
    }

    /// Next key in display order, wrapping.
    pub fn next(self) -> Self {
        match self {
            SortKey::Symbol => SortKey::Deviation,
            SortKey::Deviation => SortKey::Score,
            SortKey::Score => SortKey::Symbol,
        }
    }
}

impl FromStr for SortKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|k| k.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "unknown sort key '{s}' (expected symbol, deviation or score)"
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::Invalid(format!(
                "unknown log format '{other}' (expected pretty or json)"
            ))),
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl ScanConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ScanConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.criteria;
        if c.short_window == 0 || c.long_window == 0 {
            return Err(ConfigError::Invalid(
                "moving-average windows must be at least 1 bar".into(),
            ));
        }
        if c.short_window >= c.long_window {
            return Err(ConfigError::Invalid(format!(
                "short_window ({}) must be shorter than long_window ({})",
                c.short_window, c.long_window
            )));
        }
        if !c.min_deviation.is_finite() || c.min_deviation < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "min_deviation must be a non-negative number, got {}",
                c.min_deviation
            )));
        }
        if self.scan.shares_per_lot == 0 {
            return Err(ConfigError::Invalid("shares_per_lot must be positive".into()));
        }
        if self.scan.lookback_days == 0 {
            return Err(ConfigError::Invalid("lookback_days must be positive".into()));
        }
        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "unknown log level '{}' (expected one of {})",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }

    /// The evaluation date: configured, or today's local date.
    pub fn as_of(&self) -> NaiveDate {
        self.scan
            .as_of
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    pub fn max_cache_age(&self) -> chrono::Duration {
        chrono::Duration::hours(self.data.max_cache_age_hours.min(i64::MAX as u64) as i64)
    }

    /// Loader options derived from this configuration.
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            as_of: self.as_of(),
            lookback_days: self.scan.lookback_days,
            shares_per_lot: self.scan.shares_per_lot,
            offline: self.data.offline,
            synthetic: self.data.synthetic,
            max_cache_age: self.max_cache_age(),
        }
    }
}
