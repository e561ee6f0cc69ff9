//! Data provider trait and structured error types.
//!
//! `DataProvider` abstracts over sources (Yahoo Finance, CSV directory) so
//! the runner can swap them and tests can run without a network.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Daily bar as delivered by a provider. Volume is in shares.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Fetch and cache failures. The runner folds every one of these into
/// `ScreenError::DataUnavailable` before the screen runs.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("provider blocked: circuit breaker open")]
    CircuitBreakerOpen,

    #[error("no cached data for '{symbol}'")]
    NoCachedData { symbol: String },

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("csv error: {0}")]
    CsvError(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Bars returned for one symbol, tagged with their origin.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub bars: Vec<RawBar>,
    pub source: DataSource,
}

/// Where a series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    Csv,
    Cache,
    Synthetic,
}

impl DataSource {
    pub fn label(self) -> &'static str {
        match self {
            DataSource::YahooFinance => "yahoo",
            DataSource::Csv => "csv",
            DataSource::Cache => "cache",
            DataSource::Synthetic => "synthetic",
        }
    }
}

/// A source of daily OHLCV history.
///
/// Providers do not know about the cache; the runner sits above both.
pub trait DataProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch daily bars for `symbol` between `start` and `end` inclusive,
    /// oldest first.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<FetchResult, DataError>;

    /// False while the provider is refusing requests (breaker open).
    fn is_available(&self) -> bool;
}

/// Per-ticker hooks for `download_symbols`. `index` is zero-based.
pub trait DownloadProgress: Send + Sync {
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    fn on_complete(&self, symbol: &str, index: usize, total: usize, result: &Result<(), DataError>);

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Line-per-ticker progress for the CLI.
pub struct StdoutProgress;

impl DownloadProgress for StdoutProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        print!("{:>4}/{total} {symbol:<10} ", index + 1);
    }

    fn on_complete(&self, _symbol: &str, _index: usize, _total: usize, result: &Result<(), DataError>) {
        match result {
            Ok(()) => println!("ok"),
            Err(e) => println!("failed ({e})"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        println!("{succeeded} of {total} tickers cached, {failed} failed");
    }
}
