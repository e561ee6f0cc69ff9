//! Series loading for the scan.
//!
//! Resolves one ticker to a `Series` with this fallback order:
//! 1. Already loaded during this run → reuse the memo entry
//! 2. Fresh cache entry covering the lookback window → use it
//! 3. Provider available and not offline → fetch, write through to cache
//! 4. Stale cache entry → use it, with a warning
//! 5. `synthetic` enabled → generate a deterministic random walk (tagged)
//! 6. Otherwise → fail; the scan records the ticker as unavailable
//!
//! Whatever the source, the series must reach `as_of`: a last bar more than
//! `MAX_TRADING_GAP_DAYS` earlier is rejected. When the fetch failed that is
//! reported as unavailable, otherwise as missing trailing bars.
//!
//! Synthetic data is a developer-only mode. Verdicts built on it are tagged
//! through `DataSource::Synthetic` in the report.

use std::sync::Arc;

use bearscan_core::data::{
    DataError, DataProvider, DataSource, ParquetCache, RawBar, MAX_TRADING_GAP_DAYS,
};
use bearscan_core::{ScreenError, Series};
use chrono::{Datelike, NaiveDate};
use thiserror::Error;

use crate::memo::SeriesMemo;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no cached data for '{symbol}' and running offline (use --synthetic for synthetic data)")]
    NoCachedDataOffline { symbol: String },

    #[error("no data for '{symbol}': {reason}")]
    Unavailable { symbol: String, reason: String },

    #[error(transparent)]
    Screen(#[from] ScreenError),
}

impl From<LoadError> for ScreenError {
    /// Load failures reach the screen as `DataUnavailable`. A series that
    /// loaded but is malformed keeps its own error.
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::Screen(inner) => inner,
            other => ScreenError::DataUnavailable {
                reason: other.to_string(),
            },
        }
    }
}

/// Options controlling how series are loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Last date of the series. Later bars (historical runs) are dropped.
    pub as_of: NaiveDate,
    /// Calendar days requested before `as_of`.
    pub lookback_days: u32,
    pub shares_per_lot: u64,
    /// Never make network requests.
    pub offline: bool,
    /// Generate synthetic bars when nothing else works.
    pub synthetic: bool,
    /// Cache entries older than this are refreshed when possible.
    pub max_cache_age: chrono::Duration,
}

impl LoadOptions {
    /// First date requested from the provider.
    pub fn start(&self) -> NaiveDate {
        self.as_of - chrono::Duration::days(i64::from(self.lookback_days))
    }
}

/// A loaded series and where it came from.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub series: Arc<Series>,
    pub source: DataSource,
}

/// Resolve one ticker to a series. See the module docs for the order.
pub fn load_series(
    symbol: &str,
    cache: &ParquetCache,
    provider: Option<&dyn DataProvider>,
    memo: &SeriesMemo,
    opts: &LoadOptions,
) -> Result<LoadedSeries, LoadError> {
    if let Some(hit) = memo.get(symbol) {
        return Ok(hit);
    }

    let resolved = resolve_raw(symbol, cache, provider, opts)?;
    let series =
        Series::from_raw(symbol, &resolved.bars, opts.shares_per_lot)?.truncate_to(opts.as_of);
    check_reaches_as_of(symbol, &series, resolved.fetch_error, opts.as_of)?;

    let loaded = LoadedSeries {
        series: Arc::new(series),
        source: resolved.source,
    };
    memo.insert(symbol, loaded.clone());
    Ok(loaded)
}

/// Reject a series whose last bar is too far before `as_of`. After a failed
/// fetch any such series (or an empty one) makes the ticker unavailable;
/// otherwise an empty series is left for the screen to report as too short.
fn check_reaches_as_of(
    symbol: &str,
    series: &Series,
    fetch_error: Option<DataError>,
    as_of: NaiveDate,
) -> Result<(), LoadError> {
    let last_bar = series.as_of();
    let max_gap = chrono::Duration::days(MAX_TRADING_GAP_DAYS);
    if last_bar.is_some_and(|last| as_of - last <= max_gap) {
        return Ok(());
    }

    if let Some(e) = fetch_error {
        let ends = last_bar.map_or_else(|| "is empty".to_string(), |d| format!("ends {d}"));
        return Err(LoadError::Unavailable {
            symbol: symbol.to_string(),
            reason: format!("{e}; cached series {ends}"),
        });
    }
    match last_bar {
        Some(last_bar) => {
            tracing::debug!(symbol, %last_bar, %as_of, "series stops short of as_of");
            Err(ScreenError::MissingTrailingBars { last_bar, as_of }.into())
        }
        None => Ok(()),
    }
}

struct Resolved {
    bars: Vec<RawBar>,
    source: DataSource,
    /// Set when the bars are a stale fallback after a failed fetch.
    fetch_error: Option<DataError>,
}

impl Resolved {
    fn new(bars: Vec<RawBar>, source: DataSource) -> Self {
        Self {
            bars,
            source,
            fetch_error: None,
        }
    }
}

fn resolve_raw(
    symbol: &str,
    cache: &ParquetCache,
    provider: Option<&dyn DataProvider>,
    opts: &LoadOptions,
) -> Result<Resolved, LoadError> {
    if cache.is_fresh(symbol, opts.start(), opts.as_of, opts.max_cache_age) {
        if let Ok(bars) = cache.load(symbol) {
            return Ok(Resolved::new(bars, DataSource::Cache));
        }
    }

    let mut fetch_error: Option<DataError> = None;
    if !opts.offline {
        if let Some(prov) = provider.filter(|p| p.is_available()) {
            match prov.fetch(symbol, opts.start(), opts.as_of) {
                Ok(fetched) => {
                    if let Err(e) = cache.write(symbol, &fetched.bars, fetched.source) {
                        tracing::warn!(symbol, error = %e, "cache write failed");
                    }
                    return Ok(Resolved::new(fetched.bars, fetched.source));
                }
                Err(e) => {
                    tracing::debug!(symbol, provider = prov.name(), error = %e, "fetch failed");
                    fetch_error = Some(e);
                }
            }
        } else if provider.is_some() {
            fetch_error = Some(DataError::CircuitBreakerOpen);
        }
    }

    if let Ok(bars) = cache.load(symbol) {
        tracing::warn!(symbol, "using stale cache entry");
        return Ok(Resolved {
            bars,
            source: DataSource::Cache,
            fetch_error,
        });
    }

    if opts.synthetic {
        tracing::warn!(symbol, "generating synthetic data; verdict is tagged synthetic");
        return Ok(Resolved::new(
            generate_synthetic_bars(symbol, opts.start(), opts.as_of),
            DataSource::Synthetic,
        ));
    }

    if opts.offline {
        return Err(LoadError::NoCachedDataOffline {
            symbol: symbol.to_string(),
        });
    }
    Err(LoadError::Unavailable {
        symbol: symbol.to_string(),
        reason: fetch_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "not cached and no provider configured".into()),
    })
}

/// Generate synthetic bars for development.
///
/// A weekday-only random walk seeded from the symbol, so the same ticker
/// always produces the same bars. Volume is in shares, like provider data.
pub fn generate_synthetic_bars(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<RawBar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::new();
    let mut price: f64 = rng.gen_range(20.0..900.0);
    let mut current = start;

    while current <= end {
        let weekday = current.weekday();
        if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.04..0.04);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..12_000_000u64);

        bars.push(RawBar {
            date: current,
            open,
            high,
            low,
            close,
            volume,
        });

        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}
