//! Parquet cache of fetched bars, one file per ticker.
//!
//! Layout: `{cache_dir}/ticker={SYMBOL}/bars.parquet` plus a `meta.json`
//! sidecar. A screening run needs only a few months of history, so each
//! write replaces the whole file.
//!
//! - Atomic writes (write to `.tmp`, rename into place)
//! - Schema validation on load; corrupt files are quarantined
//! - Freshness check from the sidecar's `fetched_at`

use super::provider::{DataError, DataSource, RawBar};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const BARS_FILE: &str = "bars.parquet";
const META_FILE: &str = "meta.json";
const COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

/// Sidecar describing a cached ticker.
/// Calendar days a series may stop short of a requested date and still
/// count as reaching it: a weekend plus a short exchange holiday.
pub const MAX_TRADING_GAP_DAYS: i64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMeta {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub bar_count: usize,
    pub data_hash: String,
    pub source: DataSource,
    pub fetched_at: NaiveDateTime,
}

/// Cache status for one ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatus {
    pub symbol: String,
    pub cached: bool,
    pub end_date: Option<NaiveDate>,
    pub bar_count: Option<usize>,
    pub fetched_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone)]
pub struct ParquetCache {
    cache_dir: PathBuf,
}

impl ParquetCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn ticker_dir(&self, symbol: &str) -> PathBuf {
        self.cache_dir.join(format!("ticker={symbol}"))
    }

    /// Replace the cached bars for `symbol`.
    pub fn write(&self, symbol: &str, bars: &[RawBar], source: DataSource) -> Result<(), DataError> {
        let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
            return Err(DataError::CacheError("no bars to cache".into()));
        };

        let dir = self.ticker_dir(symbol);
        fs::create_dir_all(&dir)
            .map_err(|e| DataError::CacheError(format!("failed to create dir: {e}")))?;

        let path = dir.join(BARS_FILE);
        let tmp_path = path.with_extension("parquet.tmp");
        let mut df = bars_to_dataframe(bars)?;
        write_parquet(&mut df, &tmp_path)?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::CacheError(format!("atomic rename failed: {e}"))
        })?;

        let hash_input = serde_json::to_vec(bars)
            .map_err(|e| DataError::CacheError(format!("hash serialization: {e}")))?;
        let meta = CacheMeta {
            symbol: symbol.to_string(),
            start_date: first.date,
            end_date: last.date,
            bar_count: bars.len(),
            data_hash: blake3::hash(&hash_input).to_hex().to_string(),
            source,
            fetched_at: chrono::Local::now().naive_local(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::CacheError(format!("meta serialization: {e}")))?;
        fs::write(dir.join(META_FILE), meta_json)
            .map_err(|e| DataError::CacheError(format!("meta write: {e}")))?;
        Ok(())
    }

    /// Load cached bars, oldest first. A file that fails validation is
    /// renamed to `bars.parquet.quarantined` and reported as missing.
    pub fn load(&self, symbol: &str) -> Result<Vec<RawBar>, DataError> {
        let path = self.ticker_dir(symbol).join(BARS_FILE);
        if !path.is_file() {
            return Err(DataError::NoCachedData {
                symbol: symbol.to_string(),
            });
        }

        match load_and_validate_parquet(&path) {
            Ok(mut bars) => {
                bars.sort_by_key(|b| b.date);
                Ok(bars)
            }
            Err(e) => {
                tracing::warn!(symbol, error = %e, "quarantining corrupt cache file");
                let _ = fs::rename(&path, path.with_extension("parquet.quarantined"));
                let _ = fs::remove_file(self.ticker_dir(symbol).join(META_FILE));
                Err(DataError::NoCachedData {
                    symbol: symbol.to_string(),
                })
            }
        }
    }

    pub fn get_meta(&self, symbol: &str) -> Option<CacheMeta> {
        let content = fs::read_to_string(self.ticker_dir(symbol).join(META_FILE)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// True when the entry was fetched less than `max_age` ago and its range
    /// covers `start..=as_of`. Either edge may fall short by up to
    /// `MAX_TRADING_GAP_DAYS` (the first trading day after `start`, or no
    /// trading between the last bar and `as_of`); the trailing allowance
    /// only applies when the fetch happened after `as_of`.
    pub fn is_fresh(
        &self,
        symbol: &str,
        start: NaiveDate,
        as_of: NaiveDate,
        max_age: chrono::Duration,
    ) -> bool {
        let Some(meta) = self.get_meta(symbol) else {
            return false;
        };
        let gap = chrono::Duration::days(MAX_TRADING_GAP_DAYS);
        let age = chrono::Local::now().naive_local() - meta.fetched_at;
        let covers_start = meta.start_date <= start + gap;
        let covers_end = meta.end_date >= as_of
            || (meta.fetched_at.date() > as_of && meta.end_date + gap >= as_of);
        age <= max_age && covers_start && covers_end
    }

    pub fn status(&self, symbols: &[&str]) -> Vec<CacheStatus> {
        symbols
            .iter()
            .map(|sym| {
                let meta = self.get_meta(sym);
                CacheStatus {
                    symbol: sym.to_string(),
                    cached: meta.is_some(),
                    end_date: meta.as_ref().map(|m| m.end_date),
                    bar_count: meta.as_ref().map(|m| m.bar_count),
                    fetched_at: meta.as_ref().map(|m| m.fetched_at),
                }
            })
            .collect()
    }

    /// Every ticker with a cache directory, sorted.
    pub fn cached_symbols(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.cache_dir) else {
            return Vec::new();
        };
        let mut symbols: Vec<String> = entries
            .flatten()
            .filter_map(|e| {
                e.file_name()
                    .to_str()
                    .and_then(|n| n.strip_prefix("ticker="))
                    .map(String::from)
            })
            .collect();
        symbols.sort();
        symbols
    }
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

fn bars_to_dataframe(bars: &[RawBar]) -> Result<DataFrame, DataError> {
    let epoch = NaiveDate::default();
    let dates: Vec<i32> = bars
        .iter()
        .map(|b| (b.date - epoch).num_days() as i32)
        .collect();
    let opens: Vec<f64> = bars.iter().map(|b| b.open).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<u64> = bars.iter().map(|b| b.volume).collect();

    DataFrame::new(vec![
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| DataError::ParquetError(format!("date cast: {e}")))?,
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
    ])
    .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
}

fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<(), DataError> {
    let file =
        fs::File::create(path).map_err(|e| DataError::ParquetError(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(df)
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;
    Ok(())
}

fn load_and_validate_parquet(path: &Path) -> Result<Vec<RawBar>, DataError> {
    let file = fs::File::open(path).map_err(|e| DataError::ParquetError(format!("open: {e}")))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::ParquetError(format!("read: {e}")))?;

    if df.height() == 0 {
        return Err(DataError::CacheError("empty parquet file".into()));
    }
    for name in COLUMNS {
        if df.column(name).is_err() {
            return Err(DataError::CacheError(format!("missing column '{name}'")));
        }
    }
    dataframe_to_bars(&df)
}

fn dataframe_to_bars(df: &DataFrame) -> Result<Vec<RawBar>, DataError> {
    let col_err = |e: PolarsError| DataError::ParquetError(format!("column read: {e}"));

    let days = df
        .column("date")
        .map_err(col_err)?
        .cast(&DataType::Int32)
        .map_err(col_err)?;
    let days = days.i32().map_err(col_err)?;
    let opens = df.column("open").map_err(col_err)?.f64().map_err(col_err)?;
    let highs = df.column("high").map_err(col_err)?.f64().map_err(col_err)?;
    let lows = df.column("low").map_err(col_err)?.f64().map_err(col_err)?;
    let closes = df.column("close").map_err(col_err)?.f64().map_err(col_err)?;
    let volumes = df.column("volume").map_err(col_err)?.u64().map_err(col_err)?;

    let epoch = NaiveDate::default();
    (0..df.height())
        .map(|i| {
            let day = days
                .get(i)
                .ok_or_else(|| DataError::ParquetError(format!("null date at row {i}")))?;
            Ok(RawBar {
                date: epoch + chrono::Duration::days(day as i64),
                open: opens.get(i).unwrap_or(f64::NAN),
                high: highs.get(i).unwrap_or(f64::NAN),
                low: lows.get(i).unwrap_or(f64::NAN),
                close: closes.get(i).unwrap_or(f64::NAN),
                volume: volumes.get(i).unwrap_or(0),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bars() -> Vec<RawBar> {
        vec![
            RawBar {
                date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
                open: 830.0,
                high: 850.0,
                low: 828.0,
                close: 845.0,
                volume: 31_000_000,
            },
            RawBar {
                date: NaiveDate::from_ymd_opt(2024, 6, 4).unwrap(),
                open: 845.0,
                high: 856.0,
                low: 840.0,
                close: 842.0,
                volume: 28_000_000,
            },
        ]
    }

    #[test]
    fn write_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());

        cache.write("2330.TW", &sample_bars(), DataSource::YahooFinance).unwrap();
        let loaded = cache.load("2330.TW").unwrap();

        assert_eq!(loaded, sample_bars());
    }

    #[test]
    fn load_missing_is_no_cached_data() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        assert!(matches!(
            cache.load("2330.TW"),
            Err(DataError::NoCachedData { .. })
        ));
    }

    #[test]
    fn empty_write_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        assert!(cache.write("2330.TW", &[], DataSource::Csv).is_err());
    }

    #[test]
    fn meta_records_range_and_source() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        cache.write("2330.TW", &sample_bars(), DataSource::Csv).unwrap();

        let meta = cache.get_meta("2330.TW").unwrap();
        assert_eq!(meta.bar_count, 2);
        assert_eq!(meta.source, DataSource::Csv);
        assert_eq!(meta.end_date, NaiveDate::from_ymd_opt(2024, 6, 4).unwrap());
        assert_eq!(meta.data_hash.len(), 64);
    }

    #[test]
    fn corrupt_file_is_quarantined() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        let ticker_dir = dir.path().join("ticker=2330.TW");
        fs::create_dir_all(&ticker_dir).unwrap();
        fs::write(ticker_dir.join(BARS_FILE), b"not parquet").unwrap();

        assert!(cache.load("2330.TW").is_err());
        assert!(ticker_dir.join("bars.parquet.quarantined").exists());
        assert!(!ticker_dir.join(BARS_FILE).exists());
    }

    #[test]
    fn freshness_depends_on_age_and_range() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        cache.write("2330.TW", &sample_bars(), DataSource::YahooFinance).unwrap();

        let day = |d| NaiveDate::from_ymd_opt(2024, 6, d).unwrap();
        let max_age = chrono::Duration::hours(12);
        assert!(cache.is_fresh("2330.TW", day(3), day(4), max_age));
        assert!(!cache.is_fresh("2330.TW", day(3), day(4), chrono::Duration::seconds(-1)));
        assert!(!cache.is_fresh("2317.TW", day(3), day(4), max_age));

        // First bar within a long weekend of the requested start.
        assert!(cache.is_fresh("2330.TW", day(1), day(4), max_age));
    }

    #[test]
    fn cache_starting_after_requested_start_is_not_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        cache.write("2330.TW", &sample_bars(), DataSource::YahooFinance).unwrap();

        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 4).unwrap();
        assert!(!cache.is_fresh("2330.TW", start, as_of, chrono::Duration::hours(12)));
    }

    #[test]
    fn trailing_gap_only_tolerated_for_quiet_days() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        cache.write("2330.TW", &sample_bars(), DataSource::YahooFinance).unwrap();

        let day = |d| NaiveDate::from_ymd_opt(2024, 6, d).unwrap();
        let max_age = chrono::Duration::hours(12);
        // Fetched long after these dates: a 3-day gap means no trading.
        assert!(cache.is_fresh("2330.TW", day(3), day(7), max_age));
        // A month past the last bar is missing data, not a holiday.
        assert!(!cache.is_fresh("2330.TW", day(3), day(28), max_age));
    }

    #[test]
    fn status_and_listing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        cache.write("2330.TW", &sample_bars(), DataSource::YahooFinance).unwrap();

        let statuses = cache.status(&["2330.TW", "2317.TW"]);
        assert!(statuses[0].cached);
        assert!(!statuses[1].cached);
        assert_eq!(cache.cached_symbols(), vec!["2330.TW".to_string()]);
    }
}
