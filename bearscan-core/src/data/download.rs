//! Download orchestrator: fetch a list of tickers into the cache.

use super::cache::ParquetCache;
use super::provider::{DataError, DataProvider, DownloadProgress};
use chrono::NaiveDate;

/// What to download and when to skip.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Re-fetch even when the cache is fresh.
    pub force: bool,
    /// Cached data younger than this that reaches `end` is kept.
    pub max_age: chrono::Duration,
}

#[derive(Debug)]
pub struct DownloadSummary {
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<(String, DataError)>,
}

impl DownloadSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Fetch each symbol sequentially and write it to the cache.
///
/// Stops early once the provider reports itself unavailable; the remaining
/// symbols are recorded as failed with `CircuitBreakerOpen`.
pub fn download_symbols(
    provider: &dyn DataProvider,
    cache: &ParquetCache,
    symbols: &[&str],
    request: &DownloadRequest,
    progress: &dyn DownloadProgress,
) -> DownloadSummary {
    let total = symbols.len();
    let mut summary = DownloadSummary {
        total,
        succeeded: 0,
        skipped: 0,
        failed: 0,
        errors: Vec::new(),
    };

    for (i, symbol) in symbols.iter().enumerate() {
        progress.on_start(symbol, i, total);

        if !request.force && cache.is_fresh(symbol, request.start, request.end, request.max_age) {
            progress.on_complete(symbol, i, total, &Ok(()));
            summary.succeeded += 1;
            summary.skipped += 1;
            continue;
        }

        let result = provider
            .fetch(symbol, request.start, request.end)
            .and_then(|fetched| cache.write(symbol, &fetched.bars, fetched.source));
        progress.on_complete(symbol, i, total, &result);

        match result {
            Ok(()) => summary.succeeded += 1,
            Err(e) => {
                tracing::warn!(symbol, error = %e, "download failed");
                summary.errors.push((symbol.to_string(), e));
                summary.failed += 1;
            }
        }

        if !provider.is_available() {
            for sym in &symbols[(i + 1)..] {
                summary
                    .errors
                    .push((sym.to_string(), DataError::CircuitBreakerOpen));
                summary.failed += 1;
            }
            break;
        }
    }

    progress.on_batch_complete(summary.succeeded, summary.failed, total);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::{DataSource, FetchResult, RawBar};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeProvider {
        calls: AtomicUsize,
        fail_on: Option<&'static str>,
        block_after: usize,
    }

    impl DataProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        fn fetch(
            &self,
            symbol: &str,
            start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<FetchResult, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on == Some(symbol) {
                return Err(DataError::NetworkUnreachable("down".into()));
            }
            Ok(FetchResult {
                symbol: symbol.to_string(),
                bars: vec![RawBar {
                    date: start,
                    open: 10.0,
                    high: 11.0,
                    low: 9.0,
                    close: 10.5,
                    volume: 5_000_000,
                }],
                source: DataSource::Synthetic,
            })
        }

        fn is_available(&self) -> bool {
            self.calls.load(Ordering::SeqCst) < self.block_after
        }
    }

    struct Silent;
    impl DownloadProgress for Silent {
        fn on_start(&self, _: &str, _: usize, _: usize) {}
        fn on_complete(&self, _: &str, _: usize, _: usize, _: &Result<(), DataError>) {}
        fn on_batch_complete(&self, _: usize, _: usize, _: usize) {}
    }

    fn request(force: bool) -> DownloadRequest {
        let day = chrono::Local::now().date_naive();
        DownloadRequest {
            start: day,
            end: day,
            force,
            max_age: chrono::Duration::hours(12),
        }
    }

    #[test]
    fn downloads_and_records_failures() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        let provider = FakeProvider {
            calls: AtomicUsize::new(0),
            fail_on: Some("2317.TW"),
            block_after: usize::MAX,
        };

        let summary = download_symbols(
            &provider,
            &cache,
            &["2330.TW", "2317.TW", "2454.TW"],
            &request(false),
            &Silent,
        );
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors[0].0, "2317.TW");
        assert!(cache.load("2454.TW").is_ok());
    }

    #[test]
    fn fresh_cache_is_skipped_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        let provider = FakeProvider {
            calls: AtomicUsize::new(0),
            fail_on: None,
            block_after: usize::MAX,
        };

        download_symbols(&provider, &cache, &["2330.TW"], &request(false), &Silent);
        let second = download_symbols(&provider, &cache, &["2330.TW"], &request(false), &Silent);
        assert_eq!(second.skipped, 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        download_symbols(&provider, &cache, &["2330.TW"], &request(true), &Silent);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unavailable_provider_stops_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        let provider = FakeProvider {
            calls: AtomicUsize::new(0),
            fail_on: None,
            block_after: 1,
        };

        let summary = download_symbols(
            &provider,
            &cache,
            &["2330.TW", "2317.TW", "2454.TW"],
            &request(false),
            &Silent,
        );
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 2);
        assert!(matches!(summary.errors[0].1, DataError::CircuitBreakerOpen));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }
}
