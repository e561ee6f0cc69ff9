//! One screening pass over a universe.
//!
//! Each ticker is loaded and evaluated independently on the rayon pool.
//! Per-ticker failures become exclusions; only cancellation or a pool
//! setup failure ends the pass early.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use bearscan_core::data::{
    CircuitBreaker, CsvProvider, DataError, DataProvider, DataSource, ParquetCache, YahooProvider,
};
use bearscan_core::{ScreenError, Screener, Verdict};
use rayon::prelude::*;
use thiserror::Error;

use crate::config::ScanConfig;
use crate::loader::{load_series, LoadOptions};
use crate::memo::SeriesMemo;
use crate::report::{Exclusion, ScanReport};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scan cancelled after {completed} of {total} tickers")]
    Cancelled { completed: usize, total: usize },

    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),
}

/// Progress update, sent once per finished ticker.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    pub symbol: String,
    pub completed: usize,
    pub total: usize,
}

/// Everything a pass needs besides the universe.
pub struct ScanContext {
    pub screener: Screener,
    pub cache: ParquetCache,
    pub provider: Option<Arc<dyn DataProvider>>,
    pub memo: Arc<SeriesMemo>,
    pub options: LoadOptions,
    /// Worker threads. 0 uses the rayon global pool.
    pub threads: usize,
}

impl ScanContext {
    pub fn new(config: &ScanConfig, provider: Option<Arc<dyn DataProvider>>) -> Self {
        Self {
            screener: Screener::new(config.criteria.clone()),
            cache: ParquetCache::new(&config.data.cache_dir),
            provider,
            memo: Arc::new(SeriesMemo::new()),
            options: config.load_options(),
            threads: config.scan.threads,
        }
    }

    /// Share a memo with another context (the TUI keeps one across runs).
    pub fn with_memo(mut self, memo: Arc<SeriesMemo>) -> Self {
        self.memo = memo;
        self
    }
}

/// The provider a configuration asks for: none when offline, the CSV
/// directory when `csv_dir` is set, Yahoo Finance otherwise.
pub fn build_provider(config: &ScanConfig) -> Result<Option<Arc<dyn DataProvider>>, DataError> {
    if config.data.offline {
        return Ok(None);
    }
    if let Some(dir) = &config.data.csv_dir {
        return Ok(Some(Arc::new(CsvProvider::new(dir))));
    }
    let breaker = Arc::new(CircuitBreaker::default_provider());
    Ok(Some(Arc::new(YahooProvider::new(breaker)?)))
}

struct TickerOutcome {
    symbol: String,
    source: Option<DataSource>,
    result: Result<Verdict, ScreenError>,
}

/// Run one pass over `symbols`.
///
/// Starts a fresh memo generation, so nothing loaded by an earlier pass is
/// reused. Duplicate symbols are evaluated once.
pub fn run_scan(
    symbols: &[String],
    ctx: &ScanContext,
    progress: Option<&(dyn Fn(&ScanProgress) + Sync)>,
    cancel: Option<&AtomicBool>,
) -> Result<ScanReport, ScanError> {
    let started = Instant::now();
    let run = ctx.memo.begin_run();
    let unique: Vec<&String> = symbols.iter().collect::<BTreeSet<_>>().into_iter().collect();
    let total = unique.len();
    let completed = AtomicUsize::new(0);

    tracing::info!(
        run,
        tickers = total,
        as_of = %ctx.options.as_of,
        offline = ctx.options.offline,
        "scan started"
    );

    let evaluate_one = |symbol: &&String| -> Option<TickerOutcome> {
        if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
            return None;
        }
        let outcome = scan_ticker(symbol, ctx);
        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(cb) = progress {
            cb(&ScanProgress {
                symbol: symbol.to_string(),
                completed: done,
                total,
            });
        }
        Some(outcome)
    };

    let outcomes: Vec<Option<TickerOutcome>> = if ctx.threads > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(ctx.threads)
            .build()
            .map_err(|e| ScanError::ThreadPool(e.to_string()))?;
        pool.install(|| unique.par_iter().map(evaluate_one).collect())
    } else {
        unique.par_iter().map(evaluate_one).collect()
    };

    if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
        let completed = completed.load(Ordering::Relaxed);
        tracing::info!(run, completed, total, "scan cancelled");
        return Err(ScanError::Cancelled { completed, total });
    }

    let mut verdicts = Vec::with_capacity(total);
    let mut exclusions = Vec::new();
    let mut sources = BTreeMap::new();
    for outcome in outcomes.into_iter().flatten() {
        if let Some(source) = outcome.source {
            sources.insert(outcome.symbol.clone(), source);
        }
        match outcome.result {
            Ok(verdict) => verdicts.push(verdict),
            Err(error) => exclusions.push(Exclusion {
                symbol: outcome.symbol,
                error,
            }),
        }
    }

    let report = ScanReport::new(
        ctx.options.as_of,
        run,
        verdicts,
        exclusions,
        sources,
        started.elapsed().as_millis() as u64,
    );
    let summary = report.summary();
    tracing::info!(
        run,
        candidates = summary.candidates,
        evaluated = summary.evaluated,
        excluded = summary.excluded,
        unavailable = summary.unavailable,
        elapsed_ms = report.elapsed_ms,
        "scan finished"
    );
    Ok(report)
}

fn scan_ticker(symbol: &str, ctx: &ScanContext) -> TickerOutcome {
    let loaded = load_series(
        symbol,
        &ctx.cache,
        ctx.provider.as_deref(),
        &ctx.memo,
        &ctx.options,
    );
    let (source, result) = match loaded {
        Ok(loaded) => (Some(loaded.source), ctx.screener.evaluate(&loaded.series)),
        Err(e) => (None, Err(ScreenError::from(e))),
    };

    if let Err(e) = &result {
        if e.is_fetch_failure() {
            tracing::warn!(symbol, error = %e, "ticker unavailable");
        } else {
            tracing::debug!(symbol, kind = e.kind(), error = %e, "ticker excluded");
        }
    }

    TickerOutcome {
        symbol: symbol.to_string(),
        source,
        result,
    }
}
