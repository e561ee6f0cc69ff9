//! Scan results: verdicts, exclusions, notices and export.
//!
//! A `ScanReport` holds one entry per ticker in the universe: either a
//! `Verdict` or an `Exclusion`. Both lists are kept sorted by symbol so
//! every rendering starts from a stable order.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use bearscan_core::data::DataSource;
use bearscan_core::{ScreenError, Verdict};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SortKey;

/// More than this fraction of the universe unavailable triggers a notice.
pub const UNAVAILABLE_NOTICE_FRACTION: f64 = 0.5;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A ticker left out of the verdicts, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exclusion {
    pub symbol: String,
    pub error: ScreenError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Evaluation date requested for the run.
    pub as_of: NaiveDate,
    /// Memo generation of the run that produced this report.
    pub run: u64,
    pub universe_size: usize,
    pub verdicts: Vec<Verdict>,
    pub exclusions: Vec<Exclusion>,
    /// Where each loaded series came from.
    pub sources: BTreeMap<String, DataSource>,
    pub elapsed_ms: u64,
}

/// Counts for the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total: usize,
    pub evaluated: usize,
    pub candidates: usize,
    pub excluded: usize,
    pub unavailable: usize,
    pub synthetic: usize,
}

/// Conditions worth surfacing to the user after a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    NoCandidates,
    MostlyUnavailable { unavailable: usize, total: usize },
    SyntheticData { count: usize },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::NoCandidates => write!(f, "no tickers met every condition"),
            Notice::MostlyUnavailable { unavailable, total } => write!(
                f,
                "{unavailable} of {total} tickers could not be fetched; results are incomplete"
            ),
            Notice::SyntheticData { count } => {
                write!(f, "{count} tickers used synthetic data; verdicts are not real")
            }
        }
    }
}

impl ScanReport {
    /// Build a report, sorting both lists by symbol.
    pub fn new(
        as_of: NaiveDate,
        run: u64,
        mut verdicts: Vec<Verdict>,
        mut exclusions: Vec<Exclusion>,
        sources: BTreeMap<String, DataSource>,
        elapsed_ms: u64,
    ) -> Self {
        verdicts.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        exclusions.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Self {
            as_of,
            run,
            universe_size: verdicts.len() + exclusions.len(),
            verdicts,
            exclusions,
            sources,
            elapsed_ms,
        }
    }

    /// Passing verdicts in `sort` order, truncated to `top` (0 keeps all).
    pub fn candidates(&self, sort: SortKey, top: usize) -> Vec<&Verdict> {
        let mut rows: Vec<&Verdict> = self.verdicts.iter().filter(|v| v.candidate).collect();
        sort_verdicts(&mut rows, sort);
        if top > 0 {
            rows.truncate(top);
        }
        rows
    }

    /// Every verdict, passing or not, in `sort` order.
    pub fn all_verdicts(&self, sort: SortKey) -> Vec<&Verdict> {
        let mut rows: Vec<&Verdict> = self.verdicts.iter().collect();
        sort_verdicts(&mut rows, sort);
        rows
    }

    pub fn verdict(&self, symbol: &str) -> Option<&Verdict> {
        self.verdicts.iter().find(|v| v.symbol == symbol)
    }

    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            total: self.universe_size,
            evaluated: self.verdicts.len(),
            candidates: self.verdicts.iter().filter(|v| v.candidate).count(),
            excluded: self.exclusions.len(),
            unavailable: self
                .exclusions
                .iter()
                .filter(|e| e.error.is_fetch_failure())
                .count(),
            synthetic: self
                .sources
                .values()
                .filter(|s| **s == DataSource::Synthetic)
                .count(),
        }
    }

    pub fn notices(&self) -> Vec<Notice> {
        let summary = self.summary();
        let mut notices = Vec::new();
        if summary.candidates == 0 {
            notices.push(Notice::NoCandidates);
        }
        if summary.total > 0
            && summary.unavailable as f64 / summary.total as f64 > UNAVAILABLE_NOTICE_FRACTION
        {
            notices.push(Notice::MostlyUnavailable {
                unavailable: summary.unavailable,
                total: summary.total,
            });
        }
        if summary.synthetic > 0 {
            notices.push(Notice::SyntheticData {
                count: summary.synthetic,
            });
        }
        notices
    }

    /// Rows as CSV.
    ///
    /// Columns: symbol, date, close, open, ma5, ma5_prev, ma20, deviation,
    /// volume, prev_volume, bear_score, candidate, source
    pub fn to_csv(&self, rows: &[&Verdict]) -> Result<String, ExportError> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record([
            "symbol",
            "date",
            "close",
            "open",
            "ma5",
            "ma5_prev",
            "ma20",
            "deviation",
            "volume",
            "prev_volume",
            "bear_score",
            "candidate",
            "source",
        ])?;

        for v in rows {
            let s = &v.snapshot;
            let trend = |f: fn(&bearscan_core::screen::TrendReadings) -> String| {
                s.trend.as_ref().map(f).unwrap_or_default()
            };
            wtr.write_record([
                v.symbol.clone(),
                s.date.to_string(),
                format!("{:.2}", s.close),
                format!("{:.2}", s.open),
                trend(|t| format!("{:.4}", t.ma_short)),
                trend(|t| format!("{:.4}", t.ma_short_prev)),
                trend(|t| format!("{:.4}", t.ma_long)),
                trend(|t| format!("{:.6}", t.deviation)),
                s.volume.to_string(),
                s.prev_volume.to_string(),
                trend(|t| t.bear_score.to_string()),
                v.candidate.to_string(),
                self.sources
                    .get(&v.symbol)
                    .map(|src| src.label().to_string())
                    .unwrap_or_default(),
            ])?;
        }

        let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Write `rows` as CSV to `path`.
    pub fn write_csv(&self, path: &Path, rows: &[&Verdict]) -> Result<(), ExportError> {
        std::fs::write(path, self.to_csv(rows)?)?;
        Ok(())
    }

    /// The full report as pretty JSON.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Stable ordering: by symbol, or by a descending metric with the symbol
/// breaking ties. Verdicts without trend readings sort last.
pub fn sort_verdicts(rows: &mut [&Verdict], sort: SortKey) {
    match sort {
        SortKey::Symbol => rows.sort_by(|a, b| a.symbol.cmp(&b.symbol)),
        SortKey::Deviation => rows.sort_by(|a, b| {
            descending(a.deviation(), b.deviation()).then_with(|| a.symbol.cmp(&b.symbol))
        }),
        SortKey::Score => rows.sort_by(|a, b| {
            descending(a.bear_score().map(f64::from), b.bear_score().map(f64::from))
                .then_with(|| descending(a.deviation(), b.deviation()))
                .then_with(|| a.symbol.cmp(&b.symbol))
        }),
    }
}

fn descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bearscan_core::screen::{ConditionChecks, IndicatorSnapshot, TrendReadings};

    fn verdict(symbol: &str, candidate: bool, deviation: f64, score: u8) -> Verdict {
        let pass = Some(candidate);
        Verdict {
            symbol: symbol.to_string(),
            candidate,
            checks: ConditionChecks {
                liquidity: Some(true),
                downtrend_break: pass,
                bearish_candle: pass,
                overheated: pass,
                volume_up_on_decline: pass,
            },
            snapshot: IndicatorSnapshot {
                date: NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
                open: 108.0,
                close: 106.0,
                prev_close: 110.0,
                volume: 3_000,
                prev_volume: 2_500,
                trend: Some(TrendReadings {
                    ma_short: 109.2,
                    ma_short_prev: 110.0,
                    ma_long: 100.0,
                    deviation,
                    volume_avg: 2_600.0,
                    bear_score: score,
                }),
            },
        }
    }

    fn exclusion(symbol: &str, error: ScreenError) -> Exclusion {
        Exclusion {
            symbol: symbol.to_string(),
            error,
        }
    }

    fn unavailable() -> ScreenError {
        ScreenError::DataUnavailable {
            reason: "timeout".into(),
        }
    }

    fn report(verdicts: Vec<Verdict>, exclusions: Vec<Exclusion>) -> ScanReport {
        let mut sources = BTreeMap::new();
        for v in &verdicts {
            sources.insert(v.symbol.clone(), DataSource::Cache);
        }
        ScanReport::new(
            NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
            1,
            verdicts,
            exclusions,
            sources,
            12,
        )
    }

    #[test]
    fn candidates_default_to_symbol_order() {
        let r = report(
            vec![
                verdict("2454.TW", true, 0.06, 3),
                verdict("2303.TW", false, 0.02, 1),
                verdict("2330.TW", true, 0.09, 5),
            ],
            vec![],
        );
        let symbols: Vec<&str> = r
            .candidates(SortKey::Symbol, 0)
            .iter()
            .map(|v| v.symbol.as_str())
            .collect();
        assert_eq!(symbols, ["2330.TW", "2454.TW"]);
    }

    #[test]
    fn deviation_and_score_sort_descending_with_symbol_tiebreak() {
        let r = report(
            vec![
                verdict("2454.TW", true, 0.06, 3),
                verdict("2330.TW", true, 0.09, 3),
                verdict("2317.TW", true, 0.06, 5),
            ],
            vec![],
        );
        let by_dev: Vec<&str> = r
            .candidates(SortKey::Deviation, 0)
            .iter()
            .map(|v| v.symbol.as_str())
            .collect();
        assert_eq!(by_dev, ["2330.TW", "2317.TW", "2454.TW"]);

        let by_score: Vec<&str> = r
            .candidates(SortKey::Score, 2)
            .iter()
            .map(|v| v.symbol.as_str())
            .collect();
        assert_eq!(by_score, ["2317.TW", "2330.TW"]);
    }

    #[test]
    fn verdicts_without_trend_sort_last() {
        let mut thin = verdict("1101.TW", false, 0.0, 0);
        thin.snapshot.trend = None;
        let r = report(vec![thin, verdict("2330.TW", false, -0.01, 1)], vec![]);
        let all: Vec<&str> = r
            .all_verdicts(SortKey::Deviation)
            .iter()
            .map(|v| v.symbol.as_str())
            .collect();
        assert_eq!(all, ["2330.TW", "1101.TW"]);
    }

    #[test]
    fn summary_counts_each_outcome() {
        let r = report(
            vec![verdict("2330.TW", true, 0.06, 3), verdict("2303.TW", false, 0.01, 0)],
            vec![
                exclusion("2881.TW", unavailable()),
                exclusion(
                    "2882.TW",
                    ScreenError::InsufficientData {
                        required: 20,
                        available: 12,
                    },
                ),
            ],
        );
        let s = r.summary();
        assert_eq!(s.total, 4);
        assert_eq!(s.evaluated, 2);
        assert_eq!(s.candidates, 1);
        assert_eq!(s.excluded, 2);
        assert_eq!(s.unavailable, 1);
        assert!(r.notices().is_empty());
    }

    #[test]
    fn notices_for_empty_and_mostly_unavailable_runs() {
        let r = report(
            vec![verdict("2330.TW", false, 0.01, 0)],
            vec![
                exclusion("2317.TW", unavailable()),
                exclusion("2454.TW", unavailable()),
            ],
        );
        let notices = r.notices();
        assert!(notices.contains(&Notice::NoCandidates));
        assert!(notices.contains(&Notice::MostlyUnavailable {
            unavailable: 2,
            total: 3
        }));
    }

    #[test]
    fn exactly_half_unavailable_is_not_flagged() {
        let r = report(
            vec![verdict("2330.TW", true, 0.06, 3)],
            vec![exclusion("2317.TW", unavailable())],
        );
        assert!(r.notices().is_empty());
    }

    #[test]
    fn csv_has_header_and_one_row_per_verdict() {
        let r = report(
            vec![verdict("2330.TW", true, 0.06, 3), verdict("2454.TW", true, 0.08, 4)],
            vec![],
        );
        let csv = r.to_csv(&r.candidates(SortKey::Symbol, 0)).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("symbol,date,close"));
        assert!(lines[1].starts_with("2330.TW,2024-06-28,106.00,108.00,109.2000"));
        assert!(lines[1].ends_with(",3,true,cache"));
    }

    #[test]
    fn json_roundtrip_keeps_exclusions() {
        let r = report(
            vec![verdict("2330.TW", true, 0.06, 3)],
            vec![exclusion("2317.TW", unavailable())],
        );
        let json = r.to_json().unwrap();
        let back: ScanReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.exclusions, r.exclusions);
        assert_eq!(back.verdicts.len(), 1);
        assert_eq!(back.verdicts[0].symbol, "2330.TW");
        assert_eq!(back.verdicts[0].checks, r.verdicts[0].checks);
        assert_eq!(back.summary(), r.summary());
    }
}
