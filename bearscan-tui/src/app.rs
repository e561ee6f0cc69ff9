//! Application state. Single owner, main thread only.
//!
//! All TUI state lives here. The worker thread communicates via channels.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;

use bearscan_core::data::Universe;
use bearscan_core::Verdict;
use bearscan_runner::{ScanReport, SortKey};
use serde::{Deserialize, Serialize};

use crate::worker::{WorkerCommand, WorkerResponse};

/// Which panel is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Panel {
    Candidates,
    Universe,
    Help,
}

impl Panel {
    pub const COUNT: usize = 3;

    pub fn index(self) -> usize {
        match self {
            Panel::Candidates => 0,
            Panel::Universe => 1,
            Panel::Help => 2,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(Panel::Candidates),
            1 => Some(Panel::Universe),
            2 => Some(Panel::Help),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Panel::Candidates => "Candidates",
            Panel::Universe => "Universe",
            Panel::Help => "Help",
        }
    }

    pub fn next(self) -> Panel {
        Panel::from_index((self.index() + 1) % Self::COUNT).unwrap_or(Panel::Candidates)
    }

    pub fn prev(self) -> Panel {
        Panel::from_index((self.index() + Self::COUNT - 1) % Self::COUNT)
            .unwrap_or(Panel::Candidates)
    }
}

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// Progress of the scan currently running on the worker.
#[derive(Debug, Clone, Default)]
pub struct ScanStatus {
    pub running: bool,
    pub completed: usize,
    pub total: usize,
    pub current_symbol: Option<String>,
}

/// Candidates panel state.
#[derive(Debug)]
pub struct CandidatesState {
    pub report: Option<ScanReport>,
    /// Show every verdict instead of only candidates.
    pub show_all: bool,
    pub sort: SortKey,
    /// Row limit for the candidate view. 0 shows all.
    pub top: usize,
    pub cursor: usize,
}

impl CandidatesState {
    pub fn new(sort: SortKey, top: usize) -> Self {
        Self {
            report: None,
            show_all: false,
            sort,
            top,
            cursor: 0,
        }
    }

    /// Rows for the current view, in display order.
    pub fn rows(&self) -> Vec<&Verdict> {
        match &self.report {
            None => Vec::new(),
            Some(r) if self.show_all => r.all_verdicts(self.sort),
            Some(r) => r.candidates(self.sort, self.top),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows().len()
    }
}

/// Universe panel state: group/ticker listing with cache coverage.
#[derive(Debug)]
pub struct UniverseState {
    pub universe: Universe,
    pub cache_status: HashMap<String, bool>,
    pub cursor: usize,
}

impl UniverseState {
    pub fn new(universe: Universe) -> Self {
        Self {
            universe,
            cache_status: HashMap::new(),
            cursor: 0,
        }
    }

    /// One row per group header plus one per ticker.
    pub fn row_count(&self) -> usize {
        self.universe
            .group_names()
            .iter()
            .map(|g| 1 + self.universe.group_tickers(g).map_or(0, <[String]>::len))
            .sum()
    }
}

/// Top-level application state.
pub struct AppState {
    pub active_panel: Panel,
    pub running: bool,

    pub candidates: CandidatesState,
    pub universe: UniverseState,
    pub scan: ScanStatus,

    // Worker communication
    pub worker_tx: Sender<WorkerCommand>,
    pub worker_rx: Receiver<WorkerResponse>,
    pub cancel: Arc<AtomicBool>,

    pub status_message: Option<(String, StatusLevel)>,
    pub notices: Vec<String>,

    pub cache_dir: PathBuf,
    pub state_path: PathBuf,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        worker_tx: Sender<WorkerCommand>,
        worker_rx: Receiver<WorkerResponse>,
        cancel: Arc<AtomicBool>,
        universe: Universe,
        sort: SortKey,
        top: usize,
        cache_dir: PathBuf,
        state_path: PathBuf,
    ) -> Self {
        Self {
            active_panel: Panel::Candidates,
            running: true,
            candidates: CandidatesState::new(sort, top),
            universe: UniverseState::new(universe),
            scan: ScanStatus::default(),
            worker_tx,
            worker_rx,
            cancel,
            status_message: None,
            notices: Vec::new(),
            cache_dir,
            state_path,
        }
    }

    /// Ask the worker for a fresh pass over the whole universe. Ignored while
    /// a pass is already running.
    pub fn request_scan(&mut self) {
        if self.scan.running {
            self.set_warning("Scan already running (x to cancel)");
            return;
        }
        let symbols: Vec<String> = self
            .universe
            .universe
            .all_tickers()
            .into_iter()
            .map(String::from)
            .collect();
        if symbols.is_empty() {
            self.set_warning("Universe is empty");
            return;
        }

        self.cancel.store(false, Ordering::Relaxed);
        self.scan = ScanStatus {
            running: true,
            completed: 0,
            total: symbols.len(),
            current_symbol: None,
        };
        self.notices.clear();
        let count = symbols.len();
        if self.worker_tx.send(WorkerCommand::RunScan { symbols }).is_err() {
            self.scan.running = false;
            self.set_error("Worker thread is not running");
            return;
        }
        self.set_status(format!("Scanning {count} tickers..."));
    }

    pub fn cancel_scan(&mut self) {
        if self.scan.running {
            self.cancel.store(true, Ordering::Relaxed);
            self.set_warning("Cancelling scan...");
        }
    }

    pub fn toggle_show_all(&mut self) {
        self.candidates.show_all = !self.candidates.show_all;
        self.candidates.cursor = 0;
    }

    pub fn cycle_sort(&mut self) {
        self.candidates.sort = self.candidates.sort.next();
        self.candidates.cursor = 0;
        self.set_status(format!("Sorted by {}", self.candidates.sort.label()));
    }

    /// Install a finished report and surface its notices.
    pub fn apply_report(&mut self, report: ScanReport) {
        let summary = report.summary();
        self.notices = report.notices().iter().map(ToString::to_string).collect();
        for symbol in report.sources.keys() {
            self.universe.cache_status.insert(symbol.clone(), true);
        }
        self.candidates.report = Some(report);
        self.candidates.cursor = 0;
        self.scan = ScanStatus::default();

        let msg = format!(
            "Scan complete: {} candidates, {} evaluated, {} excluded",
            summary.candidates, summary.evaluated, summary.excluded
        );
        if self.notices.is_empty() {
            self.set_status(msg);
        } else {
            self.set_warning(msg);
        }
    }

    /// The verdict under the cursor in the Candidates panel.
    pub fn selected_verdict(&self) -> Option<&Verdict> {
        self.candidates.rows().get(self.candidates.cursor).copied()
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Error));
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use bearscan_core::screen::{ConditionChecks, IndicatorSnapshot, TrendReadings};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use std::sync::mpsc;

    pub(crate) fn verdict(symbol: &str, candidate: bool, deviation: f64) -> Verdict {
        Verdict {
            symbol: symbol.to_string(),
            candidate,
            checks: ConditionChecks {
                liquidity: Some(true),
                downtrend_break: Some(true),
                bearish_candle: Some(true),
                overheated: Some(candidate),
                volume_up_on_decline: Some(true),
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
                    bear_score: 3,
                }),
            },
        }
    }

    pub(crate) fn sample_report() -> ScanReport {
        ScanReport::new(
            NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
            1,
            vec![
                verdict("2454.TW", true, 0.08),
                verdict("2330.TW", true, 0.06),
                verdict("2303.TW", false, 0.01),
            ],
            vec![],
            BTreeMap::new(),
            5,
        )
    }

    /// App wired to channels the test keeps the other ends of.
    pub(crate) fn test_app() -> (AppState, mpsc::Receiver<WorkerCommand>) {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (_resp_tx, resp_rx) = mpsc::channel();
        let app = AppState::new(
            cmd_tx,
            resp_rx,
            Arc::new(AtomicBool::new(false)),
            Universe::default_taiwan(),
            SortKey::Symbol,
            0,
            PathBuf::from("data"),
            PathBuf::from("state.json"),
        );
        (app, cmd_rx)
    }

    #[test]
    fn panel_cycle() {
        assert_eq!(Panel::Candidates.next(), Panel::Universe);
        assert_eq!(Panel::Help.next(), Panel::Candidates);
        assert_eq!(Panel::Candidates.prev(), Panel::Help);
        for i in 0..Panel::COUNT {
            assert_eq!(Panel::from_index(i).unwrap().index(), i);
        }
        assert!(Panel::from_index(Panel::COUNT).is_none());
    }

    #[test]
    fn rows_follow_view_and_sort() {
        let (mut app, _rx) = test_app();
        app.apply_report(sample_report());

        let symbols = |app: &AppState| -> Vec<String> {
            app.candidates.rows().iter().map(|v| v.symbol.clone()).collect()
        };
        assert_eq!(symbols(&app), ["2330.TW", "2454.TW"]);

        app.cycle_sort();
        assert_eq!(app.candidates.sort, SortKey::Deviation);
        assert_eq!(symbols(&app), ["2454.TW", "2330.TW"]);

        app.toggle_show_all();
        assert_eq!(symbols(&app), ["2454.TW", "2330.TW", "2303.TW"]);
    }

    #[test]
    fn request_scan_sends_whole_universe_once() {
        let (mut app, rx) = test_app();
        app.request_scan();
        assert!(app.scan.running);
        match rx.try_recv().unwrap() {
            WorkerCommand::RunScan { symbols } => {
                assert_eq!(symbols.len(), app.universe.universe.ticker_count());
            }
            other => panic!("unexpected command {other:?}"),
        }

        app.request_scan();
        assert!(rx.try_recv().is_err());
        assert_eq!(app.status_message.as_ref().unwrap().1, StatusLevel::Warning);
    }

    #[test]
    fn cancel_sets_flag_only_while_running() {
        let (mut app, _rx) = test_app();
        app.cancel_scan();
        assert!(!app.cancel.load(Ordering::Relaxed));

        app.request_scan();
        app.cancel_scan();
        assert!(app.cancel.load(Ordering::Relaxed));
    }

    #[test]
    fn empty_report_surfaces_notice() {
        let (mut app, _rx) = test_app();
        app.scan.running = true;
        app.apply_report(ScanReport::new(
            NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
            1,
            vec![verdict("2303.TW", false, 0.01)],
            vec![],
            BTreeMap::new(),
            3,
        ));
        assert!(!app.scan.running);
        assert_eq!(app.notices.len(), 1);
        assert_eq!(app.status_message.as_ref().unwrap().1, StatusLevel::Warning);
    }

    #[test]
    fn selection_follows_cursor() {
        let (mut app, _rx) = test_app();
        app.apply_report(sample_report());
        app.toggle_show_all();
        app.candidates.cursor = 2;
        assert_eq!(app.selected_verdict().unwrap().symbol, "2454.TW");
        app.candidates.cursor = 10;
        assert!(app.selected_verdict().is_none());
    }
}
