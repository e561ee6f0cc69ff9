//! Per-run series memo.
//!
//! Loaded series are shared between the scan and anything that inspects the
//! results afterwards (TUI detail views). `begin_run` drops every entry, so
//! a re-run always reloads; nothing relies on an entry surviving.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::loader::LoadedSeries;

#[derive(Debug, Default)]
struct MemoState {
    generation: u64,
    entries: HashMap<String, LoadedSeries>,
}

#[derive(Debug, Default)]
pub struct SeriesMemo {
    state: RwLock<MemoState>,
}

impl SeriesMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate everything and start a new generation. Returns the new
    /// generation number.
    pub fn begin_run(&self) -> u64 {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.entries.clear();
        state.generation += 1;
        state.generation
    }

    pub fn generation(&self) -> u64 {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }

    pub fn get(&self, symbol: &str) -> Option<LoadedSeries> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .get(symbol)
            .cloned()
    }

    /// Store a series for the current generation. A later `begin_run`
    /// discards it.
    pub fn insert(&self, symbol: &str, loaded: LoadedSeries) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .insert(symbol.to_string(), loaded);
    }

    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bearscan_core::data::DataSource;
    use bearscan_core::{Bar, Series};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn loaded(symbol: &str) -> LoadedSeries {
        let bar = Bar {
            date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.5,
            volume: 3_000,
        };
        LoadedSeries {
            series: Arc::new(Series::new(symbol, vec![bar]).unwrap()),
            source: DataSource::Cache,
        }
    }

    #[test]
    fn insert_then_get() {
        let memo = SeriesMemo::new();
        memo.begin_run();
        memo.insert("2330.TW", loaded("2330.TW"));
        let hit = memo.get("2330.TW").unwrap();
        assert_eq!(hit.series.symbol(), "2330.TW");
        assert!(memo.get("2317.TW").is_none());
        assert_eq!(memo.len(), 1);
    }

    #[test]
    fn begin_run_invalidates_everything() {
        let memo = SeriesMemo::new();
        let first = memo.begin_run();
        memo.insert("2330.TW", loaded("2330.TW"));
        memo.insert("2317.TW", loaded("2317.TW"));

        let second = memo.begin_run();
        assert_eq!(second, first + 1);
        assert!(memo.is_empty());
        assert!(memo.get("2330.TW").is_none());
    }

    #[test]
    fn shared_series_is_not_copied() {
        let memo = SeriesMemo::new();
        let entry = loaded("2454.TW");
        memo.insert("2454.TW", entry.clone());
        let hit = memo.get("2454.TW").unwrap();
        assert!(Arc::ptr_eq(&hit.series, &entry.series));
    }
}
