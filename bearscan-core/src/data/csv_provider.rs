//! CSV directory provider: one `{SYMBOL}.csv` per ticker.
//!
//! Columns: `date,open,high,low,close,volume` with ISO dates and volume in
//! shares. Rows may be in any order; they are returned oldest first.
//! This is the offline path when Yahoo is unreachable.

use super::provider::{DataError, DataProvider, DataSource, FetchResult, RawBar};
use super::yahoo::normalize_symbol;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `{dir}/{symbol}.csv`, falling back to the normalized Yahoo symbol so
    /// `2330` finds `2330.TW.csv`.
    fn resolve(&self, symbol: &str) -> Option<PathBuf> {
        [symbol.to_string(), normalize_symbol(symbol)]
            .into_iter()
            .map(|s| self.dir.join(format!("{s}.csv")))
            .find(|p| p.is_file())
    }

    pub fn read_file(path: &Path) -> Result<Vec<RawBar>, DataError> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| DataError::CsvError(format!("{}: {e}", path.display())))?;
        let mut bars = Vec::new();
        for (line, row) in reader.deserialize::<CsvRow>().enumerate() {
            let row = row.map_err(|e| {
                DataError::CsvError(format!("{} row {}: {e}", path.display(), line + 1))
            })?;
            bars.push(RawBar {
                date: row.date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }
        // Duplicate dates are kept; `Series::new` reports them.
        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let path = self.resolve(symbol).ok_or_else(|| DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        })?;
        let bars: Vec<RawBar> = Self::read_file(&path)?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();
        if bars.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::Csv,
        })
    }

    fn is_available(&self) -> bool {
        self.dir.is_dir()
    }
}
