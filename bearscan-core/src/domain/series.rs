//! Series: the ordered daily history of one ticker.

use super::Bar;
use crate::data::provider::RawBar;
use crate::error::ScreenError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Bars for a single ticker, strictly ascending by date.
///
/// Immutable once built. The screen borrows it; the runner shares it behind
/// an `Arc` so concurrent evaluations never see a mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    symbol: String,
    bars: Vec<Bar>,
}

impl Series {
    /// Build a series, rejecting out-of-order or duplicate dates.
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, ScreenError> {
        for (i, pair) in bars.windows(2).enumerate() {
            if pair[1].date <= pair[0].date {
                let reason = if pair[1].date == pair[0].date {
                    format!("duplicate date {}", pair[1].date)
                } else {
                    format!("date {} is earlier than {}", pair[1].date, pair[0].date)
                };
                return Err(ScreenError::InvalidBar {
                    index: i + 1,
                    reason,
                });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    /// Convert provider bars (volume in shares) into a series with volume in
    /// lots. Partial lots are dropped.
    pub fn from_raw(
        symbol: impl Into<String>,
        raw: &[RawBar],
        shares_per_lot: u64,
    ) -> Result<Self, ScreenError> {
        let per_lot = shares_per_lot.max(1);
        let bars = raw
            .iter()
            .map(|r| Bar {
                date: r.date,
                open: r.open,
                high: r.high,
                low: r.low,
                close: r.close,
                volume: r.volume / per_lot,
            })
            .collect();
        Self::new(symbol, bars)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// The most recent bar ("today").
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Date of the most recent bar.
    pub fn as_of(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// The prefix of this series ending on or before `as_of`.
    pub fn truncate_to(&self, as_of: NaiveDate) -> Series {
        let end = self.bars.partition_point(|b| b.date <= as_of);
        Series {
            symbol: self.symbol.clone(),
            bars: self.bars[..end].to_vec(),
        }
    }
}
