//! Bar: one trading day for one ticker.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar. Volume is in lots (1 lot = 1,000 shares on TWSE/TPEx).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Returns the first rule this bar violates, or `None` if it is usable.
    ///
    /// Prices must be finite and strictly positive. Volume is unsigned, so
    /// it cannot be negative by construction.
    pub fn defect(&self) -> Option<&'static str> {
        let prices = [
            (self.open, "open is NaN", "open is not a positive price"),
            (self.high, "high is NaN", "high is not a positive price"),
            (self.low, "low is NaN", "low is not a positive price"),
            (self.close, "close is NaN", "close is not a positive price"),
        ];
        for (value, nan, not_positive) in prices {
            if value.is_nan() {
                return Some(nan);
            }
            if value <= 0.0 || value.is_infinite() {
                return Some(not_positive);
            }
        }
        None
    }

    /// Close strictly below open ("black" candle in US colours, red in Taiwan's).
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}
