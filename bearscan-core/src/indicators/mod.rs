//! Indicators used by the screen.
//!
//! Indicators are pure functions of bar history. `compute` produces a full
//! series (NaN during warm-up); the screen itself only needs trailing values
//! at a single index, which `Sma::at` provides without allocating.

pub mod sma;

pub use sma::{Sma, Source};

use crate::domain::Bar;

/// Trait for rolling indicators.
///
/// # Look-ahead guard
/// No value at bar t may depend on bars after t. Every implementation must
/// give the same value at t for a full series and for the series truncated
/// at t.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g. "sma_close_20").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for every bar. The first `lookback()` values
    /// are `f64::NAN`.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Synthetic bars from close prices for tests: open = previous close,
/// volume 3000 lots.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 3_000,
            }
        })
        .collect()
}

#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
