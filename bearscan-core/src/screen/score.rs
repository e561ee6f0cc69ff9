//! Bear score: a coarse 0..=5 ranking of how bearish the last bar looks.
//!
//! Kept for ordering watch lists. It awards partial credit, unlike the
//! verdict, and uses the short-window average volume rather than yesterday's
//! volume for its selling-pressure term.

use crate::domain::Bar;

/// Deviation above MA20 that counts as an overheated reversal for scoring.
pub const SCORE_OVERHEAT_DEVIATION: f64 = 0.07;

/// Score the most recent bar.
///
/// +1 close below MA5, +1 MA5 falling, +1 down day on above-average volume,
/// +2 bearish candle after closing more than 7% above MA20.
pub fn bear_score(
    today: &Bar,
    prev_close: f64,
    ma_short: f64,
    ma_short_prev: f64,
    volume_avg: f64,
    deviation: f64,
) -> u8 {
    let mut score = 0;
    if today.close < ma_short {
        score += 1;
    }
    if ma_short < ma_short_prev {
        score += 1;
    }
    if today.close < prev_close && (today.volume as f64) > volume_avg {
        score += 1;
    }
    if deviation > SCORE_OVERHEAT_DEVIATION && today.is_bearish() {
        score += 2;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn today(open: f64, close: f64, volume: u64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            open,
            high: open.max(close) + 1.0,
            low: open.min(close) - 1.0,
            close,
            volume,
        }
    }

    #[test]
    fn maximum_score_is_five() {
        let bar = today(112.0, 108.0, 9_000);
        assert_eq!(bear_score(&bar, 110.0, 109.0, 110.0, 5_000.0, 0.08), 5);
    }

    #[test]
    fn bullish_bar_scores_zero() {
        let bar = today(100.0, 103.0, 1_000);
        assert_eq!(bear_score(&bar, 101.0, 100.0, 99.0, 5_000.0, 0.02), 0);
    }

    #[test]
    fn overheat_needs_more_than_seven_percent() {
        let bar = today(112.0, 108.0, 1_000);
        // Only the overheat term is in play here.
        assert_eq!(bear_score(&bar, 107.0, 100.0, 99.0, 5_000.0, 0.07), 0);
        assert_eq!(bear_score(&bar, 107.0, 100.0, 99.0, 5_000.0, 0.0701), 2);
    }
}
