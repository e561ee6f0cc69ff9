//! Screen evaluation for a single series.

use super::criteria::ScreenCriteria;
use super::score::bear_score;
use super::verdict::{ConditionChecks, IndicatorSnapshot, TrendReadings, Verdict};
use crate::domain::Series;
use crate::error::ScreenError;
use crate::indicators::{Sma, Source};

/// Applies `ScreenCriteria` to series. Stateless apart from its thresholds,
/// so one instance can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct Screener {
    criteria: ScreenCriteria,
}

/// Evaluate with the default thresholds (2,000 lots, MA5/MA20, 5%).
pub fn evaluate(series: &Series) -> Result<Verdict, ScreenError> {
    Screener::default().evaluate(series)
}

impl Screener {
    pub fn new(criteria: ScreenCriteria) -> Self {
        Self { criteria }
    }

    pub fn criteria(&self) -> &ScreenCriteria {
        &self.criteria
    }

    /// Evaluate the most recent bar of `series`.
    ///
    /// Errors exclude the ticker: too few bars for every window, or any bar
    /// with a non-positive or NaN price. Otherwise returns a verdict; when
    /// liquidity fails, no averages are computed and `snapshot.trend` is
    /// `None`.
    pub fn evaluate(&self, series: &Series) -> Result<Verdict, ScreenError> {
        let bars = series.bars();
        let required = self.criteria.required_bars();
        if bars.len() < required {
            return Err(ScreenError::InsufficientData {
                required,
                available: bars.len(),
            });
        }

        if let Some((index, reason)) = bars
            .iter()
            .enumerate()
            .find_map(|(i, b)| b.defect().map(|r| (i, r)))
        {
            return Err(ScreenError::InvalidBar {
                index,
                reason: reason.to_string(),
            });
        }

        let t = bars.len() - 1;
        let today = &bars[t];
        let yesterday = &bars[t - 1];

        let mut snapshot = IndicatorSnapshot {
            date: today.date,
            open: today.open,
            close: today.close,
            prev_close: yesterday.close,
            volume: today.volume,
            prev_volume: yesterday.volume,
            trend: None,
        };
        let mut checks = ConditionChecks {
            liquidity: Some(today.volume > self.criteria.min_volume_lots),
            ..Default::default()
        };

        if checks.liquidity != Some(true) {
            tracing::debug!(
                symbol = series.symbol(),
                volume = today.volume,
                "below liquidity threshold"
            );
            return Ok(Verdict {
                symbol: series.symbol().to_string(),
                candidate: false,
                checks,
                snapshot,
            });
        }

        let short = Sma::new(self.criteria.short_window);
        let long = Sma::new(self.criteria.long_window);
        let short_volume = Sma::of(Source::Volume, self.criteria.short_window);
        let window = |value: Option<f64>| {
            value.ok_or(ScreenError::InsufficientData {
                required,
                available: bars.len(),
            })
        };

        let ma_short = window(short.at(bars, t))?;
        let ma_short_prev = window(short.at(bars, t - 1))?;
        let ma_long = window(long.at(bars, t))?;
        let volume_avg = window(short_volume.at(bars, t))?;
        let deviation = (today.close - ma_long) / ma_long;

        checks.downtrend_break = Some(today.close < ma_short && ma_short < ma_short_prev);
        checks.bearish_candle = Some(today.is_bearish());
        checks.overheated = Some(deviation > self.criteria.min_deviation);
        checks.volume_up_on_decline =
            Some(today.volume > yesterday.volume && today.close < yesterday.close);

        snapshot.trend = Some(TrendReadings {
            ma_short,
            ma_short_prev,
            ma_long,
            deviation,
            volume_avg,
            bear_score: bear_score(
                today,
                yesterday.close,
                ma_short,
                ma_short_prev,
                volume_avg,
                deviation,
            ),
        });

        let candidate = checks.all_passed();
        tracing::debug!(
            symbol = series.symbol(),
            candidate,
            deviation,
            failed = checks.first_failure().map(|c| c.label()),
            "evaluated"
        );

        Ok(Verdict {
            symbol: series.symbol().to_string(),
            candidate,
            checks,
            snapshot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};
    use crate::screen::Condition;
    use chrono::NaiveDate;

    /// 25 bars: MA20 = 100, closes 110 over the four bars before today,
    /// today opens 108 and closes at `today_close` on 3000 lots.
    fn setup(today_close: f64, today_volume: u64) -> Series {
        let mut closes = vec![96.0; 25];
        for c in closes.iter_mut().take(24).skip(19) {
            *c = 110.0;
        }
        closes[24] = today_close;
        // keep the MA20 window (bars 5..=24) summing to 2000
        closes[5] += 106.0 - today_close;

        let base = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let open = if i == 24 { 108.0 } else { close };
                Bar {
                    date: base + chrono::Duration::days(i as i64),
                    open,
                    high: open.max(close) + 1.0,
                    low: open.min(close) - 1.0,
                    close,
                    volume: if i == 24 { today_volume } else { 2_500 },
                }
            })
            .collect();
        Series::new("2330.TW", bars).unwrap()
    }

    #[test]
    fn all_conditions_make_a_candidate() {
        let verdict = evaluate(&setup(106.0, 3_000)).unwrap();
        assert!(verdict.candidate);
        let trend = verdict.snapshot.trend.unwrap();
        assert_approx(trend.ma_long, 100.0, DEFAULT_EPSILON);
        assert_approx(trend.deviation, 0.06, DEFAULT_EPSILON);
        assert_approx(trend.ma_short, 109.2, DEFAULT_EPSILON);
        assert_approx(trend.ma_short_prev, 110.0, DEFAULT_EPSILON);
    }

    #[test]
    fn illiquid_short_circuits_without_trend() {
        let verdict = evaluate(&setup(106.0, 1_500)).unwrap();
        assert!(!verdict.candidate);
        assert_eq!(verdict.checks.first_failure(), Some(Condition::Liquidity));
        assert!(verdict.snapshot.trend.is_none());
        assert_eq!(verdict.checks.overheated, None);
    }

    #[test]
    fn volume_exactly_at_threshold_fails() {
        let verdict = evaluate(&setup(106.0, 2_000)).unwrap();
        assert_eq!(verdict.checks.liquidity, Some(false));
    }

    #[test]
    fn mild_deviation_is_not_overheated() {
        let verdict = evaluate(&setup(104.0, 3_000)).unwrap();
        assert!(!verdict.candidate);
        assert_eq!(verdict.checks.overheated, Some(false));
        assert_eq!(verdict.checks.downtrend_break, Some(true));
    }

    #[test]
    fn deviation_exactly_at_threshold_fails() {
        let verdict = evaluate(&setup(105.0, 3_000)).unwrap();
        assert_approx(verdict.deviation().unwrap(), 0.05, DEFAULT_EPSILON);
        assert_eq!(verdict.checks.overheated, Some(false));
    }

    #[test]
    fn too_short_series_is_excluded() {
        let full = setup(106.0, 3_000);
        let short = Series::new("2330.TW", full.bars()[10..].to_vec()).unwrap();
        assert_eq!(
            evaluate(&short).unwrap_err(),
            ScreenError::InsufficientData {
                required: 20,
                available: 15
            }
        );
    }

    #[test]
    fn non_positive_price_anywhere_is_excluded() {
        let mut bars = setup(106.0, 3_000).bars().to_vec();
        bars[2].low = 0.0;
        let series = Series::new("2330.TW", bars).unwrap();
        match evaluate(&series).unwrap_err() {
            ScreenError::InvalidBar { index, reason } => {
                assert_eq!(index, 2);
                assert!(reason.contains("low"));
            }
            other => panic!("expected InvalidBar, got {other:?}"),
        }
    }

    #[test]
    fn custom_criteria_change_the_outcome() {
        let screener = Screener::new(ScreenCriteria {
            min_deviation: 0.07,
            ..Default::default()
        });
        let verdict = screener.evaluate(&setup(106.0, 3_000)).unwrap();
        assert!(!verdict.candidate);
        assert_eq!(screener.criteria().min_deviation, 0.07);
    }

    #[test]
    fn candidate_scores_high() {
        let verdict = evaluate(&setup(106.0, 3_000)).unwrap();
        // close < MA5, MA5 falling, down day on above-average volume;
        // 6% is not enough for the overheat bonus.
        assert_eq!(verdict.bear_score(), Some(3));
    }
}
