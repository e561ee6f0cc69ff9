//! Simple Moving Average over close price or volume.
//!
//! Unweighted mean of the trailing `period` bars, inclusive of the bar being
//! evaluated. A window that would start before the first bar has no value.

use super::Indicator;
use crate::domain::Bar;

/// Which bar field an average is taken over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Close,
    Volume,
}

impl Source {
    fn value(self, bar: &Bar) -> f64 {
        match self {
            Source::Close => bar.close,
            Source::Volume => bar.volume as f64,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Source::Close => "close",
            Source::Volume => "volume",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    source: Source,
    name: String,
}

impl Sma {
    /// Moving average of close. Periods below 1 are clamped to 1.
    pub fn new(period: usize) -> Self {
        Self::of(Source::Close, period)
    }

    pub fn of(source: Source, period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            source,
            name: format!("sma_{}_{period}", source.label()),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Trailing mean ending at `index`, or `None` when the window would
    /// extend before the start of `bars` (or past its end).
    ///
    /// Summed in bar order so repeated calls are bit-identical.
    pub fn at(&self, bars: &[Bar], index: usize) -> Option<f64> {
        if index >= bars.len() || index + 1 < self.period {
            return None;
        }
        let window = &bars[index + 1 - self.period..=index];
        let sum: f64 = window.iter().map(|b| self.source.value(b)).sum();
        Some(sum / self.period as f64)
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    /// Rolling sum over the whole history. Values can differ from `at` in
    /// the last bits; the screen reads single points through `at`.
    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];
        if n < self.period {
            return result;
        }

        let value = |i: usize| self.source.value(&bars[i]);
        let mut sum: f64 = (0..self.period).map(value).sum();
        result[self.period - 1] = sum / self.period as f64;

        for i in self.period..n {
            let leaving = value(i - self.period);
            let entering = value(i);
            if leaving.is_finite() && entering.is_finite() && sum.is_finite() {
                sum += entering - leaving;
            } else {
                // A non-finite value poisons the running sum; rescan the window.
                sum = (i + 1 - self.period..=i).map(value).sum();
            }
            result[i] = sum / self.period as f64;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn sma_5_basic() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        let result = Sma::new(5).compute(&bars);

        assert_eq!(result.len(), 7);
        for (i, v) in result.iter().take(4).enumerate() {
            assert!(v.is_nan(), "expected NaN at index {i}");
        }
        assert_approx(result[4], 12.0, DEFAULT_EPSILON);
        assert_approx(result[5], 13.0, DEFAULT_EPSILON);
        assert_approx(result[6], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_compute_matches_point_reads() {
        let closes: Vec<f64> = (0..300).map(|i| 100.0 + (i as f64 * 0.37).sin() * 9.0).collect();
        let bars = make_bars(&closes);
        let sma = Sma::new(20);
        let rolled = sma.compute(&bars);
        for (i, v) in rolled.iter().enumerate().skip(19) {
            assert_approx(*v, sma.at(&bars, i).unwrap(), 1e-9);
        }
    }

    #[test]
    fn nan_leaves_the_window() {
        let mut closes = vec![10.0; 12];
        closes[3] = f64::NAN;
        let bars = make_bars(&closes);
        let result = Sma::new(5).compute(&bars);
        assert!(result[4].is_nan());
        assert!(result[7].is_nan());
        assert_approx(result[8], 10.0, DEFAULT_EPSILON);
        assert_approx(result[11], 10.0, DEFAULT_EPSILON);
    }

    #[test]
    fn at_rejects_window_before_start() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0]);
        let sma = Sma::new(5);
        assert_eq!(sma.at(&bars, 3), None);
        assert_eq!(sma.at(&bars, 10), None);
    }

    #[test]
    fn at_yesterday_uses_previous_window() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 20.0]);
        let sma = Sma::new(5);
        assert_approx(sma.at(&bars, 4).unwrap(), 12.0, DEFAULT_EPSILON);
        assert_approx(sma.at(&bars, 5).unwrap(), 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn volume_source_averages_lots() {
        let mut bars = make_bars(&[1.0, 1.0, 1.0]);
        bars[0].volume = 1_000;
        bars[1].volume = 2_000;
        bars[2].volume = 6_000;
        let sma = Sma::of(Source::Volume, 3);
        assert_approx(sma.at(&bars, 2).unwrap(), 3_000.0, DEFAULT_EPSILON);
        assert_eq!(sma.name(), "sma_volume_3");
    }

    #[test]
    fn sma_1_is_close() {
        let bars = make_bars(&[100.0, 200.0, 300.0]);
        let result = Sma::new(1).compute(&bars);
        assert_eq!(result, vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn sma_lookback() {
        assert_eq!(Sma::new(20).lookback(), 19);
        assert_eq!(Sma::new(1).lookback(), 0);
        assert_eq!(Sma::new(0).period(), 1);
    }

    #[test]
    fn no_lookahead_truncated_matches_full() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let bars = make_bars(&closes);
        let sma = Sma::new(20);
        let full = sma.compute(&bars);
        for t in 19..bars.len() {
            let truncated = sma.compute(&bars[..=t]);
            assert_eq!(truncated[t].to_bits(), full[t].to_bits(), "mismatch at {t}");
        }
    }
}
