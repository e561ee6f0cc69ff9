//! Screen thresholds.

use serde::{Deserialize, Serialize};

/// Thresholds applied to the most recent bar. All comparisons are strict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenCriteria {
    /// Today's volume must exceed this many lots.
    pub min_volume_lots: u64,
    /// Short moving-average window (MA5).
    pub short_window: usize,
    /// Long moving-average window (MA20).
    pub long_window: usize,
    /// `(close - MA20) / MA20` must exceed this.
    pub min_deviation: f64,
}

impl Default for ScreenCriteria {
    fn default() -> Self {
        Self {
            min_volume_lots: 2_000,
            short_window: 5,
            long_window: 20,
            min_deviation: 0.05,
        }
    }
}

impl ScreenCriteria {
    /// Bars needed to evaluate every condition without a partial window:
    /// the long average, the short average one day back, and a prior bar.
    pub fn required_bars(&self) -> usize {
        self.long_window.max(self.short_window + 1).max(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_require_twenty_bars() {
        let c = ScreenCriteria::default();
        assert_eq!(c.required_bars(), 20);
        assert_eq!(c.min_volume_lots, 2_000);
        assert_eq!(c.min_deviation, 0.05);
    }

    #[test]
    fn short_window_can_dominate() {
        let c = ScreenCriteria {
            short_window: 30,
            long_window: 20,
            ..Default::default()
        };
        assert_eq!(c.required_bars(), 31);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c: ScreenCriteria = toml::from_str("min_deviation = 0.07").unwrap();
        assert_eq!(c.min_deviation, 0.07);
        assert_eq!(c.long_window, 20);
    }
}
