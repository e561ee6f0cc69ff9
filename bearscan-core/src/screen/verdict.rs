//! Verdicts and the indicator values behind them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The five conditions a candidate must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    Liquidity,
    DowntrendBreak,
    BearishCandle,
    Overheated,
    VolumeUpOnDecline,
}

impl Condition {
    pub const ALL: [Condition; 5] = [
        Condition::Liquidity,
        Condition::DowntrendBreak,
        Condition::BearishCandle,
        Condition::Overheated,
        Condition::VolumeUpOnDecline,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Condition::Liquidity => "liquidity",
            Condition::DowntrendBreak => "downtrend-break",
            Condition::BearishCandle => "bearish-candle",
            Condition::Overheated => "overheated",
            Condition::VolumeUpOnDecline => "volume-up-on-decline",
        }
    }
}

/// Outcome of each condition. `None` means not evaluated: everything after
/// a failed liquidity gate is skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionChecks {
    pub liquidity: Option<bool>,
    pub downtrend_break: Option<bool>,
    pub bearish_candle: Option<bool>,
    pub overheated: Option<bool>,
    pub volume_up_on_decline: Option<bool>,
}

impl ConditionChecks {
    pub fn get(&self, condition: Condition) -> Option<bool> {
        match condition {
            Condition::Liquidity => self.liquidity,
            Condition::DowntrendBreak => self.downtrend_break,
            Condition::BearishCandle => self.bearish_candle,
            Condition::Overheated => self.overheated,
            Condition::VolumeUpOnDecline => self.volume_up_on_decline,
        }
    }

    /// True only when every condition was evaluated and held.
    pub fn all_passed(&self) -> bool {
        Condition::ALL.iter().all(|c| self.get(*c) == Some(true))
    }

    /// First condition (in screen order) that failed.
    pub fn first_failure(&self) -> Option<Condition> {
        Condition::ALL
            .iter()
            .copied()
            .find(|c| self.get(*c) == Some(false))
    }

    /// Number of conditions that held.
    pub fn passed_count(&self) -> usize {
        Condition::ALL
            .iter()
            .filter(|c| self.get(**c) == Some(true))
            .count()
    }
}

/// Moving-average readings. Only computed once liquidity passes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendReadings {
    /// MA5 today.
    pub ma_short: f64,
    /// MA5 one bar earlier.
    pub ma_short_prev: f64,
    /// MA20 today.
    pub ma_long: f64,
    /// `(close - MA20) / MA20`.
    pub deviation: f64,
    /// Average volume over the short window, in lots.
    pub volume_avg: f64,
    /// Informational 0..=5 ranking score; never affects the verdict.
    pub bear_score: u8,
}

/// Values read off the last two bars, plus trend readings when computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub date: NaiveDate,
    pub open: f64,
    pub close: f64,
    pub prev_close: f64,
    pub volume: u64,
    pub prev_volume: u64,
    pub trend: Option<TrendReadings>,
}

/// Screen outcome for one ticker in one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub symbol: String,
    pub candidate: bool,
    pub checks: ConditionChecks,
    pub snapshot: IndicatorSnapshot,
}

impl Verdict {
    pub fn as_of(&self) -> NaiveDate {
        self.snapshot.date
    }

    pub fn deviation(&self) -> Option<f64> {
        self.snapshot.trend.map(|t| t.deviation)
    }

    pub fn bear_score(&self) -> Option<u8> {
        self.snapshot.trend.map(|t| t.bear_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_passed_requires_every_condition() {
        let mut checks = ConditionChecks {
            liquidity: Some(true),
            downtrend_break: Some(true),
            bearish_candle: Some(true),
            overheated: Some(true),
            volume_up_on_decline: Some(true),
        };
        assert!(checks.all_passed());
        assert_eq!(checks.first_failure(), None);
        assert_eq!(checks.passed_count(), 5);

        checks.overheated = Some(false);
        assert!(!checks.all_passed());
        assert_eq!(checks.first_failure(), Some(Condition::Overheated));
    }

    #[test]
    fn unevaluated_conditions_do_not_pass() {
        let checks = ConditionChecks {
            liquidity: Some(false),
            ..Default::default()
        };
        assert!(!checks.all_passed());
        assert_eq!(checks.first_failure(), Some(Condition::Liquidity));
        assert_eq!(checks.passed_count(), 0);
    }

    #[test]
    fn labels_are_distinct() {
        let mut labels: Vec<&str> = Condition::ALL.iter().map(|c| c.label()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), 5);
    }
}
