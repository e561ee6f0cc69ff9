//! The short-candidate screen.
//!
//! One pure function of a `Series`: liquidity gate, then four trend and
//! candle conditions on the most recent bar. A ticker is a candidate only
//! when every condition holds; there is no partial credit.

pub mod criteria;
pub mod score;
pub mod screener;
pub mod verdict;

pub use criteria::ScreenCriteria;
pub use score::bear_score;
pub use screener::{evaluate, Screener};
pub use verdict::{Condition, ConditionChecks, IndicatorSnapshot, TrendReadings, Verdict};
