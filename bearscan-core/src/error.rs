//! Per-ticker screening errors.
//!
//! Every variant excludes the ticker from the candidate set. None of them
//! stops a scan: the runner records the exclusion and moves on.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum ScreenError {
    #[error("insufficient data: need {required} bars, have {available}")]
    InsufficientData { required: usize, available: usize },

    /// The series stops short of the evaluation date: its last bar is more
    /// than a weekend or short holiday before `as_of`.
    #[error("insufficient data: last bar {last_bar} is too far before {as_of}")]
    MissingTrailingBars { last_bar: NaiveDate, as_of: NaiveDate },

    #[error("invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: String },

    #[error("data unavailable: {reason}")]
    DataUnavailable { reason: String },
}

impl ScreenError {
    /// Short label for tables and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ScreenError::InsufficientData { .. } | ScreenError::MissingTrailingBars { .. } => {
                "insufficient-data"
            }
            ScreenError::InvalidBar { .. } => "invalid-bar",
            ScreenError::DataUnavailable { .. } => "unavailable",
        }
    }

    /// True when the ticker never produced a usable series (fetch failure).
    /// Treated like `InsufficientData` by the screen, but counted separately
    /// so the UI can warn about a mostly-unreachable universe.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, ScreenError::DataUnavailable { .. })
    }
}
