//! Universe configuration: named groups of tickers.
//!
//! Stored as TOML:
//!
//! ```toml
//! [groups]
//! semiconductors = ["2330.TW", "2454.TW", "2303.TW"]
//! financials = ["2881.TW", "2882.TW"]
//! ```
//!
//! A ticker may appear in several groups; it is screened once.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    pub groups: BTreeMap<String, Vec<String>>,
}

impl Universe {
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("read universe file: {e}"))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("parse universe TOML: {e}"))
    }

    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("serialize universe: {e}"))
    }

    /// A single-group universe from an explicit ticker list.
    pub fn from_tickers(tickers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut groups = BTreeMap::new();
        groups.insert(
            "custom".to_string(),
            tickers.into_iter().map(Into::into).collect(),
        );
        Self { groups }
    }

    /// Every distinct ticker, sorted.
    pub fn all_tickers(&self) -> Vec<&str> {
        self.groups
            .values()
            .flatten()
            .map(|t| t.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn group_tickers(&self, group: &str) -> Option<&[String]> {
        self.groups.get(group).map(|v| v.as_slice())
    }

    pub fn group_names(&self) -> Vec<&str> {
        self.groups.keys().map(|s| s.as_str()).collect()
    }

    pub fn ticker_count(&self) -> usize {
        self.all_tickers().len()
    }

    /// Large, liquid TWSE names drawn from the Taiwan 50, grouped by
    /// sector. Starting from index constituents keeps illiquid names out.
    pub fn default_taiwan() -> Self {
        let group = |tickers: &[&str]| tickers.iter().map(|t| t.to_string()).collect::<Vec<_>>();
        let mut groups = BTreeMap::new();
        groups.insert(
            "semiconductors".into(),
            group(&["2330.TW", "2454.TW", "2303.TW", "3711.TW", "2379.TW", "3034.TW"]),
        );
        groups.insert(
            "electronics".into(),
            group(&["2317.TW", "2308.TW", "2382.TW", "2357.TW", "3231.TW", "2345.TW", "3008.TW"]),
        );
        groups.insert(
            "financials".into(),
            group(&["2881.TW", "2882.TW", "2891.TW", "2886.TW", "2884.TW", "2885.TW", "5880.TW"]),
        );
        groups.insert(
            "materials".into(),
            group(&["1301.TW", "1303.TW", "2002.TW", "1101.TW"]),
        );
        groups.insert(
            "shipping".into(),
            group(&["2603.TW", "2609.TW", "2615.TW"]),
        );
        groups.insert(
            "telecom".into(),
            group(&["2412.TW", "3045.TW", "4904.TW"]),
        );
        Self { groups }
    }
}
