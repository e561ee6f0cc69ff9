//! bearscan core: domain types, indicators, the short-candidate screen and
//! the market-data collaborators that feed it.
//!
//! - Domain types (bars, per-ticker series)
//! - Simple moving averages over close or volume
//! - The screen: liquidity, downtrend-break, bearish candle, overheated
//!   deviation and volume-up-on-decline, combined into one verdict
//! - Data providers (Yahoo Finance, CSV), Parquet cache, universe config

pub mod data;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod screen;

pub use domain::{Bar, Series};
pub use error::ScreenError;
pub use screen::{evaluate, Screener, ScreenCriteria, Verdict};
