//! Domain types for bearscan

pub mod bar;
pub mod series;

pub use bar::Bar;
pub use series::Series;

/// Ticker symbol, e.g. `2330.TW`.
pub type Symbol = String;
