//! Market-data collaborators: providers, on-disk cache, universe.
//!
//! Nothing in here is visible to the screen. The runner turns whatever
//! these return into a `Series`, or into `ScreenError::DataUnavailable`.

pub mod cache;
pub mod circuit_breaker;
pub mod csv_provider;
pub mod download;
pub mod provider;
pub mod universe;
pub mod yahoo;

pub use cache::{CacheMeta, CacheStatus, ParquetCache, MAX_TRADING_GAP_DAYS};
pub use circuit_breaker::CircuitBreaker;
pub use csv_provider::CsvProvider;
pub use download::{download_symbols, DownloadRequest, DownloadSummary};
pub use provider::{
    DataError, DataProvider, DataSource, DownloadProgress, FetchResult, RawBar, StdoutProgress,
};
pub use universe::Universe;
pub use yahoo::{normalize_symbol, YahooProvider};
