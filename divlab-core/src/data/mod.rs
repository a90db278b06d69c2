//! Price data providers

pub mod circuit_breaker;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use provider::{DataError, DataProvider, DataSource, DownloadProgress, LogProgress};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
