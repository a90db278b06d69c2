//! Where bars come from.
//!
//! A run talks to exactly one `DataProvider`: the Yahoo chart client for real
//! runs, the synthetic walk offline, or a stub in tests.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Interval, Period, PriceSeries};

/// Every way a price fetch can fail. All of them abort the run.
#[derive(Debug, Clone, Error)]
pub enum DataError {
    #[error("could not reach the chart API: {0}")]
    NetworkUnreachable(String),

    #[error("chart API rate limit hit, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("unexpected chart response: {0}")]
    ResponseFormatChanged(String),

    #[error("chart API refused access: {0}")]
    AuthenticationRequired(String),

    #[error("unknown symbol '{symbol}'")]
    SymbolNotFound { symbol: String },

    #[error("no bars returned for '{symbol}' at {interval} over {period}")]
    EmptySeries {
        symbol: String,
        interval: Interval,
        period: Period,
    },

    #[error("requests blocked until the circuit breaker cools down")]
    CircuitBreakerTripped,

    #[error("{0}")]
    Other(String),
}

/// Tags results so synthetic runs are never mistaken for market data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    Synthetic,
}

pub trait DataProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn source(&self) -> DataSource;

    /// Fetch OHLCV bars for one symbol at `interval` over the trailing `period`.
    fn fetch(
        &self,
        symbol: &str,
        interval: Interval,
        period: Period,
    ) -> Result<PriceSeries, DataError>;

    /// False while the provider refuses requests (breaker open).
    fn is_available(&self) -> bool;
}

/// Progress callback for multi-symbol loads.
pub trait DownloadProgress: Send + Sync {
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    fn on_complete(&self, symbol: &str, index: usize, total: usize, result: &Result<usize, DataError>);
}

/// Progress reporter that logs through `tracing`.
pub struct LogProgress;

impl DownloadProgress for LogProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        tracing::info!("[{}/{}] fetching {symbol}", index + 1, total);
    }

    fn on_complete(&self, symbol: &str, _index: usize, _total: usize, result: &Result<usize, DataError>) {
        match result {
            Ok(bars) => tracing::info!(symbol, bars, "fetched"),
            Err(e) => tracing::error!(symbol, error = %e, "fetch failed"),
        }
    }
}
