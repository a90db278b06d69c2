//! Price loading for the runner.
//!
//! Fetches every requested symbol from one provider, in request order.
//! The first failure aborts the whole load: a run never proceeds on a
//! partial symbol set.
//!
//! Synthetic data is a developer-only offline mode. Results produced on
//! synthetic data are tagged as such.

use thiserror::Error;
use tracing::{info, warn};

use divlab_core::data::{DataError, DataProvider, DataSource, DownloadProgress};
use divlab_core::domain::{Interval, Period, PriceSeries};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no symbols to load")]
    NoSymbols,

    #[error("failed to load '{symbol}': {source}")]
    Data {
        symbol: String,
        #[source]
        source: DataError,
    },

    #[error("provider '{0}' is unavailable (circuit breaker open)")]
    Unavailable(String),
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub interval: Interval,
    pub period: Period,
    pub max_symbols: usize,
}

#[derive(Debug, Clone)]
pub struct LoadedData {
    /// One series per symbol, in request order.
    pub series: Vec<PriceSeries>,
    pub source: DataSource,
    /// BLAKE3 over every loaded bar.
    pub dataset_hash: String,
}

impl LoadedData {
    pub fn get(&self, symbol: &str) -> Option<&PriceSeries> {
        self.series.iter().find(|s| s.symbol == symbol)
    }

    pub fn symbols(&self) -> Vec<String> {
        self.series.iter().map(|s| s.symbol.clone()).collect()
    }

    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }

    pub fn total_bars(&self) -> usize {
        self.series.iter().map(PriceSeries::len).sum()
    }
}

/// Trim, drop blanks and duplicates, keep at most `max_symbols`.
pub fn normalize_symbols<S: AsRef<str>>(raw: &[S], max_symbols: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for s in raw {
        let s = s.as_ref().trim();
        if s.is_empty() || out.iter().any(|o| o == s) {
            continue;
        }
        out.push(s.to_string());
    }
    if out.len() > max_symbols {
        warn!(
            requested = out.len(),
            max_symbols, "symbol list truncated to the configured maximum"
        );
        out.truncate(max_symbols);
    }
    out
}

/// Load bars for a set of symbols, failing fast on the first error.
pub fn load_series<S: AsRef<str>>(
    provider: &dyn DataProvider,
    symbols: &[S],
    opts: &LoadOptions,
    progress: Option<&dyn DownloadProgress>,
) -> Result<LoadedData, LoadError> {
    let symbols = normalize_symbols(symbols, opts.max_symbols);
    if symbols.is_empty() {
        return Err(LoadError::NoSymbols);
    }
    if provider.source() == DataSource::Synthetic {
        warn!("using synthetic data; results will be tagged as synthetic");
    }

    let total = symbols.len();
    let mut series = Vec::with_capacity(total);

    for (i, symbol) in symbols.iter().enumerate() {
        if !provider.is_available() {
            return Err(LoadError::Unavailable(provider.name().to_string()));
        }
        if let Some(p) = progress {
            p.on_start(symbol, i, total);
        }

        let result = provider
            .fetch(symbol, opts.interval, opts.period)
            .and_then(|s| {
                if s.is_empty() {
                    Err(DataError::EmptySeries {
                        symbol: symbol.clone(),
                        interval: opts.interval,
                        period: opts.period,
                    })
                } else {
                    Ok(s)
                }
            });

        if let Some(p) = progress {
            let summary = result.as_ref().map(PriceSeries::len).map_err(Clone::clone);
            p.on_complete(symbol, i, total, &summary);
        }

        let loaded = result.map_err(|source| LoadError::Data {
            symbol: symbol.clone(),
            source,
        })?;
        let void_rate = loaded.void_rate();
        if void_rate > 0.0 {
            warn!(symbol = %loaded.symbol, void_rate, "series has bars with missing prices");
        }
        series.push(loaded);
    }

    let dataset_hash = compute_dataset_hash(&series);
    let data = LoadedData {
        series,
        source: provider.source(),
        dataset_hash,
    };
    info!(
        symbols = total,
        bars = data.total_bars(),
        provider = provider.name(),
        "price data loaded"
    );
    Ok(data)
}

/// Deterministic BLAKE3 hash over symbols, timestamps and OHLCV values.
fn compute_dataset_hash(series: &[PriceSeries]) -> String {
    let mut hasher = blake3::Hasher::new();
    for s in series {
        hasher.update(s.symbol.as_bytes());
        for bar in &s.bars {
            hasher.update(&bar.timestamp.timestamp().to_le_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use divlab_core::data::SyntheticProvider;

    fn provider() -> SyntheticProvider {
        SyntheticProvider::with_anchor(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
    }

    fn opts() -> LoadOptions {
        LoadOptions {
            interval: Interval::M15,
            period: Period::D5,
            max_symbols: 50,
        }
    }

    struct FailingProvider;

    impl DataProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }
        fn source(&self) -> DataSource {
            DataSource::YahooFinance
        }
        fn fetch(&self, symbol: &str, _: Interval, _: Period) -> Result<PriceSeries, DataError> {
            if symbol == "BAD" {
                Err(DataError::SymbolNotFound {
                    symbol: symbol.into(),
                })
            } else {
                Ok(PriceSeries::new(symbol, Interval::M15, Vec::new()))
            }
        }
        fn is_available(&self) -> bool {
            true
        }
    }

    #[test]
    fn normalize_trims_dedups_and_caps() {
        let raw = [" BTC-USD", "", "ETH-USD ", "BTC-USD", "SOL-USD"];
        assert_eq!(normalize_symbols(&raw, 50), vec!["BTC-USD", "ETH-USD", "SOL-USD"]);
        assert_eq!(normalize_symbols(&raw, 2), vec!["BTC-USD", "ETH-USD"]);
    }

    #[test]
    fn loads_in_request_order() {
        let data = load_series(&provider(), &["SOL-USD", "BTC-USD"], &opts(), None).unwrap();
        assert_eq!(data.symbols(), vec!["SOL-USD", "BTC-USD"]);
        assert!(data.is_synthetic());
        assert_eq!(data.get("BTC-USD").unwrap().len(), 5 * 24 * 4);
        assert_eq!(data.dataset_hash.len(), 64);
    }

    #[test]
    fn hash_is_deterministic() {
        let a = load_series(&provider(), &["BTC-USD"], &opts(), None).unwrap();
        let b = load_series(&provider(), &["BTC-USD"], &opts(), None).unwrap();
        assert_eq!(a.dataset_hash, b.dataset_hash);
    }

    #[test]
    fn empty_symbol_list_fails() {
        let err = load_series(&provider(), &["  ", ""], &opts(), None).unwrap_err();
        assert!(matches!(err, LoadError::NoSymbols));
    }

    #[test]
    fn first_failure_aborts() {
        let err = load_series(&FailingProvider, &["BAD", "GOOD"], &opts(), None).unwrap_err();
        match err {
            LoadError::Data { symbol, source } => {
                assert_eq!(symbol, "BAD");
                assert!(matches!(source, DataError::SymbolNotFound { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_series_is_an_error() {
        let err = load_series(&FailingProvider, &["GOOD"], &opts(), None).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Data {
                source: DataError::EmptySeries { .. },
                ..
            }
        ));
    }
}
