//! Single-symbol runner: load, signal, simulate, report.
//!
//! `run_manual()` is the CLI entry point for one symbol and one
//! take-profit / stop-loss pair. `backtest_series()` is the shared step the
//! sweep reuses for every grid point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use divlab_core::data::{DataProvider, DownloadProgress};
use divlab_core::domain::{Interval, Period, PriceSeries};
use divlab_core::signals::{generate_signals, SignalError, SignalSet};

use crate::config::{ConfigError, DivLabConfig, RunId};
use crate::data_loader::{load_series, LoadError, LoadOptions};
use crate::metrics::{PortfolioStats, TradeStats};
use crate::portfolio::{simulate, DrawdownEpisode, Portfolio, SimulationError, SimulationParams, Trade};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("signal error: {0}")]
    Signal(#[from] SignalError),
    #[error("simulation failed for '{symbol}': {source}")]
    Simulation {
        symbol: String,
        #[source]
        source: SimulationError,
    },
}

/// Everything the manual mode reports for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualReport {
    pub run_id: RunId,
    pub symbol: String,
    pub interval: Interval,
    pub period: Period,
    pub tp_ratio: f64,
    pub sl_ratio: f64,
    pub synthetic: bool,
    pub dataset_hash: String,
    pub long_signals: usize,
    pub short_signals: usize,
    pub stats: PortfolioStats,
    pub trade_stats: TradeStats,
    pub positions: Vec<Trade>,
    pub drawdowns: Vec<DrawdownEpisode>,
    pub timestamps: Vec<DateTime<Utc>>,
    pub values: Vec<f64>,
    pub drawdown_series: Vec<f64>,
}

impl ManualReport {
    fn from_portfolio(
        header: ReportHeader,
        signals: &SignalSet,
        portfolio: &Portfolio,
    ) -> Self {
        let (long_signals, short_signals) = signals.signal_count();
        Self {
            run_id: header.run_id,
            symbol: header.symbol,
            interval: header.interval,
            period: header.period,
            tp_ratio: portfolio.params().tp_stop,
            sl_ratio: portfolio.params().sl_stop,
            synthetic: header.synthetic,
            dataset_hash: header.dataset_hash,
            long_signals,
            short_signals,
            stats: portfolio.stats(),
            trade_stats: portfolio.trade_stats(),
            positions: portfolio.positions().to_vec(),
            drawdowns: portfolio.drawdowns(),
            timestamps: portfolio.timestamps().to_vec(),
            values: portfolio.values().to_vec(),
            drawdown_series: portfolio.drawdown_series(),
        }
    }
}

struct ReportHeader {
    run_id: RunId,
    symbol: String,
    interval: Interval,
    period: Period,
    synthetic: bool,
    dataset_hash: String,
}

/// Simulate precomputed signals over one series.
pub fn backtest_series(
    series: &PriceSeries,
    signals: &SignalSet,
    params: &SimulationParams,
) -> Result<Portfolio, RunError> {
    simulate(&series.closes(), &series.timestamps(), signals, params).map_err(|source| {
        RunError::Simulation {
            symbol: series.symbol.clone(),
            source,
        }
    })
}

/// Backtest one symbol with the given take-profit and stop-loss ratios.
pub fn run_manual(
    config: &DivLabConfig,
    provider: &dyn DataProvider,
    symbol: &str,
    tp_ratio: f64,
    sl_ratio: f64,
    progress: Option<&dyn DownloadProgress>,
) -> Result<ManualReport, RunError> {
    config.validate()?;
    let opts = LoadOptions {
        interval: config.interval,
        period: config.period,
        max_symbols: 1,
    };
    let data = load_series(provider, &[symbol], &opts, progress)?;
    // load_series fails with NoSymbols rather than returning an empty set.
    let series = data.series.first().ok_or(LoadError::NoSymbols)?;

    let run_id = config.run_id(&data.symbols())?;
    let signals = generate_signals(series, &config.strategy)?;
    let params = config.simulation_params(tp_ratio, sl_ratio);
    let portfolio = backtest_series(series, &signals, &params)?;

    info!(
        symbol = %series.symbol,
        bars = series.len(),
        trades = portfolio.positions().len(),
        total_return = portfolio.total_return(),
        "manual backtest complete"
    );

    let header = ReportHeader {
        run_id,
        symbol: series.symbol.clone(),
        interval: config.interval,
        period: config.period,
        synthetic: data.is_synthetic(),
        dataset_hash: data.dataset_hash.clone(),
    };
    Ok(ManualReport::from_portfolio(header, &signals, &portfolio))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use divlab_core::data::SyntheticProvider;

    fn provider() -> SyntheticProvider {
        SyntheticProvider::with_anchor(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn manual_report_is_consistent() {
        let cfg = DivLabConfig::default();
        let report = run_manual(&cfg, &provider(), "BTC-USD", 0.03, 0.01, None).unwrap();

        assert_eq!(report.symbol, "BTC-USD");
        assert!(report.synthetic);
        assert_eq!(report.values.len(), 30 * 24 * 4);
        assert_eq!(report.timestamps.len(), report.values.len());
        assert_eq!(report.drawdown_series.len(), report.values.len());
        assert_eq!(report.stats.bars, report.values.len());
        assert_eq!(report.tp_ratio, 0.03);
        assert_eq!(report.sl_ratio, 0.01);
        assert_eq!(report.trade_stats.total_trades, report.positions.len());

        let expected = (report.values[report.values.len() - 1] - 1000.0) / 1000.0;
        assert!((report.stats.total_return - expected).abs() < 1e-12);
        assert!(report.stats.max_drawdown <= 0.0);
    }

    #[test]
    fn manual_is_deterministic() {
        let cfg = DivLabConfig::default();
        let a = run_manual(&cfg, &provider(), "ETH-USD", 0.03, 0.01, None).unwrap();
        let b = run_manual(&cfg, &provider(), "ETH-USD", 0.03, 0.01, None).unwrap();
        assert_eq!(a.run_id, b.run_id);
        assert_eq!(a.values, b.values);
        assert_eq!(a.positions, b.positions);
    }

    #[test]
    fn invalid_config_is_rejected_before_loading() {
        let mut cfg = DivLabConfig::default();
        cfg.size = -1.0;
        let err = run_manual(&cfg, &provider(), "BTC-USD", 0.03, 0.01, None).unwrap_err();
        assert!(matches!(err, RunError::Config(_)));
    }

    #[test]
    fn blank_symbol_is_a_data_error() {
        let err = run_manual(&DivLabConfig::default(), &provider(), " ", 0.03, 0.01, None)
            .unwrap_err();
        assert!(matches!(err, RunError::Data(LoadError::NoSymbols)));
    }
}
