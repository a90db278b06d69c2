//! DivLab Runner: configuration, simulation, metrics, sweeps and exports.
//!
//! This crate builds on `divlab-core` to provide:
//! - TOML configuration with defaults and validation
//! - Fail-fast loading of price series for a symbol list
//! - A close-price portfolio simulator with stop-loss / take-profit exits
//! - Performance metrics and drawdown analysis
//! - Manual (single symbol) runs and multi-symbol TP/SL grid sweeps
//! - JSON and CSV export of reports

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod portfolio;
pub mod runner;
pub mod sweep;

pub use config::{ConfigError, DivLabConfig, ManualConfig, RatioGrid, RatioRange, RunId, SweepConfig};
pub use data_loader::{load_series, normalize_symbols, LoadError, LoadOptions, LoadedData};
pub use metrics::{PortfolioStats, TradeStats};
pub use portfolio::{
    simulate, Direction, DrawdownEpisode, ExitReason, Portfolio, SimulationError,
    SimulationParams, Trade, TradeStatus,
};
pub use runner::{backtest_series, run_manual, ManualReport, RunError};
pub use sweep::{rank_records, run_sweep, sweep_series, PerformanceRecord, SweepReport};
