//! Run configuration, loaded from TOML with every field defaulted.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use divlab_core::domain::{Interval, Period};
use divlab_core::signals::StrategyParams;

use crate::portfolio::SimulationParams;

/// Unique identifier for a run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Inclusive range of ratios, expanded as `start + i * step`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioRange {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl RatioRange {
    pub const TAKE_PROFIT: Self = Self {
        start: 0.01,
        stop: 0.12,
        step: 0.01,
    };

    pub const STOP_LOSS: Self = Self {
        start: 0.01,
        stop: 0.05,
        step: 0.01,
    };

    /// Number of grid points. Tolerates float error at the upper bound.
    pub fn len(&self) -> usize {
        if self.step.is_nan() || self.step <= 0.0 || self.stop < self.start {
            return 0;
        }
        ((self.stop - self.start) / self.step + 1e-9).floor() as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expanded values, rounded to 10 decimals so 0.01 * 3 prints as 0.03.
    pub fn values(&self) -> Vec<f64> {
        (0..self.len())
            .map(|i| ((self.start + i as f64 * self.step) * 1e10).round() / 1e10)
            .collect()
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(invalid(field, format!("step must be positive, got {}", self.step)));
        }
        if self.stop < self.start {
            return Err(invalid(
                field,
                format!("stop {} is below start {}", self.stop, self.start),
            ));
        }
        check_ratio(field, self.start)?;
        check_ratio(field, self.stop)
    }
}

fn check_ratio(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("ratio must be in (0, 1), got {value}")))
    }
}

/// Take-profit and stop-loss values to cross with every symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioGrid {
    pub take_profits: Vec<f64>,
    pub stop_losses: Vec<f64>,
}

impl RatioGrid {
    pub fn from_ranges(take_profit: &RatioRange, stop_loss: &RatioRange) -> Self {
        Self {
            take_profits: take_profit.values(),
            stop_losses: stop_loss.values(),
        }
    }

    /// Grid points per symbol.
    pub fn len(&self) -> usize {
        self.take_profits.len() * self.stop_losses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// (tp, sl) pairs, TP-major.
    pub fn pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.take_profits
            .iter()
            .flat_map(move |&tp| self.stop_losses.iter().map(move |&sl| (tp, sl)))
    }
}

impl Default for RatioGrid {
    fn default() -> Self {
        Self::from_ranges(&RatioRange::TAKE_PROFIT, &RatioRange::STOP_LOSS)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualConfig {
    pub take_profit: f64,
    pub stop_loss: f64,
}

impl Default for ManualConfig {
    fn default() -> Self {
        Self {
            take_profit: 0.03,
            stop_loss: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub take_profit: RatioRange,
    pub stop_loss: RatioRange,
    pub top_n: usize,
    /// Fan grid points out over rayon's thread pool.
    pub parallel: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            take_profit: RatioRange::TAKE_PROFIT,
            stop_loss: RatioRange::STOP_LOSS,
            top_n: 10,
            parallel: true,
        }
    }
}

impl SweepConfig {
    pub fn grid(&self) -> RatioGrid {
        RatioGrid::from_ranges(&self.take_profit, &self.stop_loss)
    }
}

/// Everything needed to reproduce a run, apart from the symbol list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DivLabConfig {
    pub interval: Interval,
    pub period: Period,
    pub max_symbols: usize,
    pub init_cash: f64,
    /// Units bought or sold per entry.
    pub size: f64,
    pub manual: ManualConfig,
    pub sweep: SweepConfig,
    pub strategy: StrategyParams,
}

impl Default for DivLabConfig {
    fn default() -> Self {
        Self {
            interval: Interval::default(),
            period: Period::default(),
            max_symbols: 50,
            init_cash: 1000.0,
            size: 0.1,
            manual: ManualConfig::default(),
            sweep: SweepConfig::default(),
            strategy: StrategyParams::default(),
        }
    }
}

impl DivLabConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_symbols == 0 {
            return Err(invalid("max_symbols", "must be at least 1"));
        }
        if !(self.init_cash.is_finite() && self.init_cash > 0.0) {
            return Err(invalid("init_cash", format!("must be positive, got {}", self.init_cash)));
        }
        if !(self.size.is_finite() && self.size > 0.0) {
            return Err(invalid("size", format!("must be positive, got {}", self.size)));
        }
        check_ratio("manual.take_profit", self.manual.take_profit)?;
        check_ratio("manual.stop_loss", self.manual.stop_loss)?;
        self.sweep.take_profit.validate("sweep.take_profit")?;
        self.sweep.stop_loss.validate("sweep.stop_loss")?;
        if self.sweep.top_n == 0 {
            return Err(invalid("sweep.top_n", "must be at least 1"));
        }

        let s = &self.strategy;
        if s.rsi_period == 0
            || s.wavetrend.channel_length == 0
            || s.wavetrend.average_length == 0
            || s.wavetrend.ma_length == 0
        {
            return Err(invalid("strategy", "indicator lengths must be at least 1"));
        }
        Ok(())
    }

    /// Simulation parameters for one (tp, sl) pair.
    pub fn simulation_params(&self, tp_stop: f64, sl_stop: f64) -> SimulationParams {
        SimulationParams {
            init_cash: self.init_cash,
            size: self.size,
            tp_stop,
            sl_stop,
            periods_per_year: self.interval.periods_per_year(),
        }
    }

    /// Deterministic BLAKE3 hash of this config plus the symbol list.
    ///
    /// Execution-only settings (`sweep.parallel`) are normalised first: they
    /// change how a run is scheduled, never what it produces.
    pub fn run_id(&self, symbols: &[String]) -> Result<RunId, ConfigError> {
        let mut canonical = self.clone();
        canonical.sweep.parallel = SweepConfig::default().parallel;
        let json = serde_json::to_string(&(&canonical, symbols))?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grids_have_twelve_and_five_points() {
        let grid = RatioGrid::default();
        assert_eq!(grid.take_profits.len(), 12);
        assert_eq!(grid.stop_losses.len(), 5);
        assert_eq!(grid.len(), 60);
        assert_eq!(grid.take_profits[0], 0.01);
        assert_eq!(grid.take_profits[11], 0.12);
        assert_eq!(grid.stop_losses, vec![0.01, 0.02, 0.03, 0.04, 0.05]);
    }

    #[test]
    fn pairs_are_tp_major() {
        let grid = RatioGrid {
            take_profits: vec![0.1, 0.2],
            stop_losses: vec![0.01, 0.02],
        };
        let pairs: Vec<_> = grid.pairs().collect();
        assert_eq!(pairs, vec![(0.1, 0.01), (0.1, 0.02), (0.2, 0.01), (0.2, 0.02)]);
    }

    #[test]
    fn degenerate_ranges_are_empty() {
        let r = RatioRange {
            start: 0.05,
            stop: 0.01,
            step: 0.01,
        };
        assert!(r.is_empty());
        let r = RatioRange {
            start: 0.01,
            stop: 0.05,
            step: 0.0,
        };
        assert!(r.values().is_empty());
        let single = RatioRange {
            start: 0.02,
            stop: 0.02,
            step: 0.01,
        };
        assert_eq!(single.values(), vec![0.02]);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg = DivLabConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, DivLabConfig::default());
        assert_eq!(cfg.interval, Interval::M15);
        assert_eq!(cfg.period, Period::Mo1);
        assert_eq!(cfg.max_symbols, 50);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_toml_overrides() {
        let cfg = DivLabConfig::from_toml_str(
            r#"
            interval = "1h"
            init_cash = 5000.0

            [sweep]
            top_n = 3

            [sweep.stop_loss]
            start = 0.02
            stop = 0.04
            step = 0.01

            [strategy]
            rsi_period = 21
            "#,
        )
        .unwrap();
        assert_eq!(cfg.interval, Interval::H1);
        assert_eq!(cfg.init_cash, 5000.0);
        assert_eq!(cfg.sweep.top_n, 3);
        assert_eq!(cfg.sweep.grid().stop_losses, vec![0.02, 0.03, 0.04]);
        assert_eq!(cfg.sweep.take_profit, RatioRange::TAKE_PROFIT);
        assert_eq!(cfg.strategy.rsi_period, 21);
        assert_eq!(cfg.strategy.wavetrend.channel_length, 9);
    }

    #[test]
    fn unknown_interval_is_a_parse_error() {
        let err = DivLabConfig::from_toml_str(r#"interval = "7m""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = DivLabConfig::default();
        cfg.sweep.take_profit.step = 0.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid { field: "sweep.take_profit", .. })
        ));

        let mut cfg = DivLabConfig::default();
        cfg.manual.stop_loss = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = DivLabConfig::default();
        cfg.init_cash = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn run_id_is_deterministic_and_symbol_sensitive() {
        let cfg = DivLabConfig::default();
        let a = cfg.run_id(&["BTC-USD".into()]).unwrap();
        let b = cfg.run_id(&["BTC-USD".into()]).unwrap();
        let c = cfg.run_id(&["ETH-USD".into()]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn run_id_ignores_execution_mode() {
        let parallel = DivLabConfig::default();
        let mut sequential = DivLabConfig::default();
        sequential.sweep.parallel = false;
        let symbols = vec!["BTC-USD".to_string()];
        assert_eq!(
            parallel.run_id(&symbols).unwrap(),
            sequential.run_id(&symbols).unwrap()
        );

        let mut other = DivLabConfig::default();
        other.sweep.top_n = 5;
        assert_ne!(
            parallel.run_id(&symbols).unwrap(),
            other.run_id(&symbols).unwrap()
        );
    }

    #[test]
    fn simulation_params_follow_interval() {
        let cfg = DivLabConfig::default();
        let p = cfg.simulation_params(0.03, 0.01);
        assert_eq!(p.init_cash, 1000.0);
        assert_eq!(p.size, 0.1);
        assert_eq!(p.periods_per_year, 35_040.0);
    }
}
