//! Entry/exit signal assembly for the WaveTrend + RSI divergence strategy.
//!
//! Raw divergences are OR-ed across both oscillators and delayed one bar so a
//! decision made on bar t's close is acted on at bar t+1. Exits mirror the
//! opposite side's entries.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::divergence::{detect_divergence, DivergenceLevels};
use super::SignalError;
use crate::domain::PriceSeries;
use crate::indicators::{compute_oscillators, Oscillators, WaveTrendParams};

/// Fixed strategy parameters. Defaults are the tuned values the strategy was
/// designed around.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParams {
    pub wavetrend: WaveTrendParams,
    pub rsi_period: usize,
    pub wavetrend_levels: DivergenceLevels,
    pub rsi_levels: DivergenceLevels,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            wavetrend: WaveTrendParams::default(),
            rsi_period: 14,
            wavetrend_levels: DivergenceLevels::WAVETREND,
            rsi_levels: DivergenceLevels::RSI,
        }
    }
}

/// The four boolean series a simulation consumes, aligned with the bars.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignalSet {
    pub long_entries: Vec<bool>,
    pub long_exits: Vec<bool>,
    pub short_entries: Vec<bool>,
    pub short_exits: Vec<bool>,
}

impl SignalSet {
    pub fn len(&self) -> usize {
        self.long_entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.long_entries.is_empty()
    }

    /// (long entries, short entries) that fired.
    pub fn signal_count(&self) -> (usize, usize) {
        let count = |v: &[bool]| v.iter().filter(|&&b| b).count();
        (count(&self.long_entries), count(&self.short_entries))
    }
}

/// Shift a boolean series forward by `periods`, filling the vacated head with false.
pub fn fshift(values: &[bool], periods: usize) -> Vec<bool> {
    let n = values.len();
    let mut out = vec![false; n];
    if periods < n {
        out[periods..].copy_from_slice(&values[..n - periods]);
    }
    out
}

/// Build signals from precomputed oscillators.
pub fn signals_from_oscillators(
    closes: &[f64],
    osc: &Oscillators,
    params: &StrategyParams,
) -> Result<SignalSet, SignalError> {
    let wt = detect_divergence(closes, &osc.wt2, params.wavetrend_levels)?;
    let rsi = detect_divergence(closes, &osc.rsi, params.rsi_levels)?;

    let raw_long: Vec<bool> = wt.bullish.iter().zip(&rsi.bullish).map(|(a, b)| *a || *b).collect();
    let raw_short: Vec<bool> = wt.bearish.iter().zip(&rsi.bearish).map(|(a, b)| *a || *b).collect();

    let long_entries = fshift(&raw_long, 1);
    let short_entries = fshift(&raw_short, 1);

    Ok(SignalSet {
        long_exits: short_entries.clone(),
        short_exits: long_entries.clone(),
        long_entries,
        short_entries,
    })
}

/// Compute oscillators and signals for one price series.
pub fn generate_signals(
    series: &PriceSeries,
    params: &StrategyParams,
) -> Result<SignalSet, SignalError> {
    let osc = compute_oscillators(series, &params.wavetrend, params.rsi_period);
    let signals = signals_from_oscillators(&series.closes(), &osc, params)?;
    let (longs, shorts) = signals.signal_count();
    debug!(symbol = %series.symbol, bars = series.len(), longs, shorts, "signals generated");
    Ok(signals)
}
