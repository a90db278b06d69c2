//! Oscillator computations.
//!
//! Every indicator is a pure function of its input series and returns a
//! `Vec<f64>` aligned 1:1 with it. Warmup positions and undefined values
//! are `f64::NAN`; nothing here panics on degenerate input.

pub mod ema;
pub mod rsi;
pub mod sma;
pub mod wavetrend;

pub use ema::ema_of_series;
pub use rsi::{rma_of_series, rsi_of_series};
pub use sma::sma_of_series;
pub use wavetrend::{wavetrend, WaveTrendOutput, WaveTrendParams};

use serde::{Deserialize, Serialize};

use crate::domain::PriceSeries;

/// The oscillators the divergence strategy reads, aligned with the price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Oscillators {
    pub wt1: Vec<f64>,
    pub wt2: Vec<f64>,
    pub rsi: Vec<f64>,
}

impl Oscillators {
    pub fn len(&self) -> usize {
        self.rsi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rsi.is_empty()
    }
}

/// Compute WaveTrend over `hlc3` and RSI over closes for one series.
pub fn compute_oscillators(
    series: &PriceSeries,
    wavetrend_params: &WaveTrendParams,
    rsi_period: usize,
) -> Oscillators {
    let wt = wavetrend(&series.hlc3(), wavetrend_params);
    let rsi = rsi_of_series(&series.closes(), rsi_period);
    Oscillators {
        wt1: wt.wt1,
        wt2: wt.wt2,
        rsi,
    }
}

/// Create synthetic bars from close prices for testing.
///
/// open = prev_close (or close for the first bar), high = max(open,close) + 1.0,
/// low = min(open,close) - 1.0, one bar every 15 minutes.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            crate::domain::Bar {
                timestamp: base + chrono::Duration::minutes(15 * i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
