//! WaveTrend oscillator.
//!
//! esa = EMA(hlc3, channel), de = EMA(|hlc3 - esa|, channel),
//! ci = (hlc3 - esa) / (0.015 * de), wt1 = EMA(ci, average), wt2 = SMA(wt1, ma).
//!
//! A zero deviation (flat price over the channel) leaves `ci` undefined at
//! that bar; the NaN flows into `wt1`/`wt2` for the bars that read it.

use serde::{Deserialize, Serialize};

use super::{ema_of_series, sma_of_series};

/// Scales the channel index so that typical swings land around +/-60.
const CI_SCALE: f64 = 0.015;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTrendParams {
    pub channel_length: usize,
    pub average_length: usize,
    pub ma_length: usize,
}

impl Default for WaveTrendParams {
    fn default() -> Self {
        Self {
            channel_length: 9,
            average_length: 12,
            ma_length: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaveTrendOutput {
    pub wt1: Vec<f64>,
    pub wt2: Vec<f64>,
}

/// Compute WaveTrend lines from typical prices.
pub fn wavetrend(hlc3: &[f64], params: &WaveTrendParams) -> WaveTrendOutput {
    let esa = ema_of_series(hlc3, params.channel_length);
    let abs_dev: Vec<f64> = hlc3.iter().zip(&esa).map(|(p, e)| (p - e).abs()).collect();
    let de = ema_of_series(&abs_dev, params.channel_length);

    let ci: Vec<f64> = hlc3
        .iter()
        .zip(&esa)
        .zip(&de)
        .map(|((p, e), d)| {
            if d.is_finite() && *d != 0.0 {
                (p - e) / (CI_SCALE * d)
            } else {
                f64::NAN
            }
        })
        .collect();

    let wt1 = ema_of_series(&ci, params.average_length);
    let wt2 = sma_of_series(&wt1, params.ma_length);
    WaveTrendOutput { wt1, wt2 }
}
