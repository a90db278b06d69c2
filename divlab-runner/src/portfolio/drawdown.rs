//! Drawdown episodes: peak → valley → recovery spans of the value curve.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawdownStatus {
    Recovered,
    Active,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownEpisode {
    pub peak_idx: usize,
    pub valley_idx: usize,
    /// Bar where value regained the peak, or the last bar for an active episode.
    pub end_idx: usize,
    pub peak_time: DateTime<Utc>,
    pub valley_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub peak_value: f64,
    pub valley_value: f64,
    pub end_value: f64,
    /// Negative fraction, e.g. -0.05 for a 5% drawdown.
    pub drawdown: f64,
    pub status: DrawdownStatus,
}

impl DrawdownEpisode {
    pub fn duration_bars(&self) -> usize {
        self.end_idx - self.peak_idx
    }
}

/// Split a value curve into drawdown episodes, in chronological order.
///
/// An episode starts when value drops below its running peak and ends on the
/// first bar that regains it. `values` and `timestamps` must be aligned.
pub fn drawdown_episodes(values: &[f64], timestamps: &[DateTime<Utc>]) -> Vec<DrawdownEpisode> {
    let n = values.len().min(timestamps.len());
    let mut episodes = Vec::new();
    if n == 0 {
        return episodes;
    }

    let mut peak_idx = 0;
    let mut valley_idx = 0;
    let mut in_drawdown = false;

    for i in 1..n {
        let v = values[i];
        if !v.is_finite() {
            continue;
        }
        if v >= values[peak_idx] {
            if in_drawdown {
                episodes.push(episode(values, timestamps, peak_idx, valley_idx, i, DrawdownStatus::Recovered));
                in_drawdown = false;
            }
            peak_idx = i;
            valley_idx = i;
        } else {
            if !in_drawdown || v < values[valley_idx] {
                valley_idx = i;
            }
            in_drawdown = true;
        }
    }

    if in_drawdown {
        episodes.push(episode(values, timestamps, peak_idx, valley_idx, n - 1, DrawdownStatus::Active));
    }
    episodes
}

fn episode(
    values: &[f64],
    timestamps: &[DateTime<Utc>],
    peak_idx: usize,
    valley_idx: usize,
    end_idx: usize,
    status: DrawdownStatus,
) -> DrawdownEpisode {
    let peak_value = values[peak_idx];
    let valley_value = values[valley_idx];
    DrawdownEpisode {
        peak_idx,
        valley_idx,
        end_idx,
        peak_time: timestamps[peak_idx],
        valley_time: timestamps[valley_idx],
        end_time: timestamps[end_idx],
        peak_value,
        valley_value,
        end_value: values[end_idx],
        drawdown: if peak_value > 0.0 {
            (valley_value - peak_value) / peak_value
        } else {
            0.0
        },
        status,
    }
}
