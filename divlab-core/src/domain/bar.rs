//! One OHLCV candle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single symbol at a fixed intraday interval.
///
/// Timestamps are UTC bar-open times. Fields the provider left empty are
/// stored as `NaN` so that every derived series keeps the same index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Typical price `(high + low + close) / 3`.
    pub fn hlc3(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Any OHLC field missing.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Low and high bracket open and close, and the close is positive.
    pub fn is_sane(&self) -> bool {
        !self.is_void()
            && self.close > 0.0
            && self.low <= self.open.min(self.close)
            && self.high >= self.open.max(self.close)
            && self.high >= self.low
    }
}
