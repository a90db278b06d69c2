//! PriceSeries: one symbol's bars at a fixed interval over one lookback window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bar::Bar;
use super::interval::Interval;

/// Time-ordered bars for one symbol. Immutable once loaded; every oscillator
/// and signal derived from it is aligned 1:1 with `bars`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub interval: Interval,
    pub bars: Vec<Bar>,
}

impl PriceSeries {
    /// Build a series, sorting bars by timestamp and dropping duplicate
    /// timestamps (the later row wins).
    pub fn new(symbol: impl Into<String>, interval: Interval, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.timestamp);
        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.timestamp == bar.timestamp => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Self {
            symbol: symbol.into(),
            interval,
            bars: deduped,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn hlc3(&self) -> Vec<f64> {
        self.bars.iter().map(Bar::hlc3).collect()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.bars.iter().map(|b| b.timestamp).collect()
    }

    /// Fraction of bars with at least one NaN OHLC field.
    pub fn void_rate(&self) -> f64 {
        if self.bars.is_empty() {
            return 0.0;
        }
        let void = self.bars.iter().filter(|b| b.is_void()).count();
        void as f64 / self.bars.len() as f64
    }
}
