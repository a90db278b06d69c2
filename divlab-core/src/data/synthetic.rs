//! Synthetic price provider for offline runs.
//!
//! Generates a deterministic random walk per symbol (seeded from the symbol
//! name), so repeated runs over the same anchor produce identical bars.
//! Results produced on synthetic data are tagged by the runner.

use chrono::{DateTime, DurationRound, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{DataError, DataProvider, DataSource};
use crate::domain::{Bar, Interval, Period, PriceSeries};

/// Daily volatility of the walk, scaled down to the bar interval.
const DAILY_VOL: f64 = 0.03;

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    anchor: DateTime<Utc>,
}

impl SyntheticProvider {
    /// Bars end at the current time, floored to the bar interval.
    pub fn new() -> Self {
        Self { anchor: Utc::now() }
    }

    /// Bars end at a fixed instant; used by tests and benches.
    pub fn with_anchor(anchor: DateTime<Utc>) -> Self {
        Self { anchor }
    }

    /// Generate bars for `symbol` without going through the trait.
    pub fn generate(&self, symbol: &str, interval: Interval, period: Period) -> Vec<Bar> {
        let step = interval.duration();
        let count = (period.approx_duration().num_seconds() / step.num_seconds()).max(1) as usize;
        let end = self.anchor.duration_trunc(step).unwrap_or(self.anchor);
        let start = end - step * (count as i32 - 1);

        let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let bar_vol = DAILY_VOL * (step.num_seconds() as f64 / 86_400.0).sqrt();
        let mut price = 50.0 + rng.gen_range(0.0..200.0);
        let mut bars = Vec::with_capacity(count);

        for i in 0..count {
            let ret: f64 = rng.gen_range(-bar_vol..bar_vol);
            let open = price;
            let close = price * (1.0 + ret);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..bar_vol / 2.0));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..bar_vol / 2.0));
            let volume = rng.gen_range(10.0..1_000.0);

            bars.push(Bar {
                timestamp: start + step * i as i32,
                open,
                high,
                low,
                close,
                volume,
            });
            price = close;
        }

        bars
    }
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn fetch(
        &self,
        symbol: &str,
        interval: Interval,
        period: Period,
    ) -> Result<PriceSeries, DataError> {
        if symbol.trim().is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        Ok(PriceSeries::new(
            symbol,
            interval,
            self.generate(symbol, interval, period),
        ))
    }

    fn is_available(&self) -> bool {
        true
    }
}
