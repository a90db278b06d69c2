//! DivLab Core: price data, oscillators, divergence signals.
//!
//! - Domain types (bars, intervals, price series)
//! - Data providers (Yahoo chart API, deterministic synthetic walk)
//! - WaveTrend, RSI and the moving averages they are built on
//! - Single-lag divergence detection and entry/exit signal assembly

pub mod data;
pub mod domain;
pub mod indicators;
pub mod signals;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types handed to rayon workers are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::PriceSeries>();
        require_sync::<domain::PriceSeries>();
        require_send::<indicators::Oscillators>();
        require_sync::<indicators::Oscillators>();
        require_send::<signals::SignalSet>();
        require_sync::<signals::SignalSet>();
        require_send::<signals::StrategyParams>();
        require_sync::<signals::StrategyParams>();
        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<data::SyntheticProvider>();
        require_sync::<data::SyntheticProvider>();
    }
}
