//! Divergence signals.
//!
//! Signals depend on prices and oscillators only; they never see portfolio
//! state.

pub mod divergence;
pub mod generator;

pub use divergence::{detect_divergence, Divergence, DivergenceLevels};
pub use generator::{fshift, generate_signals, signals_from_oscillators, SignalSet, StrategyParams};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    #[error("price series has {price} bars but indicator has {indicator}")]
    LengthMismatch { price: usize, indicator: usize },
}
