//! Single-lag divergence between price and an oscillator.
//!
//! Compares bar t only against bar t-1. There is no pivot detection: a bar
//! diverges when price and oscillator step in opposite directions while the
//! oscillator sits in its extreme zone.

use serde::{Deserialize, Serialize};

use super::SignalError;

/// Overbought / oversold thresholds for one oscillator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DivergenceLevels {
    pub overbought: f64,
    pub oversold: f64,
}

impl DivergenceLevels {
    pub const WAVETREND: Self = Self {
        overbought: 53.0,
        oversold: -53.0,
    };

    pub const RSI: Self = Self {
        overbought: 60.0,
        oversold: 30.0,
    };
}

/// Per-bar bullish and bearish flags.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Divergence {
    pub bullish: Vec<bool>,
    pub bearish: Vec<bool>,
}

impl Divergence {
    pub fn len(&self) -> usize {
        self.bullish.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bullish.is_empty()
    }
}

/// Detect bullish and bearish divergence bar by bar.
///
/// Comparisons involving NaN are false, so undefined oscillator values never
/// signal.
pub fn detect_divergence(
    price: &[f64],
    indicator: &[f64],
    levels: DivergenceLevels,
) -> Result<Divergence, SignalError> {
    if price.len() != indicator.len() {
        return Err(SignalError::LengthMismatch {
            price: price.len(),
            indicator: indicator.len(),
        });
    }

    let n = price.len();
    let mut bullish = vec![false; n];
    let mut bearish = vec![false; n];

    for t in 1..n {
        let (p, p_prev) = (price[t], price[t - 1]);
        let (v, v_prev) = (indicator[t], indicator[t - 1]);

        bullish[t] = p < p_prev && v > v_prev && v <= levels.oversold;
        bearish[t] = p > p_prev && v < v_prev && v >= levels.overbought;
    }

    Ok(Divergence { bullish, bearish })
}

#[cfg(test)]
mod tests {
    use super::*;

    const OVERSOLD_30: DivergenceLevels = DivergenceLevels {
        overbought: 70.0,
        oversold: 30.0,
    };

    #[test]
    fn bullish_when_price_falls_and_oscillator_rises_in_zone() {
        let d = detect_divergence(&[100.0, 99.0, 98.0], &[10.0, 20.0, 25.0], OVERSOLD_30).unwrap();
        assert_eq!(d.bullish, vec![false, true, true]);
        assert_eq!(d.bearish, vec![false, false, false]);
    }

    #[test]
    fn no_bullish_when_oscillator_leaves_zone() {
        let d = detect_divergence(&[100.0, 99.0, 98.0], &[20.0, 40.0, 20.0], OVERSOLD_30).unwrap();
        assert_eq!(d.bullish, vec![false, false, false]);
    }

    #[test]
    fn bearish_mirror() {
        let d = detect_divergence(&[100.0, 101.0, 102.0], &[90.0, 80.0, 75.0], OVERSOLD_30).unwrap();
        assert_eq!(d.bearish, vec![false, true, true]);
        assert_eq!(d.bullish, vec![false, false, false]);
    }

    #[test]
    fn threshold_is_inclusive() {
        let d = detect_divergence(&[10.0, 9.0], &[20.0, 30.0], OVERSOLD_30).unwrap();
        assert!(d.bullish[1]);
        let d = detect_divergence(&[10.0, 11.0], &[80.0, 70.0], OVERSOLD_30).unwrap();
        assert!(d.bearish[1]);
    }

    #[test]
    fn equal_prices_never_diverge() {
        let d = detect_divergence(&[10.0, 10.0], &[10.0, 20.0], OVERSOLD_30).unwrap();
        assert!(!d.bullish[1]);
    }

    #[test]
    fn nan_operands_are_false() {
        let d = detect_divergence(
            &[100.0, 99.0, f64::NAN, 97.0],
            &[10.0, f64::NAN, 20.0, 25.0],
            OVERSOLD_30,
        )
        .unwrap();
        assert_eq!(d.bullish, vec![false; 4]);
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let err = detect_divergence(&[1.0, 2.0], &[1.0], OVERSOLD_30).unwrap_err();
        assert_eq!(
            err,
            SignalError::LengthMismatch {
                price: 2,
                indicator: 1
            }
        );
    }

    #[test]
    fn empty_input() {
        let d = detect_divergence(&[], &[], OVERSOLD_30).unwrap();
        assert!(d.is_empty());
    }
}
