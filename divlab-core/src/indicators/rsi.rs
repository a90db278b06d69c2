//! Relative Strength Index (RSI).
//!
//! Average gains and losses are smoothed with `rma_of_series`: an exponentially
//! weighted mean with alpha = 1/period and adjusted (normalised) weights,
//! defined once `period` observations have been seen.
//!
//! RSI = 100 * avg_gain / (avg_gain + |avg_loss|)
//! Lookback: period. A window with no movement at all has a zero
//! denominator and yields NaN rather than a made-up midpoint.

/// Wilder-style moving average with adjusted weights:
/// `sum((1-a)^i * x[t-i]) / sum((1-a)^i)` over the observations seen so far.
///
/// Non-finite inputs produce NaN at that bar and still age the older weights.
pub fn rma_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 {
        return result;
    }

    let decay = 1.0 - 1.0 / period as f64;
    let mut num = 0.0;
    let mut den = 0.0;
    let mut observations = 0usize;

    for (i, &v) in values.iter().enumerate() {
        if v.is_finite() {
            num = v + decay * num;
            den = 1.0 + decay * den;
            observations += 1;
            if observations >= period {
                result[i] = num / den;
            }
        } else if observations > 0 {
            num *= decay;
            den *= decay;
        }
    }

    result
}

pub fn rsi_of_series(closes: &[f64], period: usize) -> Vec<f64> {
    let n = closes.len();
    if n == 0 {
        return Vec::new();
    }

    let mut gains = vec![f64::NAN; n];
    let mut losses = vec![f64::NAN; n];
    for i in 1..n {
        let change = closes[i] - closes[i - 1];
        if change.is_finite() {
            gains[i] = change.max(0.0);
            losses[i] = change.min(0.0);
        }
    }

    let avg_gain = rma_of_series(&gains, period);
    let avg_loss = rma_of_series(&losses, period);

    avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(&g, &l)| {
            let denom = g + l.abs();
            if denom == 0.0 {
                f64::NAN
            } else {
                100.0 * g / denom
            }
        })
        .collect()
}
