//! Simple Moving Average (SMA).
//!
//! Rolling mean over a fixed window. NaN while the window is incomplete or
//! contains a non-finite value.

pub fn sma_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return result;
    }

    for (i, window) in values.windows(period).enumerate() {
        if window.iter().all(|v| v.is_finite()) {
            result[i + period - 1] = window.iter().sum::<f64>() / period as f64;
        }
    }

    result
}
