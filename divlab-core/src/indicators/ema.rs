//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (period + 1).
//! Seed: EMA[period-1] = mean of the finite values among the first `period`
//! inputs. When that window has none (an input that is itself a warming-up
//! series), the recursion starts at the first finite input after it.
//! A non-finite input after the seed yields NaN at that bar only; the
//! recursion resumes from the last defined state.

/// Compute EMA values from a pre-extracted f64 slice.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return result;
    }

    let alpha = 2.0 / (period as f64 + 1.0);

    let (seed_idx, seed) = {
        let window = &values[..period];
        let finite: Vec<f64> = window.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            match values[period..].iter().position(|v| v.is_finite()) {
                Some(offset) => (period + offset, values[period + offset]),
                None => return result,
            }
        } else {
            (period - 1, finite.iter().sum::<f64>() / finite.len() as f64)
        }
    };
    result[seed_idx] = seed;

    let mut prev = seed;
    for i in (seed_idx + 1)..n {
        let v = values[i];
        if !v.is_finite() {
            continue;
        }
        prev = alpha * v + (1.0 - alpha) * prev;
        result[i] = prev;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn ema_period_1_equals_input() {
        let result = ema_of_series(&[100.0, 200.0, 300.0], 1);
        assert_approx(result[0], 100.0, DEFAULT_EPSILON);
        assert_approx(result[1], 200.0, DEFAULT_EPSILON);
        assert_approx(result[2], 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_3_known_values() {
        // alpha = 0.5, seed at index 2 = SMA(10,11,12) = 11
        // EMA[3] = 0.5*13 + 0.5*11 = 12, EMA[4] = 0.5*14 + 0.5*12 = 13
        let result = ema_of_series(&[10.0, 11.0, 12.0, 13.0, 14.0], 3);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 11.0, DEFAULT_EPSILON);
        assert_approx(result[3], 12.0, DEFAULT_EPSILON);
        assert_approx(result[4], 13.0, DEFAULT_EPSILON);
    }

    #[test]
    fn seed_skips_leading_nan() {
        // Only one finite value in the seed window: seed = 5
        let result = ema_of_series(&[f64::NAN, f64::NAN, 5.0, 7.0], 3);
        assert!(result[1].is_nan());
        assert_approx(result[2], 5.0, DEFAULT_EPSILON);
        assert_approx(result[3], 6.0, DEFAULT_EPSILON);
    }

    #[test]
    fn seed_after_window_when_window_is_all_nan() {
        let result = ema_of_series(&[f64::NAN, f64::NAN, f64::NAN, 8.0, 10.0], 2);
        assert!(result[2].is_nan());
        assert_approx(result[3], 8.0, DEFAULT_EPSILON);
        // alpha = 2/3
        assert_approx(result[4], 2.0 / 3.0 * 10.0 + 1.0 / 3.0 * 8.0, DEFAULT_EPSILON);
    }

    #[test]
    fn interior_nan_is_local() {
        let result = ema_of_series(&[10.0, 11.0, 12.0, f64::NAN, 14.0], 3);
        assert_approx(result[2], 11.0, DEFAULT_EPSILON);
        assert!(result[3].is_nan());
        // resumes from 11.0
        assert_approx(result[4], 12.5, DEFAULT_EPSILON);
    }

    #[test]
    fn all_nan_input_stays_nan() {
        let result = ema_of_series(&[f64::NAN; 6], 3);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn too_few_values() {
        let result = ema_of_series(&[1.0, 2.0], 3);
        assert!(result.iter().all(|v| v.is_nan()));
        assert!(ema_of_series(&[], 3).is_empty());
        assert!(ema_of_series(&[1.0, 2.0], 0).iter().all(|v| v.is_nan()));
    }
}
