//! Williams %R.

use crate::indicators::rolling::{rolling_max, rolling_min};

/// Williams %R in [−100, 0]: −100 at the rolling low, 0 at the rolling high.
pub fn williams_r(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    let high_max = rolling_max(high, period);
    let low_min = rolling_min(low, period);
    (0..close.len())
        .map(|i| {
            let range = high_max[i] - low_min[i];
            -100.0 * (high_max[i] - close[i]) / range
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_between_minus_100_and_0() {
        let high: Vec<f64> = (0..40).map(|i| 101.0 + (i as f64 * 0.3).cos() * 4.0).collect();
        let low: Vec<f64> = high.iter().map(|h| h - 2.0).collect();
        let close: Vec<f64> = high.iter().map(|h| h - 1.0).collect();
        for v in williams_r(&high, &low, &close, 14) {
            if !v.is_nan() {
                assert!((-100.0..=0.0).contains(&v));
            }
        }
    }

    #[test]
    fn close_at_rolling_high_reads_zero() {
        let high: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let low: Vec<f64> = high.iter().map(|h| h - 1.0).collect();
        let close = high.clone();
        let out = williams_r(&high, &low, &close, 14);
        assert!((out[19] - 0.0).abs() < 1e-9);
    }
}
