//! Stochastic oscillator.

use crate::indicators::rolling::{rolling_max, rolling_mean, rolling_min};

#[derive(Debug, Clone)]
pub struct StochasticOutput {
    /// Smoothed %K in [0, 100].
    pub k: Vec<f64>,
    /// %D, a moving average of %K.
    pub d: Vec<f64>,
}

/// Stochastic %K/%D. Raw %K is the position of the close within the rolling
/// high-low range; `smooth_k` smooths it and `d_period` smooths again for %D.
/// Flat ranges (high == low over the window) stay NaN.
pub fn stochastic(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    k_period: usize,
    smooth_k: usize,
    d_period: usize,
) -> StochasticOutput {
    let low_min = rolling_min(low, k_period);
    let high_max = rolling_max(high, k_period);

    let raw: Vec<f64> = (0..close.len())
        .map(|i| {
            let range = high_max[i] - low_min[i];
            100.0 * (close[i] - low_min[i]) / range
        })
        .collect();

    let k = rolling_mean(&raw, smooth_k);
    let d = rolling_mean(&k, d_period);
    StochasticOutput { k, d }
}
