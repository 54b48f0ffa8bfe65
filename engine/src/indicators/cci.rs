//! Commodity Channel Index.

use crate::indicators::rolling::{rolling_mean, rolling_mean_abs_of};

/// CCI over the typical price with the 0.015 Lambert constant. Unbounded.
pub fn cci(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    let tp: Vec<f64> = (0..close.len())
        .map(|i| (high[i] + low[i] + close[i]) / 3.0)
        .collect();
    let sma_tp = rolling_mean(&tp, period);
    // deviation of typical price from its own SMA, then a rolling mean of
    // the absolute deviations
    let dev: Vec<f64> = tp.iter().zip(sma_tp.iter()).map(|(t, s)| t - s).collect();
    let mean_dev = rolling_mean_abs_of(&dev, period);

    (0..close.len())
        .map(|i| (tp[i] - sma_tp[i]) / (0.015 * mean_dev[i]))
        .collect()
}
