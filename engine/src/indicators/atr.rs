//! True range and Average True Range.

use crate::indicators::rolling::rolling_mean;

/// True range: max(high − low, |high − prev close|, |low − prev close|).
/// The first bar has no previous close, so its TR is just high − low.
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    (0..close.len())
        .map(|i| {
            let hl = high[i] - low[i];
            if i == 0 {
                hl
            } else {
                let hc = (high[i] - close[i - 1]).abs();
                let lc = (low[i] - close[i - 1]).abs();
                hl.max(hc).max(lc)
            }
        })
        .collect()
}

/// ATR as a simple rolling mean of the true range. Non-negative wherever
/// defined; exactly 0 over flat markets.
pub fn atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    rolling_mean(&true_range(high, low, close), period)
}
