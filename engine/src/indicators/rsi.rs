//! Relative Strength Index.

use crate::indicators::rolling::{diff, rolling_mean};

pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const RSI_OVERSOLD: f64 = 30.0;

/// RSI over closing prices using simple rolling means of gains and losses.
///
/// Output is in [0, 100]; all-loss windows map to 0, all-gain windows to 100
/// and flat windows stay NaN (0/0 relative strength is undefined).
pub fn rsi(close: &[f64], period: usize) -> Vec<f64> {
    let delta = diff(close);
    let mut gain = vec![0.0; close.len()];
    let mut loss = vec![0.0; close.len()];
    for i in 0..close.len() {
        let d = delta[i];
        if d > 0.0 {
            gain[i] = d;
        } else if d < 0.0 {
            loss[i] = -d;
        }
        // NaN delta at bar 0 counts as neither gain nor loss
    }
    let avg_gain = rolling_mean(&gain, period);
    let avg_loss = rolling_mean(&loss, period);

    avg_gain
        .iter()
        .zip(avg_loss.iter())
        .map(|(&g, &l)| {
            if g.is_nan() || l.is_nan() {
                f64::NAN
            } else if l == 0.0 {
                if g == 0.0 {
                    f64::NAN
                } else {
                    100.0
                }
            } else {
                100.0 - 100.0 / (1.0 + g / l)
            }
        })
        .collect()
}
