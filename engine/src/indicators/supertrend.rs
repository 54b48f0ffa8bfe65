//! Supertrend: an ATR-band state indicator with a binary direction.
//!
//! The recursion is inherently sequential: each bar's direction depends on
//! the previous bar's direction and bands. Do not parallelize across bars;
//! parallelism belongs one level up, across symbols.

use crate::indicators::atr::true_range;
use crate::indicators::rolling::rolling_mean_min1;

#[derive(Debug, Clone, PartialEq)]
pub struct SupertrendOutput {
    /// Band price tracking the trend: the lower band while bullish, the
    /// upper band while bearish. Bar 0 is seeded with 0.0.
    pub value: Vec<f64>,
    /// +1 bullish, −1 bearish. Bar 0 is seeded bullish.
    pub direction: Vec<i8>,
}

impl SupertrendOutput {
    pub fn latest_direction(&self) -> i8 {
        *self.direction.last().unwrap_or(&1)
    }

    pub fn latest_value(&self) -> f64 {
        *self.value.last().unwrap_or(&f64::NAN)
    }
}

/// Supertrend over (high, low, close).
///
/// The ATR here is a simple moving average of the true range with
/// `min_periods = 1`, so bands are defined from the very first bar. Direction
/// flips only when the close breaks the previous bar's opposite band;
/// otherwise it carries over, which keeps the indicator stable through flat
/// stretches (TR = 0 keeps the bands glued to hl2 and the direction sticky).
pub fn supertrend(high: &[f64], low: &[f64], close: &[f64], period: usize, multiplier: f64) -> SupertrendOutput {
    let n = close.len();
    let atr = rolling_mean_min1(&true_range(high, low, close), period);

    let mut upperband = Vec::with_capacity(n);
    let mut lowerband = Vec::with_capacity(n);
    for i in 0..n {
        let hl2 = (high[i] + low[i]) / 2.0;
        upperband.push(hl2 + multiplier * atr[i]);
        lowerband.push(hl2 - multiplier * atr[i]);
    }

    let mut direction = vec![1i8; n];
    let mut value = vec![0.0; n];
    for i in 1..n {
        direction[i] = if close[i] > upperband[i - 1] {
            1
        } else if close[i] < lowerband[i - 1] {
            -1
        } else {
            direction[i - 1]
        };
        value[i] = if direction[i] == 1 { lowerband[i] } else { upperband[i] };
    }

    SupertrendOutput { value, direction }
}
