//! Directional Movement Index and Average Directional Index.

use crate::indicators::atr::true_range;
use crate::indicators::rolling::{rolling_mean, rolling_sum};

#[derive(Debug, Clone)]
pub struct DmiOutput {
    pub plus_di: Vec<f64>,
    pub minus_di: Vec<f64>,
    pub adx: Vec<f64>,
}

/// Wilder DMI smoothed with rolling sums.
///
/// +DM and −DM are mutually exclusive per bar: only the larger of the two
/// moves counts, and only when it is positive. DIs are scaled against the
/// true-range sum and land in [0, 100]; ADX is a rolling mean of DX.
pub fn dmi(high: &[f64], low: &[f64], close: &[f64], period: usize) -> DmiOutput {
    let n = close.len();
    let mut plus_dm = vec![0.0; n];
    let mut minus_dm = vec![0.0; n];
    for i in 1..n {
        let up = high[i] - high[i - 1];
        let down = low[i - 1] - low[i];
        if up > down && up > 0.0 {
            plus_dm[i] = up;
        }
        if down > up && down > 0.0 {
            minus_dm[i] = down;
        }
    }

    let tr_sum = rolling_sum(&true_range(high, low, close), period);
    let plus_sum = rolling_sum(&plus_dm, period);
    let minus_sum = rolling_sum(&minus_dm, period);

    let plus_di: Vec<f64> = plus_sum.iter().zip(tr_sum.iter()).map(|(dm, tr)| 100.0 * dm / tr).collect();
    let minus_di: Vec<f64> = minus_sum.iter().zip(tr_sum.iter()).map(|(dm, tr)| 100.0 * dm / tr).collect();

    let dx: Vec<f64> = plus_di
        .iter()
        .zip(minus_di.iter())
        .map(|(p, m)| {
            let sum = p + m;
            100.0 * (p - m).abs() / sum
        })
        .collect();
    let adx = rolling_mean(&dx, period);

    DmiOutput { plus_di, minus_di, adx }
}
