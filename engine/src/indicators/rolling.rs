//! Rolling-window primitives shared by the indicator families.
//!
//! All helpers emit NaN for warm-up bars and for any window that contains a
//! NaN input, so insufficient history propagates instead of silently
//! producing partial values.

/// Rolling arithmetic mean over `window` bars.
pub(crate) fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, |w| w.iter().sum::<f64>() / w.len() as f64)
}

/// Rolling sum over `window` bars.
pub(crate) fn rolling_sum(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, |w| w.iter().sum::<f64>())
}

/// Rolling minimum over `window` bars.
pub(crate) fn rolling_min(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
}

/// Rolling maximum over `window` bars.
pub(crate) fn rolling_max(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, |w| w.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

/// Rolling mean of the absolute values over `window` bars.
pub(crate) fn rolling_mean_abs_of(values: &[f64], window: usize) -> Vec<f64> {
    let abs: Vec<f64> = values.iter().map(|v| v.abs()).collect();
    rolling_mean(&abs, window)
}

/// Rolling sample standard deviation (ddof = 1) over `window` bars.
pub(crate) fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    rolling_apply(values, window, |w| {
        if w.len() < 2 {
            return f64::NAN;
        }
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        let var = w.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (w.len() - 1) as f64;
        var.sqrt()
    })
}

/// Rolling mean with `min_periods = 1`: bars before a full window average
/// whatever history exists. Required by the Supertrend ATR seed.
pub(crate) fn rolling_mean_min1(values: &[f64], window: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    for i in 0..values.len() {
        let start = (i + 1).saturating_sub(window.max(1));
        let w = &values[start..=i];
        if w.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[i] = w.iter().sum::<f64>() / w.len() as f64;
    }
    out
}

/// First differences; index 0 is NaN.
pub(crate) fn diff(values: &[f64]) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    for i in 1..values.len() {
        out[i] = values[i] - values[i - 1];
    }
    out
}

fn rolling_apply(values: &[f64], window: usize, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if window == 0 {
        return out;
    }
    for i in 0..values.len() {
        if i + 1 < window {
            continue;
        }
        let w = &values[i + 1 - window..=i];
        if w.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[i] = f(w);
    }
    out
}
