//! Bollinger Bands.

use crate::indicators::rolling::{rolling_mean, rolling_std};

#[derive(Debug, Clone)]
pub struct BollingerOutput {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
    pub width: Vec<f64>,
}

/// Bands at `middle ± stddev · σ` where σ is the rolling sample standard
/// deviation of the close.
pub fn bollinger(close: &[f64], period: usize, stddev: f64) -> BollingerOutput {
    let middle = rolling_mean(close, period);
    let sigma = rolling_std(close, period);
    let upper: Vec<f64> = middle.iter().zip(sigma.iter()).map(|(m, s)| m + stddev * s).collect();
    let lower: Vec<f64> = middle.iter().zip(sigma.iter()).map(|(m, s)| m - stddev * s).collect();
    let width: Vec<f64> = upper.iter().zip(lower.iter()).map(|(u, l)| u - l).collect();
    BollingerOutput { upper, middle, lower, width }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_bracket_the_middle() {
        let close: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.4).sin() * 3.0).collect();
        let out = bollinger(&close, 20, 2.0);
        for i in 19..close.len() {
            assert!(out.upper[i] >= out.middle[i]);
            assert!(out.lower[i] <= out.middle[i]);
            assert!((out.width[i] - (out.upper[i] - out.lower[i])).abs() < 1e-12);
        }
    }

    #[test]
    fn flat_market_collapses_bands() {
        let out = bollinger(&vec![100.0; 30], 20, 2.0);
        assert_eq!(out.upper[29], 100.0);
        assert_eq!(out.lower[29], 100.0);
        assert_eq!(out.width[29], 0.0);
    }
}
