//! Moving Average Convergence Divergence.

use crate::indicators::ma::ema;

#[derive(Debug, Clone)]
pub struct MacdOutput {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub hist: Vec<f64>,
}

/// MACD line (fast EMA − slow EMA), signal EMA and histogram.
pub fn macd(close: &[f64], fast: usize, slow: usize, signal: usize) -> MacdOutput {
    let fast_ema = ema(close, fast);
    let slow_ema = ema(close, slow);
    let line: Vec<f64> = fast_ema.iter().zip(slow_ema.iter()).map(|(f, s)| f - s).collect();
    let signal_line = ema(&line, signal);
    let hist: Vec<f64> = line.iter().zip(signal_line.iter()).map(|(m, s)| m - s).collect();
    MacdOutput { macd: line, signal: signal_line, hist }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_series_has_zero_macd() {
        let out = macd(&vec![100.0; 40], 12, 26, 9);
        assert!(out.macd.iter().all(|v| v.abs() < 1e-12));
        assert!(out.hist.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn uptrend_turns_macd_positive() {
        let close: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let out = macd(&close, 12, 26, 9);
        assert!(out.macd[59] > 0.0);
        assert!(out.macd[59] > out.signal[59] - 1e-9);
    }

    #[test]
    fn histogram_is_macd_minus_signal() {
        let close: Vec<f64> = (0..50).map(|i| 100.0 + (i as f64 * 0.3).sin() * 4.0).collect();
        let out = macd(&close, 12, 26, 9);
        for i in 0..close.len() {
            assert!((out.hist[i] - (out.macd[i] - out.signal[i])).abs() < 1e-12);
        }
    }
}
