//! OHLCV bars and the immutable analysis frame.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::Interval;
use crate::error::{EngineError, Result};

/// One OHLCV row at a given interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(timestamp: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self { timestamp, open, high, low, close, volume }
    }

    /// Median price (HL/2).
    pub fn median_price(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    /// Typical price (HLC/3).
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    fn validate(&self, index: usize) -> Result<()> {
        let vals = [self.open, self.high, self.low, self.close, self.volume];
        if vals.iter().any(|v| !v.is_finite()) {
            return Err(EngineError::InvalidFrame(format!("non-finite value at bar {index}")));
        }
        if self.open < 0.0 || self.high < 0.0 || self.low < 0.0 || self.close < 0.0 {
            return Err(EngineError::InvalidFrame(format!("negative price at bar {index}")));
        }
        if self.volume < 0.0 {
            return Err(EngineError::InvalidFrame(format!("negative volume at bar {index}")));
        }
        if self.low > self.high {
            return Err(EngineError::InvalidFrame(format!("low > high at bar {index}")));
        }
        if self.open < self.low || self.open > self.high || self.close < self.low || self.close > self.high {
            return Err(EngineError::InvalidFrame(format!("open/close outside [low, high] at bar {index}")));
        }
        Ok(())
    }
}

/// Column-oriented, append-only view of a fixed window of bars for a single
/// (symbol, interval). Validated on construction, immutable afterwards.
///
/// Missing bars are allowed (markets close); they are never interpolated. The
/// [`Frame::completeness`] ratio tells downstream consumers how much of the
/// covered span is actually populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    symbol: String,
    interval: Interval,
    timestamps: Vec<DateTime<Utc>>,
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
    volume: Vec<f64>,
}

impl Frame {
    /// Build a frame from provider rows. Bars must be sorted by timestamp;
    /// duplicated timestamps are rejected, as are OHLC invariant violations.
    pub fn from_bars(symbol: impl Into<String>, interval: Interval, bars: &[Bar]) -> Result<Self> {
        if bars.is_empty() {
            return Err(EngineError::InvalidFrame("empty bar series".to_string()));
        }
        let mut timestamps = Vec::with_capacity(bars.len());
        let mut open = Vec::with_capacity(bars.len());
        let mut high = Vec::with_capacity(bars.len());
        let mut low = Vec::with_capacity(bars.len());
        let mut close = Vec::with_capacity(bars.len());
        let mut volume = Vec::with_capacity(bars.len());

        for (i, bar) in bars.iter().enumerate() {
            bar.validate(i)?;
            if let Some(prev) = timestamps.last() {
                if bar.timestamp == *prev {
                    return Err(EngineError::InvalidFrame(format!(
                        "duplicated timestamp {} at bar {i}",
                        bar.timestamp
                    )));
                }
                if bar.timestamp < *prev {
                    return Err(EngineError::InvalidFrame(format!(
                        "timestamps not increasing at bar {i}"
                    )));
                }
            }
            timestamps.push(bar.timestamp);
            open.push(bar.open);
            high.push(bar.high);
            low.push(bar.low);
            close.push(bar.close);
            volume.push(bar.volume);
        }

        Ok(Self {
            symbol: symbol.into(),
            interval,
            timestamps,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn is_sufficient_for(&self, min_bars: usize) -> bool {
        self.len() >= min_bars
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn open(&self) -> &[f64] {
        &self.open
    }

    pub fn high(&self) -> &[f64] {
        &self.high
    }

    pub fn low(&self) -> &[f64] {
        &self.low
    }

    pub fn close(&self) -> &[f64] {
        &self.close
    }

    pub fn volume(&self) -> &[f64] {
        &self.volume
    }

    pub fn last_close(&self) -> f64 {
        *self.close.last().unwrap_or(&f64::NAN)
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.last().copied()
    }

    /// New frame holding only the last `n` bars (the whole frame if shorter).
    pub fn tail(&self, n: usize) -> Frame {
        let start = self.len().saturating_sub(n);
        Frame {
            symbol: self.symbol.clone(),
            interval: self.interval,
            timestamps: self.timestamps[start..].to_vec(),
            open: self.open[start..].to_vec(),
            high: self.high[start..].to_vec(),
            low: self.low[start..].to_vec(),
            close: self.close[start..].to_vec(),
            volume: self.volume[start..].to_vec(),
        }
    }

    /// Ratio of bars present to bars expected over the covered span, in
    /// (0, 1]. Weekend and session gaps naturally lower the value; a frame of
    /// one bar is complete by definition.
    pub fn completeness(&self) -> f64 {
        if self.len() < 2 {
            return 1.0;
        }
        let span = self.timestamps[self.len() - 1] - self.timestamps[0];
        let step = self.interval.duration();
        let expected = (span.num_seconds() / step.num_seconds().max(1)) + 1;
        if expected <= 0 {
            return 1.0;
        }
        (self.len() as f64 / expected as f64).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar(minute: u32, open: f64, high: f64, low: f64, close: f64) -> Bar {
        let ts = Utc.with_ymd_and_hms(2024, 3, 4, 10, minute, 0).unwrap();
        Bar::new(ts, open, high, low, close, 1000.0)
    }

    #[test]
    fn builds_valid_frame() {
        let bars = vec![bar(0, 10.0, 11.0, 9.5, 10.5), bar(1, 10.5, 10.9, 10.1, 10.2)];
        let frame = Frame::from_bars("eurusd", Interval::M1, &bars).unwrap();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.last_close(), 10.2);
        assert!(frame.is_sufficient_for(2));
        assert!(!frame.is_sufficient_for(3));
    }

    #[test]
    fn rejects_duplicated_timestamp() {
        let bars = vec![bar(0, 10.0, 11.0, 9.5, 10.5), bar(0, 10.5, 10.9, 10.1, 10.2)];
        let err = Frame::from_bars("eurusd", Interval::M1, &bars).unwrap_err();
        assert!(matches!(err, EngineError::InvalidFrame(_)));
    }

    #[test]
    fn rejects_ohlc_violation() {
        // close above high
        let bars = vec![bar(0, 10.0, 11.0, 9.5, 11.5)];
        assert!(Frame::from_bars("eurusd", Interval::M1, &bars).is_err());
        // low above high
        let bars = vec![bar(0, 10.0, 9.0, 10.5, 10.0)];
        assert!(Frame::from_bars("eurusd", Interval::M1, &bars).is_err());
    }

    #[test]
    fn tail_keeps_last_bars() {
        let bars: Vec<Bar> = (0..5).map(|i| bar(i, 10.0, 11.0, 9.0, 10.0)).collect();
        let frame = Frame::from_bars("eurusd", Interval::M1, &bars).unwrap();
        let tail = frame.tail(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail.timestamps()[0], frame.timestamps()[3]);
    }

    #[test]
    fn completeness_reports_gaps() {
        // 3 one-minute bars over a 4-minute span: one bar missing
        let bars = vec![
            bar(0, 10.0, 11.0, 9.0, 10.0),
            bar(1, 10.0, 11.0, 9.0, 10.0),
            bar(4, 10.0, 11.0, 9.0, 10.0),
        ];
        let frame = Frame::from_bars("eurusd", Interval::M1, &bars).unwrap();
        assert!(frame.completeness() < 1.0);
        assert!(frame.completeness() > 0.5);
    }
}
