//! Crossover detection with an optional ADX volatility gate.
//!
//! The detector is stateless: callers hand it the current frame's series on
//! every run and it scans only the trailing lookback window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossKind {
    Bullish,
    Bearish,
}

/// What kind of comparison produced the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossSource {
    /// Two aligned series crossing each other.
    Line,
    /// A series crossing a constant level.
    Level,
    /// A binary state series changing sign (Supertrend direction).
    StateFlip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossoverEvent {
    pub kind: CrossKind,
    pub source: CrossSource,
    pub bar_index: usize,
    pub bar_timestamp: DateTime<Utc>,
    pub price_at_bar: f64,
    /// ADX at the event bar when the volatility gate was consulted.
    pub gating_strength: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossoverSettings {
    pub enabled: bool,
    pub volatility_filter_enabled: bool,
    pub adx_threshold: f64,
    pub lookback: usize,
}

impl Default for CrossoverSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            volatility_filter_enabled: true,
            adx_threshold: 18.0,
            lookback: 5,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CrossoverDetector {
    settings: CrossoverSettings,
}

impl CrossoverDetector {
    pub fn new(settings: CrossoverSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CrossoverSettings {
        &self.settings
    }

    /// Crossings of `a` over/under `b` within the lookback window.
    pub fn detect_series(
        &self,
        frame: &Frame,
        a: &[f64],
        b: &[f64],
        adx: Option<&[f64]>,
    ) -> Vec<CrossoverEvent> {
        self.scan(frame, adx, CrossSource::Line, |i| {
            if a[i - 1].is_nan() || b[i - 1].is_nan() || a[i].is_nan() || b[i].is_nan() {
                return None;
            }
            if a[i - 1] <= b[i - 1] && a[i] > b[i] {
                Some(CrossKind::Bullish)
            } else if a[i - 1] >= b[i - 1] && a[i] < b[i] {
                Some(CrossKind::Bearish)
            } else {
                None
            }
        })
    }

    /// Crossings of `a` over/under a constant level.
    pub fn detect_level(
        &self,
        frame: &Frame,
        a: &[f64],
        level: f64,
        adx: Option<&[f64]>,
    ) -> Vec<CrossoverEvent> {
        self.scan(frame, adx, CrossSource::Level, |i| {
            if a[i - 1].is_nan() || a[i].is_nan() {
                return None;
            }
            if a[i - 1] <= level && a[i] > level {
                Some(CrossKind::Bullish)
            } else if a[i - 1] >= level && a[i] < level {
                Some(CrossKind::Bearish)
            } else {
                None
            }
        })
    }

    /// Sign changes of a ±1 state series (Supertrend direction).
    pub fn detect_state_flip(
        &self,
        frame: &Frame,
        direction: &[i8],
        adx: Option<&[f64]>,
    ) -> Vec<CrossoverEvent> {
        self.scan(frame, adx, CrossSource::StateFlip, |i| {
            if direction[i] != direction[i - 1] {
                if direction[i] > 0 {
                    Some(CrossKind::Bullish)
                } else {
                    Some(CrossKind::Bearish)
                }
            } else {
                None
            }
        })
    }

    /// Most recent event, if any.
    pub fn latest<'a>(events: &'a [CrossoverEvent]) -> Option<&'a CrossoverEvent> {
        events.last()
    }

    fn scan(
        &self,
        frame: &Frame,
        adx: Option<&[f64]>,
        source: CrossSource,
        classify: impl Fn(usize) -> Option<CrossKind>,
    ) -> Vec<CrossoverEvent> {
        if !self.settings.enabled || frame.len() < 2 {
            return Vec::new();
        }
        let start = frame.len().saturating_sub(self.settings.lookback).max(1);
        let mut events = Vec::new();
        for i in start..frame.len() {
            let Some(kind) = classify(i) else { continue };
            let gating_strength = adx.map(|series| series[i]);
            if self.settings.volatility_filter_enabled {
                match gating_strength {
                    Some(strength) if strength >= self.settings.adx_threshold => {}
                    // missing or weak ADX: the gate suppresses the event
                    _ => continue,
                }
            }
            events.push(CrossoverEvent {
                kind,
                source,
                bar_index: i,
                bar_timestamp: frame.timestamps()[i],
                price_at_bar: frame.close()[i],
                gating_strength,
            });
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Bar, Interval};
    use chrono::TimeZone;

    fn frame(closes: &[f64]) -> Frame {
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let ts = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
                    + chrono::Duration::hours(i as i64);
                Bar::new(ts, c, c + 1.0, c - 1.0, c, 0.0)
            })
            .collect();
        Frame::from_bars("test", Interval::H1, &bars).unwrap()
    }

    fn ungated() -> CrossoverDetector {
        CrossoverDetector::new(CrossoverSettings {
            volatility_filter_enabled: false,
            ..CrossoverSettings::default()
        })
    }

    #[test]
    fn detects_bullish_line_cross() {
        let f = frame(&[10.0; 6]);
        let a = vec![1.0, 1.0, 1.0, 1.0, 2.0, 3.0];
        let b = vec![2.0, 2.0, 2.0, 2.0, 1.5, 1.5];
        let events = ungated().detect_series(&f, &a, &b, None);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, CrossKind::Bullish);
        assert_eq!(events[0].bar_index, 4);
    }

    #[test]
    fn level_cross_both_directions() {
        let f = frame(&[10.0; 6]);
        let a = vec![25.0, 28.0, 32.0, 35.0, 29.0, 27.0];
        let events = ungated().detect_level(&f, &a, 30.0, None);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, CrossKind::Bullish);
        assert_eq!(events[1].kind, CrossKind::Bearish);
    }

    #[test]
    fn events_outside_lookback_are_ignored() {
        let f = frame(&[10.0; 10]);
        let mut a = vec![1.0; 10];
        let b = vec![2.0; 10];
        a[3] = 3.0; // cross at bar 3, lookback only covers bars 5..9
        let events = ungated().detect_series(&f, &a, &b, None);
        assert!(events.is_empty());
    }

    #[test]
    fn adx_gate_suppresses_weak_trend_events() {
        let f = frame(&[10.0; 6]);
        let a = vec![1.0, 1.0, 1.0, 1.0, 2.0, 2.0];
        let b = vec![2.0, 2.0, 2.0, 2.0, 1.5, 1.5];
        let adx = vec![12.0; 6];
        let detector = CrossoverDetector::new(CrossoverSettings::default());
        assert!(detector.detect_series(&f, &a, &b, Some(&adx)).is_empty());

        let strong = vec![25.0; 6];
        let events = detector.detect_series(&f, &a, &b, Some(&strong));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].gating_strength, Some(25.0));
    }

    #[test]
    fn state_flip_reports_direction_change() {
        let f = frame(&[10.0; 6]);
        let direction = vec![-1i8, -1, -1, -1, 1, 1];
        let events = ungated().detect_state_flip(&f, &direction, None);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, CrossKind::Bullish);
        assert_eq!(events[0].source, CrossSource::StateFlip);
    }

    #[test]
    fn nan_bars_produce_no_events() {
        let f = frame(&[10.0; 6]);
        let a = vec![f64::NAN, f64::NAN, 1.0, 1.0, 2.0, 2.0];
        let b = vec![2.0, 2.0, f64::NAN, 2.0, 1.5, 1.5];
        let events = ungated().detect_series(&f, &a, &b, None);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].bar_index, 4);
    }
}
