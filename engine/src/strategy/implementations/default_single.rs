//! Default multi-indicator consensus strategy.
//!
//! Tallies bullish and bearish confirmations across six oscillators with
//! their standard interpretations, maps the tally onto a strength reading and
//! derives ATR risk levels around the latest close. The thresholds are
//! frozen; the strategy intentionally exposes an empty parameter template.

use std::collections::BTreeMap;

use crate::data::Frame;
use crate::error::Result;
use crate::indicators::{CrossoverDetector, IndicatorResult};
use crate::strategy::{
    ParamMap, ParameterTemplate, RiskLevels, Strategy, Strength, Verdict,
    REASON_INSUFFICIENT_HISTORY, REASON_INSUFFICIENT_VOLATILITY,
};

/// Bars needed before every oscillator in the consensus has warmed up
/// (CCI(20) has the longest warm-up at two stacked windows).
const MIN_BARS: usize = 40;

const ATR_STOP_MULTIPLIER: f64 = 2.0;
const ATR_TARGET_MULTIPLIER: f64 = 3.0;

/// MACD readings inside this dead-band are treated as neutral.
const MACD_NEUTRAL_BAND: f64 = 0.02;
/// DMI spread below this magnitude carries no directional information.
const DMI_NEUTRAL_BAND: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Vote {
    Buy,
    Sell,
    Neutral,
}

#[derive(Debug, Default)]
pub struct DefaultSingleTimeframe;

impl DefaultSingleTimeframe {
    pub fn new() -> Self {
        Self
    }

    fn vote_rsi(value: f64) -> Vote {
        if value < 30.0 {
            Vote::Buy
        } else if value > 70.0 {
            Vote::Sell
        } else {
            Vote::Neutral
        }
    }

    fn vote_stochastic(value: f64) -> Vote {
        if value < 20.0 {
            Vote::Buy
        } else if value > 80.0 {
            Vote::Sell
        } else {
            Vote::Neutral
        }
    }

    fn vote_cci(value: f64) -> Vote {
        if value < -100.0 {
            Vote::Buy
        } else if value > 100.0 {
            Vote::Sell
        } else {
            Vote::Neutral
        }
    }

    fn vote_williams(value: f64) -> Vote {
        if value < -80.0 {
            Vote::Buy
        } else if value > -20.0 {
            Vote::Sell
        } else {
            Vote::Neutral
        }
    }

    fn vote_macd(value: f64) -> Vote {
        if value.abs() <= MACD_NEUTRAL_BAND {
            Vote::Neutral
        } else if value > 0.0 {
            Vote::Buy
        } else {
            Vote::Sell
        }
    }

    /// DMI votes on the slope of the +DI − −DI spread.
    fn vote_dmi(spread: f64, prev_spread: f64) -> Vote {
        if spread.abs() < DMI_NEUTRAL_BAND || prev_spread.is_nan() {
            Vote::Neutral
        } else if spread > prev_spread {
            Vote::Buy
        } else if spread < prev_spread {
            Vote::Sell
        } else {
            Vote::Neutral
        }
    }
}

impl Strategy for DefaultSingleTimeframe {
    fn name(&self) -> &'static str {
        "default-check-single-timeframe"
    }

    fn parameter_template(&self) -> ParameterTemplate {
        ParameterTemplate::new()
    }

    fn analyze(
        &self,
        frame: &Frame,
        _params: &ParamMap,
        indicators: &IndicatorResult,
        detector: &CrossoverDetector,
    ) -> Result<Verdict> {
        if !frame.is_sufficient_for(MIN_BARS) {
            return Ok(Verdict::neutral(REASON_INSUFFICIENT_HISTORY));
        }

        let atr = indicators.latest("atr");
        if atr.is_nan() {
            return Ok(Verdict::neutral(REASON_INSUFFICIENT_HISTORY));
        }
        if atr == 0.0 {
            return Ok(Verdict::neutral(REASON_INSUFFICIENT_VOLATILITY));
        }

        let rsi = indicators.latest("rsi");
        let stoch_k = indicators.latest("stoch_k");
        let cci = indicators.latest("cci");
        let williams = indicators.latest("williams_r");
        let macd = indicators.latest("macd");
        let dmi_spread = indicators.latest("plus_di") - indicators.latest("minus_di");
        let dmi_spread_prev = indicators.previous("plus_di") - indicators.previous("minus_di");

        let votes = [
            ("rsi", rsi, Self::vote_rsi(rsi)),
            ("stoch_k", stoch_k, Self::vote_stochastic(stoch_k)),
            ("cci", cci, Self::vote_cci(cci)),
            ("williams_r", williams, Self::vote_williams(williams)),
            ("macd", macd, Self::vote_macd(macd)),
            ("dmi", dmi_spread, Self::vote_dmi(dmi_spread, dmi_spread_prev)),
        ];

        let mut bull = 0u32;
        let mut bear = 0u32;
        let mut counted = 0u32;
        let mut reasons = Vec::new();
        for (name, value, vote) in votes {
            if value.is_nan() {
                continue;
            }
            counted += 1;
            match vote {
                Vote::Buy => {
                    bull += 1;
                    reasons.push(format!("{name}_bullish"));
                }
                Vote::Sell => {
                    bear += 1;
                    reasons.push(format!("{name}_bearish"));
                }
                Vote::Neutral => {}
            }
        }

        let strong_threshold = (0.7 * counted as f64).ceil() as u32;
        let strength = if counted == 0 {
            Strength::Neutral
        } else if bull >= strong_threshold.max(1) && bull > bear {
            Strength::StrongBuy
        } else if bear >= strong_threshold.max(1) && bear > bull {
            Strength::StrongSell
        } else if bull > bear {
            Strength::Buy
        } else if bear > bull {
            Strength::Sell
        } else {
            Strength::Neutral
        };

        let confidence = if counted == 0 {
            0.0
        } else {
            bull.max(bear) as f64 / counted as f64
        };

        let close = frame.last_close();
        let mut snapshot = BTreeMap::new();
        snapshot.insert("close".to_string(), close);
        snapshot.insert("atr".to_string(), atr);
        for (name, value) in [
            ("rsi", rsi),
            ("stoch_k", stoch_k),
            ("cci", cci),
            ("williams_r", williams),
            ("macd", macd),
            ("dmi_spread", dmi_spread),
        ] {
            if !value.is_nan() {
                snapshot.insert(name.to_string(), value);
            }
        }

        let mut crossovers = Vec::new();
        let adx = indicators.series("adx");
        if let (Some(plus), Some(minus)) = (indicators.series("plus_di"), indicators.series("minus_di")) {
            crossovers.extend(detector.detect_series(frame, plus, minus, adx));
        }
        if let (Some(k), Some(d)) = (indicators.series("stoch_k"), indicators.series("stoch_d")) {
            crossovers.extend(detector.detect_series(frame, k, d, adx));
        }

        Ok(Verdict {
            sentiment: strength.sentiment(),
            strength,
            confidence,
            confirmations_buy: bull,
            confirmations_sell: bear,
            risk_levels: Some(RiskLevels::from_atr(close, atr, ATR_STOP_MULTIPLIER, ATR_TARGET_MULTIPLIER)),
            snapshot,
            reasons,
            crossovers,
            metadata: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Bar, Interval};
    use crate::indicators::{compute, default_recipe, CrossoverSettings};
    use chrono::{TimeZone, Utc};

    fn frame_from_closes(closes: &[f64]) -> Frame {
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let ts = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()
                    + chrono::Duration::hours(i as i64);
                Bar::new(ts, c, c + 0.8, c - 0.8, c, 100.0)
            })
            .collect();
        Frame::from_bars("test", Interval::H1, &bars).unwrap()
    }

    fn run(frame: &Frame) -> Verdict {
        let strategy = DefaultSingleTimeframe::new();
        let indicators = compute(frame, &default_recipe()).unwrap();
        let detector = CrossoverDetector::new(CrossoverSettings::default());
        let params = strategy.validate(&ParamMap::new()).unwrap();
        strategy.analyze(frame, &params, &indicators, &detector).unwrap()
    }

    #[test]
    fn template_is_empty() {
        assert!(DefaultSingleTimeframe::new().parameter_template().is_empty());
    }

    #[test]
    fn short_history_is_neutral_with_reason() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let verdict = run(&frame_from_closes(&closes));
        assert_eq!(verdict.sentiment, crate::strategy::Sentiment::Neutral);
        assert_eq!(verdict.confidence, 0.0);
        assert!(verdict.reasons.iter().any(|r| r == REASON_INSUFFICIENT_HISTORY));
    }

    #[test]
    fn crash_produces_oversold_consensus() {
        // long slide: RSI, stochastic, williams and CCI all deep in oversold
        let closes: Vec<f64> = (0..120).map(|i| 200.0 - i as f64 * 0.9).collect();
        let verdict = run(&frame_from_closes(&closes));
        assert!(verdict.confirmations_buy >= 3);
        assert_eq!(verdict.sentiment, crate::strategy::Sentiment::Bullish);
    }

    #[test]
    fn risk_levels_follow_atr() {
        let closes: Vec<f64> = (0..120).map(|i| 100.0 + (i as f64 * 0.25).sin() * 4.0).collect();
        let frame = frame_from_closes(&closes);
        let verdict = run(&frame);
        let atr = verdict.snapshot["atr"];
        let close = frame.last_close();
        let levels = verdict.risk_levels.unwrap();
        assert!((levels.stop_long - (close - 2.0 * atr)).abs() < 1e-9);
        assert!((levels.target_long - (close + 3.0 * atr)).abs() < 1e-9);
    }
}
