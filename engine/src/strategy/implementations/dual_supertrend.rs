//! Dual-Supertrend strategy.
//!
//! Two Supertrend indicators with different horizons must agree before the
//! strategy takes a side: a long entry needs both bullish, an exit triggers
//! as soon as either turns bearish. RSI, MACD and ADX act as confirmation
//! filters and ATR(14) provides the stop/target distances.

use std::collections::BTreeMap;

use crate::data::Frame;
use crate::error::Result;
use crate::indicators::{supertrend::supertrend, CrossoverDetector, IndicatorResult};
use crate::strategy::{
    ParamMap, ParamMapExt, ParameterTemplate, RiskLevels, Strategy, Strength, Verdict,
    REASON_INSUFFICIENT_HISTORY, REASON_INSUFFICIENT_VOLATILITY,
};

/// Confirmations at or above this count read as a strong signal.
const STRONG_THRESHOLD: u32 = 4;

#[derive(Debug, Default)]
pub struct DualSupertrend;

impl DualSupertrend {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for DualSupertrend {
    fn name(&self) -> &'static str {
        "dual-supertrend-check-single-timeframe"
    }

    fn parameter_template(&self) -> ParameterTemplate {
        ParameterTemplate::new()
            .int("supertrend_a_period", "Period of the longer-term Supertrend", 15, 10, 30)
            .float("supertrend_a_multiplier", "ATR multiplier of the longer-term Supertrend", 3.142, 1.0, 5.0)
            .int("supertrend_b_period", "Period of the shorter-term Supertrend", 6, 3, 15)
            .float("supertrend_b_multiplier", "ATR multiplier of the shorter-term Supertrend", 0.66, 0.5, 3.0)
            .int("confirmation_threshold", "Minimum confirmations to enter", 3, 1, 5)
            .int("exit_threshold", "Minimum confirmations to exit", 2, 1, 5)
            .float("atr_stop_multiplier", "Stop distance in ATR units", 2.0, 1.0, 5.0)
            .float("atr_target_multiplier", "Target distance in ATR units", 3.0, 1.0, 10.0)
            .float("rsi_overbought", "RSI level considered overbought", 70.0, 60.0, 90.0)
            .float("rsi_oversold", "RSI level considered oversold", 30.0, 10.0, 40.0)
            .float("trend_strength_threshold", "ADX level considered a strong trend", 25.0, 15.0, 35.0)
    }

    fn analyze(
        &self,
        frame: &Frame,
        params: &ParamMap,
        indicators: &IndicatorResult,
        detector: &CrossoverDetector,
    ) -> Result<Verdict> {
        let a_period = params.int_or("supertrend_a_period", 15) as usize;
        let a_multiplier = params.float_or("supertrend_a_multiplier", 3.142);
        let b_period = params.int_or("supertrend_b_period", 6) as usize;
        let b_multiplier = params.float_or("supertrend_b_multiplier", 0.66);
        let confirmation_threshold = params.int_or("confirmation_threshold", 3) as u32;
        let exit_threshold = params.int_or("exit_threshold", 2) as u32;
        let atr_stop = params.float_or("atr_stop_multiplier", 2.0);
        let atr_target = params.float_or("atr_target_multiplier", 3.0);
        let rsi_overbought = params.float_or("rsi_overbought", 70.0);
        let rsi_oversold = params.float_or("rsi_oversold", 30.0);
        let adx_threshold = params.float_or("trend_strength_threshold", 25.0);

        // both trends, the MACD slow EMA and the DMI stack must have history
        let needed = a_period.max(b_period).max(28) + 1;
        if !frame.is_sufficient_for(needed) {
            return Ok(Verdict::neutral(REASON_INSUFFICIENT_HISTORY));
        }

        let atr = indicators.latest("atr");
        if atr.is_nan() {
            return Ok(Verdict::neutral(REASON_INSUFFICIENT_HISTORY));
        }
        if atr == 0.0 {
            return Ok(Verdict::neutral(REASON_INSUFFICIENT_VOLATILITY));
        }

        let st_a = supertrend(frame.high(), frame.low(), frame.close(), a_period, a_multiplier);
        let st_b = supertrend(frame.high(), frame.low(), frame.close(), b_period, b_multiplier);
        let direction_a = st_a.latest_direction();
        let direction_b = st_b.latest_direction();

        let entry_long = direction_a == 1 && direction_b == 1;
        let exit_long = direction_a == -1 || direction_b == -1;

        let rsi = indicators.latest("rsi");
        let macd = indicators.latest("macd");
        let adx = indicators.latest("adx");

        let mut bull = 0u32;
        let mut bear = 0u32;
        let mut reasons = Vec::new();

        if entry_long {
            bull += 1;
            reasons.push("both_supertrends_bullish".to_string());
            if !rsi.is_nan() && rsi < rsi_overbought {
                bull += 1;
                reasons.push("rsi_below_overbought".to_string());
            }
            if !macd.is_nan() && macd > 0.0 {
                bull += 1;
                reasons.push("macd_bullish".to_string());
            }
            if !adx.is_nan() && adx > adx_threshold {
                bull += 1;
                reasons.push("strong_trend".to_string());
            }
        }
        if exit_long {
            bear += 1;
            reasons.push(if direction_a == -1 && direction_b == -1 {
                "both_supertrends_bearish".to_string()
            } else {
                "supertrend_disagreement".to_string()
            });
            if !rsi.is_nan() && rsi > rsi_oversold {
                bear += 1;
                reasons.push("rsi_above_oversold".to_string());
            }
            if !macd.is_nan() && macd < 0.0 {
                bear += 1;
                reasons.push("macd_bearish".to_string());
            }
            if !adx.is_nan() && adx > adx_threshold {
                bear += 1;
                reasons.push("strong_trend".to_string());
            }
        }

        let strength = if bull >= STRONG_THRESHOLD {
            Strength::StrongBuy
        } else if bull >= confirmation_threshold {
            Strength::Buy
        } else if bear >= STRONG_THRESHOLD {
            Strength::StrongSell
        } else if bear >= exit_threshold {
            Strength::Sell
        } else {
            Strength::Neutral
        };

        let confidence = bull.max(bear).min(STRONG_THRESHOLD) as f64 / STRONG_THRESHOLD as f64;

        let close = frame.last_close();
        let mut snapshot = BTreeMap::new();
        snapshot.insert("close".to_string(), close);
        snapshot.insert("atr".to_string(), atr);
        snapshot.insert("supertrend_a".to_string(), st_a.latest_value());
        snapshot.insert("direction_a".to_string(), direction_a as f64);
        snapshot.insert("supertrend_b".to_string(), st_b.latest_value());
        snapshot.insert("direction_b".to_string(), direction_b as f64);
        for (name, value) in [("rsi", rsi), ("macd", macd), ("adx", adx)] {
            if !value.is_nan() {
                snapshot.insert(name.to_string(), value);
            }
        }

        let adx_series = indicators.series("adx");
        let mut crossovers = detector.detect_state_flip(frame, &st_a.direction, adx_series);
        crossovers.extend(detector.detect_state_flip(frame, &st_b.direction, adx_series));

        Ok(Verdict {
            sentiment: strength.sentiment(),
            strength,
            confidence,
            confirmations_buy: bull,
            confirmations_sell: bear,
            risk_levels: Some(RiskLevels::from_atr(close, atr, atr_stop, atr_target)),
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
    use crate::strategy::{ParamValue, Sentiment};
    use chrono::{TimeZone, Utc};

    fn frame_from_closes(closes: &[f64]) -> Frame {
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let ts = Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap()
                    + chrono::Duration::hours(i as i64);
                Bar::new(ts, c, c + 0.6, c - 0.6, c, 250.0)
            })
            .collect();
        Frame::from_bars("test", Interval::H1, &bars).unwrap()
    }

    fn run(frame: &Frame) -> Verdict {
        let strategy = DualSupertrend::new();
        let params = strategy.validate(&ParamMap::new()).unwrap();
        let indicators = compute(frame, &default_recipe()).unwrap();
        let detector = CrossoverDetector::new(CrossoverSettings::default());
        strategy.analyze(frame, &params, &indicators, &detector).unwrap()
    }

    #[test]
    fn template_has_eleven_parameters() {
        let template = DualSupertrend::new().parameter_template();
        assert_eq!(template.len(), 11);
        assert!(template.validate(&template.defaults()).is_ok());
    }

    #[test]
    fn rejects_out_of_range_period() {
        let strategy = DualSupertrend::new();
        let mut params = ParamMap::new();
        params.insert("supertrend_a_period".to_string(), ParamValue::Int(50));
        let err = strategy.validate(&params).unwrap_err();
        assert!(err.to_string().contains("supertrend_a_period"));
    }

    #[test]
    fn sustained_rally_is_bullish() {
        // sideways base, then a strong rally flips both supertrends bullish
        let mut closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.9).sin() * 0.8).collect();
        closes.extend((0..30).map(|i| 101.0 + i as f64 * 1.4));
        let verdict = run(&frame_from_closes(&closes));
        assert_eq!(verdict.sentiment, Sentiment::Bullish);
        assert!(verdict.confirmations_buy >= 3);
        assert_eq!(verdict.snapshot["direction_a"], 1.0);
        assert_eq!(verdict.snapshot["direction_b"], 1.0);
    }

    #[test]
    fn sustained_slide_is_bearish() {
        let mut closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.9).sin() * 0.8).collect();
        closes.extend((0..30).map(|i| 99.0 - i as f64 * 1.4));
        let verdict = run(&frame_from_closes(&closes));
        assert_eq!(verdict.sentiment, Sentiment::Bearish);
        assert!(verdict.confirmations_sell >= 2);
    }

    #[test]
    fn flat_market_reports_insufficient_volatility() {
        let bars: Vec<Bar> = (0..50)
            .map(|i| {
                let ts = Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap()
                    + chrono::Duration::hours(i as i64);
                Bar::new(ts, 100.0, 100.0, 100.0, 100.0, 0.0)
            })
            .collect();
        let frame = Frame::from_bars("flat", Interval::H1, &bars).unwrap();
        let verdict = run(&frame);
        assert_eq!(verdict.sentiment, Sentiment::Neutral);
        assert!(verdict.reasons.iter().any(|r| r == REASON_INSUFFICIENT_VOLATILITY));
    }

    #[test]
    fn short_history_reports_insufficient_history() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let verdict = run(&frame_from_closes(&closes));
        assert!(verdict.reasons.iter().any(|r| r == REASON_INSUFFICIENT_HISTORY));
        assert_eq!(verdict.confidence, 0.0);
    }
}
