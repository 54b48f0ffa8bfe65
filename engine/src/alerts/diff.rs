//! Verdict diffing: turns two successive verdicts into alert payloads.
//!
//! Each condition is evaluated independently and gated by the monitor's
//! policy; a single run may therefore trigger several payloads at once.

use std::collections::BTreeMap;

use crate::alerts::notifier::{AlertPayload, EntrySnapshot};
use crate::model::AlertPolicy;
use crate::strategy::{Sentiment, Verdict};

/// Confidence a flip involving a neutral side must reach to be reported.
const NEUTRAL_FLIP_MIN_CONFIDENCE: f64 = 0.5;

/// How far confidence may fall below the entry confidence before the entry
/// is considered invalidated.
const VALIDITY_CONFIDENCE_SLACK: f64 = 0.2;

/// Compare `new` against `last` under `policy` and return every triggered
/// payload, most significant first.
pub fn diff_verdicts(
    policy: &AlertPolicy,
    last: &Verdict,
    new: &Verdict,
    entry: Option<&EntrySnapshot>,
) -> Vec<AlertPayload> {
    let mut payloads = Vec::new();

    if policy.conditions.sentiment_flip {
        if let Some(payload) = sentiment_flip(last, new) {
            payloads.push(payload);
        }
    }

    if policy.conditions.validity_loss {
        if let Some(payload) = validity_loss(new, entry) {
            payloads.push(payload);
        }
    }

    if policy.conditions.confidence_drift {
        let delta = new.confidence - last.confidence;
        if delta != 0.0 && delta.abs() >= policy.min_confidence_drift {
            payloads.push(AlertPayload::ConfidenceDrift {
                from: last.confidence,
                to: new.confidence,
                delta,
            });
        }
    }

    if policy.conditions.atr_band_shift {
        if let Some(payload) = atr_band_shift(policy, last, new) {
            payloads.push(payload);
        }
    }

    if policy.conditions.new_crossover {
        if let Some(payload) = new_crossover(last, new) {
            payloads.push(payload);
        }
    }

    payloads
}

fn sentiment_flip(last: &Verdict, new: &Verdict) -> Option<AlertPayload> {
    if last.sentiment == new.sentiment {
        return None;
    }
    let involves_neutral = last.sentiment == Sentiment::Neutral || new.sentiment == Sentiment::Neutral;
    if involves_neutral {
        // the non-neutral side must carry real conviction
        let conviction = if new.sentiment == Sentiment::Neutral {
            last.confidence
        } else {
            new.confidence
        };
        if conviction < NEUTRAL_FLIP_MIN_CONFIDENCE {
            return None;
        }
    }

    let mut indicator_deltas = BTreeMap::new();
    for (name, new_value) in &new.snapshot {
        if let Some(old_value) = last.snapshot.get(name) {
            indicator_deltas.insert(name.clone(), new_value - old_value);
        }
    }

    Some(AlertPayload::SentimentFlip {
        from: last.sentiment,
        to: new.sentiment,
        confidence: new.confidence,
        indicator_deltas,
    })
}

fn validity_loss(new: &Verdict, entry: Option<&EntrySnapshot>) -> Option<AlertPayload> {
    let entry = entry?;
    let direction_lost = new.sentiment != entry.sentiment && new.sentiment != Sentiment::Neutral;
    let confidence_lost = new.confidence < entry.confidence - VALIDITY_CONFIDENCE_SLACK;
    if direction_lost || confidence_lost {
        Some(AlertPayload::ValidityLoss {
            entry: entry.clone(),
            current_sentiment: new.sentiment,
            current_confidence: new.confidence,
        })
    } else {
        None
    }
}

fn atr_band_shift(policy: &AlertPolicy, last: &Verdict, new: &Verdict) -> Option<AlertPayload> {
    let old = last.risk_levels?;
    let current = new.risk_levels?;
    // upper band = short stop, lower band = long stop
    let upper_shift = (current.stop_short - old.stop_short).abs();
    let lower_shift = (current.stop_long - old.stop_long).abs();
    let shift = upper_shift.max(lower_shift);
    if shift == 0.0 || shift < policy.min_band_shift_units {
        return None;
    }
    let suggested_trailing_stop = match new.sentiment {
        Sentiment::Bearish => current.stop_short,
        _ => current.stop_long,
    };
    Some(AlertPayload::AtrBandShift {
        old_upper: old.stop_short,
        old_lower: old.stop_long,
        new_upper: current.stop_short,
        new_lower: current.stop_long,
        suggested_trailing_stop,
    })
}

fn new_crossover(last: &Verdict, new: &Verdict) -> Option<AlertPayload> {
    let fresh = new
        .crossovers
        .iter()
        .filter(|event| {
            !last.crossovers.iter().any(|seen| {
                seen.kind == event.kind
                    && seen.source == event.source
                    && seen.bar_timestamp == event.bar_timestamp
            })
        })
        .last()?;
    Some(AlertPayload::NewCrossover { event: fresh.clone() })
}
