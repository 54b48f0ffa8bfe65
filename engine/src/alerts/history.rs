//! Queries over the append-only alert history.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::warn;

use crate::alerts::notifier::AlertEvent;
use crate::error::Result;
use crate::model::GroupStore;

/// Aggregated view of one or more days of emitted events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertHistorySummary {
    pub total: usize,
    pub by_symbol: BTreeMap<String, usize>,
    pub by_condition: BTreeMap<String, usize>,
    pub by_severity: BTreeMap<String, usize>,
}

/// Load one day of history. Lines that fail to parse are skipped with a
/// warning; a partially corrupt file never hides the rest of the day.
pub fn load_day(store: &GroupStore, day: NaiveDate) -> Result<Vec<AlertEvent>> {
    let mut events = Vec::new();
    for line in store.read_alert_history(day)? {
        match serde_json::from_str::<AlertEvent>(&line) {
            Ok(event) => events.push(event),
            Err(e) => warn!(%day, error = %e, "skipping unreadable history line"),
        }
    }
    Ok(events)
}

pub fn summarize<'a>(events: impl IntoIterator<Item = &'a AlertEvent>) -> AlertHistorySummary {
    let mut summary = AlertHistorySummary::default();
    for event in events {
        summary.total += 1;
        *summary.by_symbol.entry(event.symbol_key.clone()).or_insert(0) += 1;
        *summary
            .by_condition
            .entry(event.payload.condition().to_string())
            .or_insert(0) += 1;
        let severity = format!("{:?}", event.severity).to_lowercase();
        *summary.by_severity.entry(severity).or_insert(0) += 1;
    }
    summary
}
