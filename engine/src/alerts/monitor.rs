//! Per-(group, symbol) monitor state.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::alerts::notifier::EntrySnapshot;
use crate::strategy::Verdict;

/// Identity of one monitor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonitorKey {
    pub group_id: String,
    pub symbol_key: String,
}

impl MonitorKey {
    pub fn new(group_id: impl Into<String>, symbol_key: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            symbol_key: symbol_key.into(),
        }
    }
}

impl fmt::Display for MonitorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group_id, self.symbol_key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorPhase {
    Idle,
    Due,
    Running,
    Cooling,
    Failing,
}

/// Mutable state the scheduler owns for one monitor. The whole struct is
/// persisted; `phase` resets to `Idle` on reload so a crash mid-run never
/// wedges a monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorState {
    pub phase: MonitorPhase,
    pub last_verdict: Option<Verdict>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub next_due_at: DateTime<Utc>,
    pub consecutive_failures: u32,
    pub entry_snapshot: Option<EntrySnapshot>,
    pub alerts_emitted_today: u32,
    pub alerts_day: NaiveDate,
    /// Last emission time per condition name, for cadence deduplication.
    pub last_emitted: BTreeMap<String, DateTime<Utc>>,
}

impl MonitorState {
    pub fn new(next_due_at: DateTime<Utc>) -> Self {
        Self {
            phase: MonitorPhase::Idle,
            last_verdict: None,
            last_run_at: None,
            next_due_at,
            consecutive_failures: 0,
            entry_snapshot: None,
            alerts_emitted_today: 0,
            alerts_day: next_due_at.date_naive(),
            last_emitted: BTreeMap::new(),
        }
    }

    /// Reset the daily alert counter when the calendar day rolls over.
    pub fn roll_day(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        if self.alerts_day != today {
            self.alerts_day = today;
            self.alerts_emitted_today = 0;
        }
    }

    /// Whether a payload for `condition` may be emitted at `now`:
    /// at most one per cadence interval and at most `daily_cap` per day.
    pub fn may_emit(&self, condition: &str, now: DateTime<Utc>, cadence_minutes: u32, daily_cap: u32) -> bool {
        if self.alerts_emitted_today >= daily_cap {
            return false;
        }
        match self.last_emitted.get(condition) {
            None => true,
            Some(last) => (now - *last) >= chrono::Duration::minutes(cadence_minutes as i64),
        }
    }

    pub fn record_emission(&mut self, condition: &str, now: DateTime<Utc>) {
        self.last_emitted.insert(condition.to_string(), now);
        self.alerts_emitted_today += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn dedup_within_cadence_interval() {
        let mut state = MonitorState::new(at(9, 0));
        assert!(state.may_emit("sentiment_flip", at(9, 0), 15, 10));
        state.record_emission("sentiment_flip", at(9, 0));

        assert!(!state.may_emit("sentiment_flip", at(9, 10), 15, 10));
        assert!(state.may_emit("sentiment_flip", at(9, 15), 15, 10));
        // a different condition is tracked independently
        assert!(state.may_emit("new_crossover", at(9, 10), 15, 10));
    }

    #[test]
    fn daily_cap_suppresses_storms() {
        let mut state = MonitorState::new(at(9, 0));
        for i in 0..10 {
            let now = at(9, 0) + chrono::Duration::minutes(15 * i);
            assert!(state.may_emit("sentiment_flip", now, 15, 10));
            state.record_emission("sentiment_flip", now);
        }
        assert!(!state.may_emit("sentiment_flip", at(23, 0), 15, 10));
    }

    #[test]
    fn day_rollover_resets_counter() {
        let mut state = MonitorState::new(at(9, 0));
        state.alerts_emitted_today = 10;
        state.roll_day(at(23, 59));
        assert_eq!(state.alerts_emitted_today, 10);

        state.roll_day(Utc.with_ymd_and_hms(2024, 7, 2, 0, 1, 0).unwrap());
        assert_eq!(state.alerts_emitted_today, 0);
    }
}
