//! Periodic alert scheduler.
//!
//! One logical monitor per (group, symbol) with an enabled alert policy.
//! Each tick finds due monitors inside their active window, drives the
//! orchestrator through a bounded worker pool, diffs the new verdict against
//! the previous one and emits deduplicated events to the notifier.
//!
//! Per monitor, runs are strictly ordered: a monitor is not considered due
//! again until its previous run has completed or moved it to `Failing`.
//! Across monitors there is no ordering guarantee. Cancellation is
//! cooperative; a verdict arriving for a detached monitor is discarded.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, Duration as ChronoDuration, Timelike, Utc};
use tokio::sync::{RwLock, Semaphore};
use tracing::{debug, error, info, warn};

use crate::alerts::diff::diff_verdicts;
use crate::alerts::monitor::{MonitorKey, MonitorPhase, MonitorState};
use crate::alerts::notifier::{AlertEvent, AlertPayload, EntrySnapshot, Notifier, Severity};
use crate::analysis::Orchestrator;
use crate::error::{EngineError, Result};
use crate::model::{resolve, AlertPolicy, GroupStore, ResolvedConfig};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Pause between scheduler ticks.
    pub tick_interval: Duration,
    /// Maximum concurrent orchestrator runs (protects provider rate limits).
    pub worker_cap: usize,
    /// Consecutive failures before a `monitor_failing` warning is emitted.
    pub failure_warn_after: u32,
    /// Ceiling for the exponential retry backoff.
    pub backoff_cap_minutes: u32,
    /// Maximum events per monitor per calendar day.
    pub daily_event_cap: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(30),
            worker_cap: 8,
            failure_warn_after: 3,
            backoff_cap_minutes: 60,
            daily_event_cap: 10,
        }
    }
}

pub struct AlertScheduler {
    store: Arc<RwLock<GroupStore>>,
    orchestrator: Arc<Orchestrator>,
    notifier: Arc<dyn Notifier>,
    monitors: Arc<RwLock<BTreeMap<MonitorKey, MonitorState>>>,
    limiter: Arc<Semaphore>,
    running: Arc<AtomicBool>,
    config: SchedulerConfig,
}

impl AlertScheduler {
    pub fn new(
        store: Arc<RwLock<GroupStore>>,
        orchestrator: Arc<Orchestrator>,
        notifier: Arc<dyn Notifier>,
        config: SchedulerConfig,
    ) -> Self {
        let limiter = Arc::new(Semaphore::new(config.worker_cap.max(1)));
        Self {
            store,
            orchestrator,
            notifier,
            monitors: Arc::new(RwLock::new(BTreeMap::new())),
            limiter,
            running: Arc::new(AtomicBool::new(false)),
            config,
        }
    }

    /// Attach a monitor for every alert-enabled member of every enabled
    /// group. Returns the number of monitors attached.
    pub async fn attach_all(&self) -> Result<usize> {
        let pairs: Vec<(String, String)> = {
            let store = self.store.read().await;
            store
                .list()
                .into_iter()
                .filter(|group| group.enabled)
                .flat_map(|group| {
                    group
                        .alerting_members()
                        .into_iter()
                        .map(|key| (group.id.clone(), key.clone()))
                        .collect::<Vec<_>>()
                })
                .collect()
        };
        let mut attached = 0;
        for (group_id, symbol_key) in pairs {
            if self.attach(&group_id, &symbol_key).await.is_ok() {
                attached += 1;
            }
        }
        info!(attached, "monitors attached");
        Ok(attached)
    }

    /// Attach one monitor, restoring its persisted state when present.
    /// A restored monitor whose `next_due_at` lies in the past fires on the
    /// first tick.
    pub async fn attach(&self, group_id: &str, symbol_key: &str) -> Result<()> {
        let state = {
            let store = self.store.read().await;
            let group = store.get(group_id)?;
            let cfg = resolve(group, symbol_key)?;
            if !cfg.alert_policy.enabled {
                return Err(EngineError::NotFound(format!(
                    "enabled alert policy for {group_id}/{symbol_key}"
                )));
            }
            let mut state: MonitorState = store
                .load_monitor(group_id, symbol_key)?
                .unwrap_or_else(|| MonitorState::new(Utc::now()));
            state.phase = MonitorPhase::Idle;
            state
        };

        let mut monitors = self.monitors.write().await;
        monitors.entry(MonitorKey::new(group_id, symbol_key)).or_insert(state);
        Ok(())
    }

    /// Detach one monitor. An in-flight run for it is allowed to finish;
    /// its verdict is discarded.
    pub async fn detach(&self, group_id: &str, symbol_key: &str) -> bool {
        let key = MonitorKey::new(group_id, symbol_key);
        let removed = self.monitors.write().await.remove(&key).is_some();
        if removed {
            debug!(monitor = %key, "monitor detached");
        }
        removed
    }

    pub async fn monitor_count(&self) -> usize {
        self.monitors.read().await.len()
    }

    pub async fn monitor_state(&self, group_id: &str, symbol_key: &str) -> Option<MonitorState> {
        self.monitors
            .read()
            .await
            .get(&MonitorKey::new(group_id, symbol_key))
            .cloned()
    }

    /// Record the entry a monitor guards; enables `validity_loss` diffing.
    pub async fn set_entry_snapshot(
        &self,
        group_id: &str,
        symbol_key: &str,
        snapshot: EntrySnapshot,
    ) -> Result<()> {
        let key = MonitorKey::new(group_id, symbol_key);
        let persisted = {
            let mut monitors = self.monitors.write().await;
            let state = monitors
                .get_mut(&key)
                .ok_or_else(|| EngineError::NotFound(format!("monitor {key}")))?;
            state.entry_snapshot = Some(snapshot);
            state.clone()
        };
        let store = self.store.read().await;
        store.save_monitor(&key.group_id, &key.symbol_key, &persisted)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Request a cooperative stop; the current tick finishes first.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Tick until [`stop`](Self::stop) is called.
    pub async fn run(&self) {
        self.running.store(true, Ordering::SeqCst);
        info!("alert scheduler started");
        while self.running.load(Ordering::SeqCst) {
            let fired = self.tick(Utc::now()).await;
            if fired > 0 {
                debug!(fired, "tick complete");
            }
            tokio::time::sleep(self.config.tick_interval).await;
        }
        info!("alert scheduler stopped");
    }

    /// One scheduler pass at `now`. Exposed for deterministic tests; the
    /// production loop calls it with the wall clock.
    ///
    /// Returns the number of monitors fired.
    pub async fn tick(&self, now: DateTime<Utc>) -> usize {
        let mut due = Vec::new();
        {
            let store = self.store.read().await;
            let mut monitors = self.monitors.write().await;
            for (key, state) in monitors.iter_mut() {
                if !matches!(state.phase, MonitorPhase::Idle | MonitorPhase::Failing) {
                    continue;
                }
                if now < state.next_due_at {
                    continue;
                }
                // re-resolve on every tick so config changes apply atomically
                // at tick boundaries, never mid-run
                let Ok(group) = store.get(&key.group_id) else { continue };
                if !group.enabled {
                    continue;
                }
                let Ok(cfg) = resolve(group, &key.symbol_key) else { continue };
                if !cfg.alert_policy.enabled || !window_open(&cfg.alert_policy, now) {
                    continue;
                }
                state.phase = MonitorPhase::Due;
                due.push((key.clone(), cfg));
            }
        }

        let fired = due.len();
        let mut handles = Vec::with_capacity(fired);
        for (key, cfg) in due {
            handles.push(tokio::spawn(run_monitor(
                key,
                cfg,
                now,
                self.orchestrator.clone(),
                self.monitors.clone(),
                self.store.clone(),
                self.notifier.clone(),
                self.limiter.clone(),
                self.config.clone(),
            )));
        }
        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "monitor task panicked");
            }
        }
        fired
    }
}

/// Whether `now` falls inside the policy's active weekday/hour window,
/// evaluated in the policy's local time. Empty lists mean "no restriction".
fn window_open(policy: &AlertPolicy, now: DateTime<Utc>) -> bool {
    let local = now + ChronoDuration::minutes(policy.utc_offset_minutes as i64);
    if !policy.active_weekdays.is_empty() {
        let weekday = local.weekday().num_days_from_monday() as u8;
        if !policy.active_weekdays.contains(&weekday) {
            return false;
        }
    }
    if !policy.active_hours.is_empty() {
        let hour = local.hour() as u8;
        if !policy.active_hours.contains(&hour) {
            return false;
        }
    }
    true
}

fn backoff_minutes(cadence_minutes: u32, failures: u32, cap: u32) -> u32 {
    let base = cadence_minutes.max(1);
    let shift = failures.saturating_sub(1).min(6);
    base.saturating_mul(1u32 << shift).min(cap.max(1))
}

fn build_event(
    key: &MonitorKey,
    policy: &AlertPolicy,
    now: DateTime<Utc>,
    payload: AlertPayload,
) -> AlertEvent {
    let severity = if policy.critical_conditions.iter().any(|c| c == payload.condition()) {
        Severity::Critical
    } else {
        payload.severity()
    };
    AlertEvent {
        timestamp: now,
        group_id: key.group_id.clone(),
        symbol_key: key.symbol_key.clone(),
        monitor_id: key.to_string(),
        severity,
        payload,
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_monitor(
    key: MonitorKey,
    cfg: ResolvedConfig,
    now: DateTime<Utc>,
    orchestrator: Arc<Orchestrator>,
    monitors: Arc<RwLock<BTreeMap<MonitorKey, MonitorState>>>,
    store: Arc<RwLock<GroupStore>>,
    notifier: Arc<dyn Notifier>,
    limiter: Arc<Semaphore>,
    config: SchedulerConfig,
) {
    {
        let mut map = monitors.write().await;
        match map.get_mut(&key) {
            Some(state) => state.phase = MonitorPhase::Running,
            None => return,
        }
    }

    let result = {
        let _permit = match limiter.acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return,
        };
        orchestrator.analyze(&cfg).await
    };

    let mut events = Vec::new();
    let persisted = {
        let mut map = monitors.write().await;
        let Some(state) = map.get_mut(&key) else {
            debug!(monitor = %key, "monitor torn down mid-run; verdict discarded");
            return;
        };

        match result {
            Ok(verdict) => {
                state.consecutive_failures = 0;
                state.roll_day(now);

                if let Some(last) = &state.last_verdict {
                    let payloads =
                        diff_verdicts(&cfg.alert_policy, last, &verdict, state.entry_snapshot.as_ref());
                    for payload in payloads {
                        let condition = payload.condition();
                        if !state.may_emit(condition, now, cfg.alert_policy.cadence_minutes, config.daily_event_cap) {
                            debug!(monitor = %key, condition, "event deduplicated");
                            continue;
                        }
                        state.record_emission(condition, now);
                        events.push(build_event(&key, &cfg.alert_policy, now, payload));
                    }
                }

                state.last_verdict = Some(verdict);
                state.last_run_at = Some(now);
                // anchored to now, not to the previous due time, so outages
                // do not cause catch-up bursts
                state.next_due_at = now + ChronoDuration::minutes(cfg.alert_policy.cadence_minutes.max(1) as i64);
                state.phase = MonitorPhase::Cooling;
            }
            Err(e) => {
                state.consecutive_failures += 1;
                let failures = state.consecutive_failures;
                let backoff = backoff_minutes(cfg.alert_policy.cadence_minutes, failures, config.backoff_cap_minutes);
                state.next_due_at = now + ChronoDuration::minutes(backoff as i64);
                state.phase = MonitorPhase::Failing;
                if e.is_retriable() {
                    warn!(monitor = %key, failures, backoff, error = %e, "monitor run failed; backing off");
                } else {
                    error!(monitor = %key, error = %e, "monitor run failed");
                }
                if failures == config.failure_warn_after {
                    events.push(build_event(
                        &key,
                        &cfg.alert_policy,
                        now,
                        AlertPayload::MonitorFailing {
                            consecutive_failures: failures,
                            error: e.to_string(),
                        },
                    ));
                }
            }
        }
        state.clone()
    };

    for event in &events {
        notifier.notify(event);
        let store = store.read().await;
        if let Err(e) = store.append_alert(event.timestamp, event) {
            warn!(error = %e, "failed to append alert history");
        }
    }

    {
        let store = store.read().await;
        if let Err(e) = store.save_monitor(&key.group_id, &key.symbol_key, &persisted) {
            warn!(monitor = %key, error = %e, "monitor flush failed; in-memory state stays authoritative");
        }
    }

    // Cooling ends once the flush attempt is behind us
    let mut map = monitors.write().await;
    if let Some(state) = map.get_mut(&key) {
        if state.phase == MonitorPhase::Cooling {
            state.phase = MonitorPhase::Idle;
        }
    }
}
