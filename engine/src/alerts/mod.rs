//! Periodic alerting: monitors, verdict diffing, event emission.
//!
//! The [`AlertScheduler`] owns one [`monitor::MonitorState`] per
//! (group, symbol) pair with an enabled policy, re-runs the analysis
//! orchestrator on each monitor's cadence, and emits classified
//! [`AlertEvent`]s to the injected [`Notifier`] when successive verdicts
//! differ materially.

pub mod diff;
pub mod history;
pub mod monitor;
pub mod notifier;
pub mod scheduler;

pub use diff::diff_verdicts;
pub use history::{load_day, summarize, AlertHistorySummary};
pub use monitor::{MonitorKey, MonitorPhase, MonitorState};
pub use notifier::{AlertEvent, AlertPayload, BufferNotifier, EntrySnapshot, LogNotifier, Notifier, Severity};
pub use scheduler::{AlertScheduler, SchedulerConfig};
