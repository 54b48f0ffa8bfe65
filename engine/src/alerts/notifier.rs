//! Alert events and the notification sink.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::indicators::CrossoverEvent;
use crate::strategy::Sentiment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Critical,
}

/// Snapshot of the position a monitor is guarding, recorded at entry time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySnapshot {
    pub sentiment: Sentiment,
    pub confidence: f64,
    pub price: f64,
    pub entered_at: DateTime<Utc>,
}

/// Payload of one triggered diff condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "condition", rename_all = "snake_case")]
pub enum AlertPayload {
    SentimentFlip {
        from: Sentiment,
        to: Sentiment,
        confidence: f64,
        indicator_deltas: BTreeMap<String, f64>,
    },
    ConfidenceDrift {
        from: f64,
        to: f64,
        delta: f64,
    },
    AtrBandShift {
        old_upper: f64,
        old_lower: f64,
        new_upper: f64,
        new_lower: f64,
        suggested_trailing_stop: f64,
    },
    ValidityLoss {
        entry: EntrySnapshot,
        current_sentiment: Sentiment,
        current_confidence: f64,
    },
    NewCrossover {
        event: CrossoverEvent,
    },
    MonitorFailing {
        consecutive_failures: u32,
        error: String,
    },
}

impl AlertPayload {
    /// Stable condition name, used for deduplication and policy escalation.
    pub fn condition(&self) -> &'static str {
        match self {
            AlertPayload::SentimentFlip { .. } => "sentiment_flip",
            AlertPayload::ConfidenceDrift { .. } => "confidence_drift",
            AlertPayload::AtrBandShift { .. } => "atr_band_shift",
            AlertPayload::ValidityLoss { .. } => "validity_loss",
            AlertPayload::NewCrossover { .. } => "new_crossover",
            AlertPayload::MonitorFailing { .. } => "monitor_failing",
        }
    }

    /// Default severity of the condition. Policies may escalate named
    /// conditions to critical on top of this.
    pub fn severity(&self) -> Severity {
        match self {
            AlertPayload::SentimentFlip { .. }
            | AlertPayload::ValidityLoss { .. }
            | AlertPayload::MonitorFailing { .. } => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

/// Envelope delivered to the notifier and appended to the alert history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub timestamp: DateTime<Utc>,
    pub group_id: String,
    pub symbol_key: String,
    pub monitor_id: String,
    pub severity: Severity,
    #[serde(flatten)]
    pub payload: AlertPayload,
}

/// Notification transport, injected into the scheduler.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: &AlertEvent);
}

/// Notifier that writes events to the tracing log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: &AlertEvent) {
        match event.severity {
            Severity::Info => info!(
                monitor = %event.monitor_id,
                condition = event.payload.condition(),
                "alert"
            ),
            Severity::Warn | Severity::Critical => warn!(
                monitor = %event.monitor_id,
                condition = event.payload.condition(),
                severity = ?event.severity,
                "alert"
            ),
        }
    }
}

/// In-memory notifier collecting every event; used by tests and the CLI's
/// one-shot watch summary.
#[derive(Debug, Default)]
pub struct BufferNotifier {
    events: Mutex<Vec<AlertEvent>>,
}

impl BufferNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<AlertEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for BufferNotifier {
    fn notify(&self, event: &AlertEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
