//! Strategy engine: verdict types, the strategy trait and the registry.
//!
//! A strategy is a pure analyzer. It consumes a frame, validated parameters
//! and precomputed indicator output, and produces a [`Verdict`]. Routine data
//! shortfalls (too few bars, a dead-flat market) are verdicts, not errors;
//! only configuration problems are fatal.

pub mod implementations;
pub mod params;
pub mod registry;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use implementations::{DefaultSingleTimeframe, DualSupertrend};
pub use params::{ParamKind, ParamMap, ParamMapExt, ParamSpec, ParamValue, ParameterTemplate};
pub use registry::StrategyRegistry;

use crate::data::Frame;
use crate::error::Result;
use crate::indicators::{CrossoverDetector, CrossoverEvent, IndicatorResult};

/// Reason code attached to verdicts produced without a full analysis.
pub const REASON_INSUFFICIENT_HISTORY: &str = "insufficient_history";
pub const REASON_INSUFFICIENT_VOLATILITY: &str = "insufficient_volatility";
pub const REASON_INTERNAL_ERROR: &str = "internal_error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strength {
    StrongBuy,
    Buy,
    Neutral,
    Sell,
    StrongSell,
}

impl Strength {
    /// The sentiment implied by a strength reading.
    pub fn sentiment(&self) -> Sentiment {
        match self {
            Strength::StrongBuy | Strength::Buy => Sentiment::Bullish,
            Strength::StrongSell | Strength::Sell => Sentiment::Bearish,
            Strength::Neutral => Sentiment::Neutral,
        }
    }
}

/// ATR-derived stop and target prices around the latest close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskLevels {
    pub stop_long: f64,
    pub target_long: f64,
    pub stop_short: f64,
    pub target_short: f64,
}

impl RiskLevels {
    pub fn from_atr(close: f64, atr: f64, stop_multiplier: f64, target_multiplier: f64) -> Self {
        Self {
            stop_long: close - atr * stop_multiplier,
            target_long: close + atr * target_multiplier,
            stop_short: close + atr * stop_multiplier,
            target_short: close - atr * target_multiplier,
        }
    }
}

/// Metadata the orchestrator attaches to every verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run_at: DateTime<Utc>,
    pub strategy: String,
    pub bars: usize,
    pub data_completeness: f64,
    pub params: ParamMap,
}

/// Structured output of one strategy invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub sentiment: Sentiment,
    pub strength: Strength,
    /// Signal conviction in [0, 1].
    pub confidence: f64,
    pub confirmations_buy: u32,
    pub confirmations_sell: u32,
    pub risk_levels: Option<RiskLevels>,
    /// Named scalar snapshot of the indicators behind the verdict.
    pub snapshot: BTreeMap<String, f64>,
    /// Short machine-readable reason codes.
    pub reasons: Vec<String>,
    /// Crossover events observed within the detector lookback.
    pub crossovers: Vec<CrossoverEvent>,
    pub metadata: Option<RunMetadata>,
}

impl Verdict {
    /// Neutral verdict with zero confidence and a single reason code.
    pub fn neutral(reason: &str) -> Self {
        Self {
            sentiment: Sentiment::Neutral,
            strength: Strength::Neutral,
            confidence: 0.0,
            confirmations_buy: 0,
            confirmations_sell: 0,
            risk_levels: None,
            snapshot: BTreeMap::new(),
            reasons: vec![reason.to_string()],
            crossovers: Vec::new(),
            metadata: None,
        }
    }
}

/// A pluggable analyzer.
pub trait Strategy: Send + Sync {
    /// Stable registry identifier.
    fn name(&self) -> &'static str;

    /// The typed, ordered parameter template.
    fn parameter_template(&self) -> ParameterTemplate;

    /// Validate and normalize a parameter assignment. Defaults are filled in
    /// for unset keys; every offending field is reported.
    fn validate(&self, params: &ParamMap) -> Result<ParamMap> {
        self.parameter_template().validate(params)
    }

    /// Produce a verdict for the latest complete bar.
    fn analyze(
        &self,
        frame: &Frame,
        params: &ParamMap,
        indicators: &IndicatorResult,
        detector: &CrossoverDetector,
    ) -> Result<Verdict>;
}

impl std::fmt::Debug for dyn Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strategy").field("name", &self.name()).finish()
    }
}
