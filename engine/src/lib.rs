//! MarketSentry: a market-analysis and alerting engine.
//!
//! The crate analyses OHLCV candle series for heterogeneous instruments
//! (forex, stocks, crypto, indices, futures), evaluates a configurable set of
//! technical indicators, applies a pluggable strategy to produce a directional
//! verdict with risk levels, and re-evaluates a portfolio of instruments on
//! independent schedules, emitting alerts on material change.
//!
//! # Architecture
//!
//! - **Data**: immutable OHLCV [`data::Frame`] windows per (symbol, interval)
//! - **Indicators**: pure computation kernel over a frame ([`indicators`])
//! - **Strategies**: pluggable analyzers with typed parameter templates,
//!   looked up through the [`strategy::StrategyRegistry`]
//! - **Model**: symbol groups with hierarchical configuration and JSON
//!   persistence ([`model`])
//! - **Analysis**: fetch → indicators → strategy orchestration ([`analysis`])
//! - **Alerts**: cadenced monitors that diff successive verdicts and notify
//!   ([`alerts`])
//!
//! # Example
//!
//! ```no_run
//! use marketsentry::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> marketsentry::Result<()> {
//! let provider = Arc::new(SyntheticProvider::default());
//! let registry = Arc::new(StrategyRegistry::new());
//! let orchestrator = Orchestrator::new(provider, registry);
//!
//! let cfg = ResolvedConfig::standalone("eurusd", AssetClass::Forex, Interval::H1, Period::P7d);
//! let verdict = orchestrator.analyze(&cfg).await?;
//! println!("{:?} ({:.0}%)", verdict.sentiment, verdict.confidence * 100.0);
//! # Ok(())
//! # }
//! ```

pub mod alerts;
pub mod analysis;
pub mod data;
pub mod error;
pub mod indicators;
pub mod model;
pub mod strategy;

pub use error::{EngineError, Result};

// Re-export commonly used types
pub mod prelude {
    pub use crate::alerts::{AlertEvent, AlertPayload, AlertScheduler, LogNotifier, Notifier, Severity};
    pub use crate::analysis::{DataProvider, Orchestrator, SyntheticProvider};
    pub use crate::data::{AssetClass, Bar, Frame, Interval, Period};
    pub use crate::error::{EngineError, Result};
    pub use crate::indicators::{compute, CrossoverDetector, CrossoverSettings, IndicatorResult, IndicatorSpec};
    pub use crate::model::{Group, GroupStore, ResolvedConfig, SymbolConfig};
    pub use crate::strategy::{Sentiment, Strategy, StrategyRegistry, Strength, Verdict};
}
