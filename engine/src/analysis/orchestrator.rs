//! End-to-end analysis pipeline: fetch → validate → indicators → strategy.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error};

use crate::analysis::provider::DataProvider;
use crate::error::{EngineError, Result};
use crate::indicators::{compute, CrossoverDetector};
use crate::model::ResolvedConfig;
use crate::strategy::{RunMetadata, StrategyRegistry, Verdict, REASON_INTERNAL_ERROR};

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs one full analysis for a resolved symbol configuration.
///
/// All six steps are synchronous from the orchestrator's point of view;
/// concurrency lives one level up in the scheduler. A strategy failure is
/// contained here: it logs and degrades to a neutral verdict instead of
/// killing the monitor that asked.
pub struct Orchestrator {
    provider: Arc<dyn DataProvider>,
    registry: Arc<StrategyRegistry>,
    call_timeout: Duration,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn DataProvider>, registry: Arc<StrategyRegistry>) -> Self {
        Self {
            provider,
            registry,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    pub async fn analyze(&self, cfg: &ResolvedConfig) -> Result<Verdict> {
        // (1) fetch through the provider, bounded by the call timeout
        let fetch = self.provider.fetch(&cfg.symbol, cfg.asset_class, cfg.interval, cfg.period);
        let frame = tokio::time::timeout(self.call_timeout, fetch)
            .await
            .map_err(|_| {
                EngineError::DataUnavailable(format!(
                    "fetch for {} timed out after {:?}",
                    cfg.symbol, self.call_timeout
                ))
            })??;

        // (2) frame invariants were enforced at construction; log shape
        debug!(
            symbol = %cfg.symbol,
            bars = frame.len(),
            completeness = frame.completeness(),
            "frame fetched"
        );

        // (3) strategy + parameters resolve before any computation so config
        // errors surface as such, not as analysis noise
        let strategy = self.registry.create(&cfg.strategy_name)?;
        let params = strategy.validate(&cfg.strategy_params)?;

        // (4) kernel and detector from the resolved settings
        let indicators = compute(&frame, &cfg.recipe())?;
        let detector = CrossoverDetector::new(cfg.crossover_settings());

        // (5) analyze; internal strategy failures degrade to neutral
        let mut verdict = match strategy.analyze(&frame, &params, &indicators, &detector) {
            Ok(verdict) => verdict,
            Err(e) => {
                error!(symbol = %cfg.symbol, strategy = strategy.name(), error = %e, "strategy failed");
                Verdict::neutral(REASON_INTERNAL_ERROR)
            }
        };

        // (6) attach run metadata
        verdict.metadata = Some(RunMetadata {
            run_at: Utc::now(),
            strategy: strategy.name().to_string(),
            bars: frame.len(),
            data_completeness: frame.completeness(),
            params,
        });

        Ok(verdict)
    }
}
