//! Override resolution: built-in defaults → group defaults → symbol
//! overrides.
//!
//! The resolver is a pure function of its inputs. Resolving twice, or
//! resolving a reloaded copy of a persisted group, yields identical configs.

use serde::{Deserialize, Serialize};

use crate::data::{AssetClass, Interval, Period};
use crate::error::{EngineError, Result};
use crate::indicators::{CrossoverSettings, IndicatorSpec};
use crate::model::group::Group;
use crate::model::settings::{AlertPolicy, IndicatorSettings, StrategySettings};
use crate::strategy::ParamMap;

/// The fully merged configuration the orchestrator runs with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    pub symbol_key: String,
    pub symbol: String,
    pub asset_class: AssetClass,
    pub interval: Interval,
    pub period: Period,
    pub indicators: IndicatorSettings,
    pub strategy_name: String,
    pub strategy_params: ParamMap,
    pub alert_policy: AlertPolicy,
}

impl ResolvedConfig {
    /// Built-in defaults for a symbol outside any group (one-off analysis).
    pub fn standalone(symbol: &str, asset_class: AssetClass, interval: Interval, period: Period) -> Self {
        let strategy = StrategySettings::default();
        Self {
            symbol_key: symbol.to_ascii_lowercase(),
            symbol: symbol.to_string(),
            asset_class,
            interval,
            period,
            indicators: IndicatorSettings::default(),
            strategy_name: strategy.name,
            strategy_params: strategy.params,
            alert_policy: AlertPolicy::default(),
        }
    }

    pub fn recipe(&self) -> Vec<IndicatorSpec> {
        self.indicators.recipe()
    }

    pub fn crossover_settings(&self) -> CrossoverSettings {
        self.indicators.crossover.clone()
    }
}

/// Merge the three configuration layers for `symbol_key` in `group`.
pub fn resolve(group: &Group, symbol_key: &str) -> Result<ResolvedConfig> {
    let member = group
        .member(symbol_key)
        .ok_or_else(|| EngineError::NotFound(format!("symbol `{symbol_key}` in group `{}`", group.id)))?;

    let mut indicators = IndicatorSettings::default();
    group.defaults.indicators.apply(&mut indicators);
    member.indicator_overrides.apply(&mut indicators);

    let mut strategy = StrategySettings::default();
    group.defaults.strategy.apply(&mut strategy);
    member.strategy_overrides.apply(&mut strategy);

    let mut alert_policy = AlertPolicy::default();
    group.defaults.alert_policy.apply(&mut alert_policy);
    member.alert_policy.apply(&mut alert_policy);

    Ok(ResolvedConfig {
        symbol_key: symbol_key.to_string(),
        symbol: member.symbol.clone(),
        asset_class: member.asset_class,
        interval: member.interval,
        period: member.period,
        indicators,
        strategy_name: strategy.name,
        strategy_params: strategy.params,
        alert_policy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::group::SymbolConfig;
    use crate::strategy::ParamValue;

    fn group_with_layers() -> Group {
        let mut group = Group::new("g1", "Layered", "");
        group.defaults.indicators.rsi_period = Some(10);
        group.defaults.indicators.adx_threshold = Some(20.0);
        group.defaults.strategy.name = Some("dual-supertrend-check-single-timeframe".to_string());
        group
            .defaults
            .strategy
            .params
            .insert("confirmation_threshold".to_string(), ParamValue::Int(4));
        group.defaults.alert_policy.enabled = Some(true);
        group.defaults.alert_policy.cadence_minutes = Some(30);

        let mut member = SymbolConfig::new("btc", AssetClass::Crypto, Interval::M15, Period::P7d);
        member.indicator_overrides.rsi_period = Some(21);
        member
            .strategy_overrides
            .params
            .insert("exit_threshold".to_string(), ParamValue::Int(1));
        member.alert_policy.cadence_minutes = Some(5);
        group.add_member("btc", member);
        group
    }

    #[test]
    fn layers_merge_with_symbol_winning() {
        let group = group_with_layers();
        let resolved = resolve(&group, "btc").unwrap();

        // symbol override beats group default
        assert_eq!(resolved.indicators.rsi_period, 21);
        // group default beats built-in
        assert_eq!(resolved.indicators.crossover.adx_threshold, 20.0);
        // untouched keys keep built-ins
        assert_eq!(resolved.indicators.macd_fast, 12);

        assert_eq!(resolved.strategy_name, "dual-supertrend-check-single-timeframe");
        assert_eq!(resolved.strategy_params.get("confirmation_threshold"), Some(&ParamValue::Int(4)));
        assert_eq!(resolved.strategy_params.get("exit_threshold"), Some(&ParamValue::Int(1)));

        assert!(resolved.alert_policy.enabled);
        assert_eq!(resolved.alert_policy.cadence_minutes, 5);
    }

    #[test]
    fn resolution_is_deterministic_and_idempotent() {
        let group = group_with_layers();
        let a = resolve(&group, "btc").unwrap();
        let b = resolve(&group, "btc").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_symbol_is_not_found() {
        let group = group_with_layers();
        let err = resolve(&group, "doge").unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[test]
    fn persist_reload_resolves_identically() {
        let group = group_with_layers();
        let before = resolve(&group, "btc").unwrap();
        let json = serde_json::to_string(&group).unwrap();
        let reloaded: Group = serde_json::from_str(&json).unwrap();
        let after = resolve(&reloaded, "btc").unwrap();
        assert_eq!(before, after);
    }
}
