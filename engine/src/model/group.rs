//! Symbol groups and their member configurations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::{AssetClass, Interval, Period};
use crate::model::settings::{
    AlertPolicyOverrides, IndicatorOverrides, StrategyOverrides,
};

/// Configuration of one symbol within a group. Override layers are sparse;
/// anything unset falls through to the group defaults and then to the
/// built-ins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolConfig {
    pub symbol: String,
    pub asset_class: AssetClass,
    pub interval: Interval,
    pub period: Period,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub indicator_overrides: IndicatorOverrides,
    #[serde(default)]
    pub strategy_overrides: StrategyOverrides,
    #[serde(default)]
    pub alert_policy: AlertPolicyOverrides,
}

fn default_true() -> bool {
    true
}

impl SymbolConfig {
    pub fn new(symbol: impl Into<String>, asset_class: AssetClass, interval: Interval, period: Period) -> Self {
        Self {
            symbol: symbol.into(),
            asset_class,
            interval,
            period,
            enabled: true,
            indicator_overrides: IndicatorOverrides::default(),
            strategy_overrides: StrategyOverrides::default(),
            alert_policy: AlertPolicyOverrides::default(),
        }
    }
}

/// Group-level defaults, themselves sparse overlays over the built-ins.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupDefaults {
    pub indicators: IndicatorOverrides,
    pub strategy: StrategyOverrides,
    pub alert_policy: AlertPolicyOverrides,
}

/// A named collection of symbols sharing defaults and an alert setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub members: BTreeMap<String, SymbolConfig>,
    #[serde(default)]
    pub defaults: GroupDefaults,
}

impl Group {
    pub fn new(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            enabled: true,
            members: BTreeMap::new(),
            defaults: GroupDefaults::default(),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn member(&self, symbol_key: &str) -> Option<&SymbolConfig> {
        self.members.get(symbol_key)
    }

    pub fn add_member(&mut self, symbol_key: impl Into<String>, config: SymbolConfig) {
        self.members.insert(symbol_key.into(), config);
        self.touch();
    }

    pub fn remove_member(&mut self, symbol_key: &str) -> bool {
        let removed = self.members.remove(symbol_key).is_some();
        if removed {
            self.touch();
        }
        removed
    }

    pub fn enabled_members(&self) -> impl Iterator<Item = (&String, &SymbolConfig)> {
        self.members.iter().filter(|(_, config)| config.enabled)
    }

    /// Members whose resolved alert policy would be enabled: the symbol
    /// override wins, then the group default, then the built-in `false`.
    pub fn alerting_members(&self) -> Vec<&String> {
        self.enabled_members()
            .filter(|(_, config)| {
                config
                    .alert_policy
                    .enabled
                    .or(self.defaults.alert_policy.enabled)
                    .unwrap_or(false)
            })
            .map(|(key, _)| key)
            .collect()
    }
}
