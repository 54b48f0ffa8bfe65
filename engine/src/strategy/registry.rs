//! Strategy registry: name → factory, with legacy alias support.
//!
//! The registry is populated once at startup and treated as read-only
//! afterwards; callers share it behind an `Arc`.

use std::collections::BTreeMap;

use crate::error::{EngineError, Result};
use crate::strategy::{DefaultSingleTimeframe, DualSupertrend, ParameterTemplate, Strategy};

pub type StrategyFactory = Box<dyn Fn() -> Box<dyn Strategy> + Send + Sync>;

pub struct StrategyRegistry {
    factories: BTreeMap<String, StrategyFactory>,
    aliases: BTreeMap<String, String>,
}

impl StrategyRegistry {
    /// Registry with the built-in strategies and their legacy aliases.
    pub fn new() -> Self {
        let mut registry = Self {
            factories: BTreeMap::new(),
            aliases: BTreeMap::new(),
        };

        registry.register("default-check-single-timeframe", || {
            Box::new(DefaultSingleTimeframe::new())
        });
        registry.register("dual-supertrend-check-single-timeframe", || {
            Box::new(DualSupertrend::new())
        });

        // legacy names kept for configs written by earlier releases
        registry.alias("single-check", "default-check-single-timeframe");
        registry.alias("default-check", "default-check-single-timeframe");
        registry.alias("dual-supertrend", "dual-supertrend-check-single-timeframe");

        registry
    }

    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Strategy> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    pub fn alias(&mut self, alias: &str, target: &str) {
        self.aliases.insert(alias.to_string(), target.to_string());
    }

    /// Canonical name behind `name`, resolving aliases. Unknown names are an
    /// explicit error; there is no silent fallback.
    pub fn resolve_name<'a>(&'a self, name: &'a str) -> Result<&'a str> {
        let canonical = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        if self.factories.contains_key(canonical) {
            Ok(canonical)
        } else {
            Err(EngineError::UnknownStrategy(name.to_string()))
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve_name(name).is_ok()
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn Strategy>> {
        let canonical = self.resolve_name(name)?;
        let factory = self
            .factories
            .get(canonical)
            .ok_or_else(|| EngineError::UnknownStrategy(name.to_string()))?;
        Ok(factory())
    }

    pub fn template(&self, name: &str) -> Result<ParameterTemplate> {
        Ok(self.create(name)?.parameter_template())
    }

    /// Canonical strategy names, sorted.
    pub fn available(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Alias → canonical-name pairs, sorted.
    pub fn alias_table(&self) -> Vec<(String, String)> {
        self.aliases.iter().map(|(a, t)| (a.clone(), t.clone())).collect()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
