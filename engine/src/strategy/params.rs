//! Typed strategy parameter templates.
//!
//! A template is data, not reflection: an ordered list of named specs, each
//! carrying a kind, a default and its constraint. Validation checks every
//! supplied value and reports *all* offending fields at once, so a user
//! fixing a config file sees the full list in one pass.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// A runtime parameter value.
///
/// `untagged` keeps the JSON form natural: `3`, `3.142`, `true`, `"fast"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

/// Validated parameter assignment, keyed by parameter name.
pub type ParamMap = BTreeMap<String, ParamValue>;

/// Convenience accessors in the style of config lookups elsewhere in the
/// engine: typed read with a literal fallback.
pub trait ParamMapExt {
    fn int_or(&self, name: &str, default: i64) -> i64;
    fn float_or(&self, name: &str, default: f64) -> f64;
    fn bool_or(&self, name: &str, default: bool) -> bool;
}

impl ParamMapExt for ParamMap {
    fn int_or(&self, name: &str, default: i64) -> i64 {
        self.get(name).and_then(ParamValue::as_int).unwrap_or(default)
    }

    fn float_or(&self, name: &str, default: f64) -> f64 {
        self.get(name).and_then(ParamValue::as_float).unwrap_or(default)
    }

    fn bool_or(&self, name: &str, default: bool) -> bool {
        self.get(name).and_then(ParamValue::as_bool).unwrap_or(default)
    }
}

/// Kind, default and constraint of one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ParamKind {
    Int { default: i64, min: i64, max: i64 },
    Float { default: f64, min: f64, max: f64 },
    Bool { default: bool },
    Enum { default: String, choices: Vec<String> },
}

impl ParamKind {
    pub fn default_value(&self) -> ParamValue {
        match self {
            ParamKind::Int { default, .. } => ParamValue::Int(*default),
            ParamKind::Float { default, .. } => ParamValue::Float(*default),
            ParamKind::Bool { default } => ParamValue::Bool(*default),
            ParamKind::Enum { default, .. } => ParamValue::Text(default.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub kind: ParamKind,
}

/// Ordered parameter template of a strategy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterTemplate {
    specs: Vec<ParamSpec>,
}

impl ParameterTemplate {
    pub fn new() -> Self {
        Self { specs: Vec::new() }
    }

    pub fn int(mut self, name: &str, description: &str, default: i64, min: i64, max: i64) -> Self {
        self.specs.push(ParamSpec {
            name: name.to_string(),
            description: description.to_string(),
            kind: ParamKind::Int { default, min, max },
        });
        self
    }

    pub fn float(mut self, name: &str, description: &str, default: f64, min: f64, max: f64) -> Self {
        self.specs.push(ParamSpec {
            name: name.to_string(),
            description: description.to_string(),
            kind: ParamKind::Float { default, min, max },
        });
        self
    }

    pub fn boolean(mut self, name: &str, description: &str, default: bool) -> Self {
        self.specs.push(ParamSpec {
            name: name.to_string(),
            description: description.to_string(),
            kind: ParamKind::Bool { default },
        });
        self
    }

    pub fn choice(mut self, name: &str, description: &str, default: &str, choices: &[&str]) -> Self {
        self.specs.push(ParamSpec {
            name: name.to_string(),
            description: description.to_string(),
            kind: ParamKind::Enum {
                default: default.to_string(),
                choices: choices.iter().map(|c| c.to_string()).collect(),
            },
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn specs(&self) -> &[ParamSpec] {
        &self.specs
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    /// All defaults as a ready-to-use assignment.
    pub fn defaults(&self) -> ParamMap {
        self.specs
            .iter()
            .map(|s| (s.name.clone(), s.kind.default_value()))
            .collect()
    }

    /// Validate a user assignment against the template.
    ///
    /// Returns the normalized map (defaults filled in for unset keys) or an
    /// error naming every unknown key, kind mismatch and range violation.
    pub fn validate(&self, params: &ParamMap) -> Result<ParamMap> {
        let mut errors = Vec::new();

        for name in params.keys() {
            if self.get(name).is_none() {
                errors.push(format!("unknown parameter `{name}`"));
            }
        }

        let mut normalized = ParamMap::new();
        for spec in &self.specs {
            let value = match params.get(&spec.name) {
                None => spec.kind.default_value(),
                Some(value) => match (&spec.kind, value) {
                    (ParamKind::Int { min, max, .. }, ParamValue::Int(v)) => {
                        if v < min || v > max {
                            errors.push(format!(
                                "`{}` = {v} outside range [{min}, {max}]",
                                spec.name
                            ));
                        }
                        ParamValue::Int(*v)
                    }
                    (ParamKind::Float { min, max, .. }, _) if value.as_float().is_some() => {
                        let v = value.as_float().unwrap_or_default();
                        if v < *min || v > *max {
                            errors.push(format!(
                                "`{}` = {v} outside range [{min}, {max}]",
                                spec.name
                            ));
                        }
                        ParamValue::Float(v)
                    }
                    (ParamKind::Bool { .. }, ParamValue::Bool(v)) => ParamValue::Bool(*v),
                    (ParamKind::Enum { choices, .. }, ParamValue::Text(v)) => {
                        if !choices.contains(v) {
                            errors.push(format!(
                                "`{}` = `{v}` not one of {choices:?}",
                                spec.name
                            ));
                        }
                        ParamValue::Text(v.clone())
                    }
                    (_, other) => {
                        errors.push(format!("`{}` has wrong kind: {other:?}", spec.name));
                        spec.kind.default_value()
                    }
                },
            };
            normalized.insert(spec.name.clone(), value);
        }

        if errors.is_empty() {
            Ok(normalized)
        } else {
            Err(EngineError::ParameterValidation(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> ParameterTemplate {
        ParameterTemplate::new()
            .int("period", "lookback period", 14, 2, 100)
            .float("multiplier", "band multiplier", 3.0, 0.5, 10.0)
            .boolean("gated", "apply the ADX gate", true)
            .choice("mode", "smoothing mode", "sma", &["sma", "ema"])
    }

    #[test]
    fn defaults_always_validate() {
        let t = template();
        let normalized = t.validate(&t.defaults()).unwrap();
        assert_eq!(normalized, t.defaults());
    }

    #[test]
    fn empty_map_resolves_to_defaults() {
        let t = template();
        let normalized = t.validate(&ParamMap::new()).unwrap();
        assert_eq!(normalized.int_or("period", 0), 14);
        assert_eq!(normalized.float_or("multiplier", 0.0), 3.0);
    }

    #[test]
    fn int_accepted_for_float_kind() {
        let t = template();
        let mut params = ParamMap::new();
        params.insert("multiplier".to_string(), ParamValue::Int(2));
        let normalized = t.validate(&params).unwrap();
        assert_eq!(normalized.float_or("multiplier", 0.0), 2.0);
    }

    #[test]
    fn out_of_range_names_the_key() {
        let t = template();
        let mut params = ParamMap::new();
        params.insert("period".to_string(), ParamValue::Int(500));
        let err = t.validate(&params).unwrap_err();
        match err {
            EngineError::ParameterValidation(errors) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("`period`"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn all_offending_fields_are_reported() {
        let t = template();
        let mut params = ParamMap::new();
        params.insert("period".to_string(), ParamValue::Int(500));
        params.insert("mode".to_string(), ParamValue::Text("wilder".to_string()));
        params.insert("bogus".to_string(), ParamValue::Bool(true));
        params.insert("gated".to_string(), ParamValue::Int(1));
        let err = t.validate(&params).unwrap_err();
        match err {
            EngineError::ParameterValidation(errors) => assert_eq!(errors.len(), 4),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn serde_round_trip() {
        let t = template();
        let json = serde_json::to_string(&t).unwrap();
        let back: ParameterTemplate = serde_json::from_str(&json).unwrap();
        assert_eq!(t, back);
    }
}
