//! Indicator, strategy and alert-policy settings with sparse override
//! layers.
//!
//! Concrete settings structs carry the built-in defaults; the `*Overrides`
//! companions hold only the keys a group or symbol actually sets. Resolution
//! applies overrides in place, so unset keys always fall through to the
//! layer below.

use serde::{Deserialize, Serialize};

use crate::indicators::{CrossoverSettings, IndicatorSpec};
use crate::strategy::ParamMap;

/// Fully resolved indicator configuration for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSettings {
    pub rsi_period: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub stoch_k_period: usize,
    pub stoch_d_period: usize,
    pub stoch_smooth_k: usize,
    pub williams_r_period: usize,
    pub cci_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub adx_period: usize,
    pub atr_period: usize,
    pub bb_period: usize,
    pub bb_stddev: f64,
    pub sma_periods: Vec<usize>,
    pub ema_periods: Vec<usize>,
    pub crossover: CrossoverSettings,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            stoch_k_period: 14,
            stoch_d_period: 3,
            stoch_smooth_k: 3,
            williams_r_period: 14,
            cci_period: 20,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            adx_period: 14,
            atr_period: 14,
            bb_period: 20,
            bb_stddev: 2.0,
            sma_periods: vec![20, 50, 200],
            ema_periods: vec![12, 26],
            crossover: CrossoverSettings::default(),
        }
    }
}

impl IndicatorSettings {
    /// Kernel recipe implied by these settings.
    pub fn recipe(&self) -> Vec<IndicatorSpec> {
        vec![
            IndicatorSpec::Rsi { period: self.rsi_period },
            IndicatorSpec::Stochastic {
                k_period: self.stoch_k_period,
                d_period: self.stoch_d_period,
                smooth_k: self.stoch_smooth_k,
            },
            IndicatorSpec::WilliamsR { period: self.williams_r_period },
            IndicatorSpec::Cci { period: self.cci_period },
            IndicatorSpec::Macd {
                fast: self.macd_fast,
                slow: self.macd_slow,
                signal: self.macd_signal,
            },
            IndicatorSpec::Dmi { period: self.adx_period },
            IndicatorSpec::Bollinger { period: self.bb_period, stddev: self.bb_stddev },
            IndicatorSpec::Atr { period: self.atr_period },
            IndicatorSpec::Sma { periods: self.sma_periods.clone() },
            IndicatorSpec::Ema { periods: self.ema_periods.clone() },
        ]
    }
}

/// Sparse overlay over [`IndicatorSettings`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi_period: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi_overbought: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi_oversold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stoch_k_period: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stoch_d_period: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stoch_smooth_k: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub williams_r_period: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cci_period: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd_fast: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd_slow: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd_signal: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adx_period: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atr_period: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bb_period: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bb_stddev: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sma_periods: Option<Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ema_periods: Option<Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crossover_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volatility_filter_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adx_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crossover_lookback: Option<usize>,
}

impl IndicatorOverrides {
    pub fn apply(&self, base: &mut IndicatorSettings) {
        macro_rules! overlay {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = &self.$field {
                    base.$field = v.clone();
                })*
            };
        }
        overlay!(
            rsi_period,
            rsi_overbought,
            rsi_oversold,
            stoch_k_period,
            stoch_d_period,
            stoch_smooth_k,
            williams_r_period,
            cci_period,
            macd_fast,
            macd_slow,
            macd_signal,
            adx_period,
            atr_period,
            bb_period,
            bb_stddev,
            sma_periods,
            ema_periods,
        );
        if let Some(v) = self.crossover_enabled {
            base.crossover.enabled = v;
        }
        if let Some(v) = self.volatility_filter_enabled {
            base.crossover.volatility_filter_enabled = v;
        }
        if let Some(v) = self.adx_threshold {
            base.crossover.adx_threshold = v;
        }
        if let Some(v) = self.crossover_lookback {
            base.crossover.lookback = v;
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Strategy selection and parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySettings {
    pub name: String,
    pub params: ParamMap,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            name: "default-check-single-timeframe".to_string(),
            params: ParamMap::new(),
        }
    }
}

/// Sparse overlay over [`StrategySettings`]. `params` entries override
/// individual keys; keys absent here fall through.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "ParamMap::is_empty")]
    pub params: ParamMap,
}

impl StrategyOverrides {
    pub fn apply(&self, base: &mut StrategySettings) {
        if let Some(name) = &self.name {
            if name != &base.name {
                base.name = name.clone();
                // parameters written for another strategy do not carry over
                base.params.clear();
            }
        }
        for (key, value) in &self.params {
            base.params.insert(key.clone(), value.clone());
        }
    }
}

/// Which diff conditions a monitor alerts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConditions {
    pub sentiment_flip: bool,
    pub confidence_drift: bool,
    pub atr_band_shift: bool,
    pub validity_loss: bool,
    pub new_crossover: bool,
}

impl Default for AlertConditions {
    fn default() -> Self {
        Self {
            sentiment_flip: true,
            confidence_drift: false,
            atr_band_shift: false,
            validity_loss: true,
            new_crossover: true,
        }
    }
}

/// Fully resolved alert policy for one monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertPolicy {
    pub enabled: bool,
    pub cadence_minutes: u32,
    /// 0 = Monday … 6 = Sunday.
    pub active_weekdays: Vec<u8>,
    /// Hours (0..23) in the policy's local time.
    pub active_hours: Vec<u8>,
    /// Local-time offset from UTC for the weekday/hour window.
    pub utc_offset_minutes: i32,
    pub conditions: AlertConditions,
    pub min_confidence_drift: f64,
    pub min_band_shift_units: f64,
    /// Condition names escalated to critical severity for this monitor.
    pub critical_conditions: Vec<String>,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            cadence_minutes: 15,
            active_weekdays: vec![0, 1, 2, 3, 4],
            active_hours: (9..17).collect(),
            utc_offset_minutes: 0,
            conditions: AlertConditions::default(),
            min_confidence_drift: 0.15,
            min_band_shift_units: 1.0,
            critical_conditions: Vec::new(),
        }
    }
}

/// Sparse overlay over [`AlertPolicy`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertPolicyOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cadence_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_weekdays: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_hours: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_offset_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<AlertConditions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_confidence_drift: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_band_shift_units: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_conditions: Option<Vec<String>>,
}

impl AlertPolicyOverrides {
    pub fn apply(&self, base: &mut AlertPolicy) {
        macro_rules! overlay {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = &self.$field {
                    base.$field = v.clone();
                })*
            };
        }
        overlay!(
            enabled,
            cadence_minutes,
            active_weekdays,
            active_hours,
            utc_offset_minutes,
            conditions,
            min_confidence_drift,
            min_band_shift_units,
            critical_conditions,
        );
    }
}
