//! Indicator computation kernel.
//!
//! [`compute`] evaluates an ordered recipe of [`IndicatorSpec`]s over a
//! [`Frame`] and returns an [`IndicatorResult`] of named series and scalars.
//! The kernel is pure: no I/O, no wall clock, no shared state, and a given
//! (frame, recipe) pair always produces bit-identical output. Warm-up bars
//! are NaN; one indicator running out of history never short-circuits the
//! rest of the recipe.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod cci;
pub mod crossover;
pub mod ma;
pub mod macd;
mod rolling;
pub mod rsi;
pub mod stochastic;
pub mod supertrend;
pub mod williams;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use crossover::{CrossKind, CrossSource, CrossoverDetector, CrossoverEvent, CrossoverSettings};
pub use supertrend::SupertrendOutput;

use crate::data::Frame;
use crate::error::Result;

/// One entry of a kernel recipe: an indicator family with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum IndicatorSpec {
    Rsi { period: usize },
    Stochastic { k_period: usize, d_period: usize, smooth_k: usize },
    WilliamsR { period: usize },
    Cci { period: usize },
    Macd { fast: usize, slow: usize, signal: usize },
    Dmi { period: usize },
    Bollinger { period: usize, stddev: f64 },
    Atr { period: usize },
    Sma { periods: Vec<usize> },
    Ema { periods: Vec<usize> },
    Supertrend { tag: String, period: usize, multiplier: f64 },
}

impl IndicatorSpec {
    pub fn rsi_default() -> Self {
        IndicatorSpec::Rsi { period: 14 }
    }

    pub fn stochastic_default() -> Self {
        IndicatorSpec::Stochastic { k_period: 14, d_period: 3, smooth_k: 3 }
    }

    pub fn williams_r_default() -> Self {
        IndicatorSpec::WilliamsR { period: 14 }
    }

    pub fn cci_default() -> Self {
        IndicatorSpec::Cci { period: 20 }
    }

    pub fn macd_default() -> Self {
        IndicatorSpec::Macd { fast: 12, slow: 26, signal: 9 }
    }

    pub fn dmi_default() -> Self {
        IndicatorSpec::Dmi { period: 14 }
    }

    pub fn bollinger_default() -> Self {
        IndicatorSpec::Bollinger { period: 20, stddev: 2.0 }
    }

    pub fn atr_default() -> Self {
        IndicatorSpec::Atr { period: 14 }
    }
}

/// Output of one kernel run: named series aligned with the frame, named
/// scalar summaries, and an echo of the recipe so any result can be
/// reproduced from its own record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorResult {
    series: BTreeMap<String, Vec<f64>>,
    scalars: BTreeMap<String, f64>,
    recipe: Vec<IndicatorSpec>,
}

impl IndicatorResult {
    pub fn series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(Vec::as_slice)
    }

    pub fn scalar(&self, name: &str) -> Option<f64> {
        self.scalars.get(name).copied()
    }

    /// Last value of a named series, NaN when the series is missing.
    pub fn latest(&self, name: &str) -> f64 {
        self.series
            .get(name)
            .and_then(|s| s.last().copied())
            .unwrap_or(f64::NAN)
    }

    /// Value of a named series at the second-to-last bar, NaN when absent.
    pub fn previous(&self, name: &str) -> f64 {
        self.series
            .get(name)
            .and_then(|s| s.len().checked_sub(2).map(|i| s[i]))
            .unwrap_or(f64::NAN)
    }

    pub fn series_names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn recipe(&self) -> &[IndicatorSpec] {
        &self.recipe
    }

    fn insert_series(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }
}

/// Evaluate `recipe` over `frame`.
pub fn compute(frame: &Frame, recipe: &[IndicatorSpec]) -> Result<IndicatorResult> {
    let high = frame.high();
    let low = frame.low();
    let close = frame.close();

    let mut result = IndicatorResult {
        series: BTreeMap::new(),
        scalars: BTreeMap::new(),
        recipe: recipe.to_vec(),
    };

    for spec in recipe {
        match spec {
            IndicatorSpec::Rsi { period } => {
                result.insert_series("rsi", rsi::rsi(close, *period));
                result.scalars.insert("rsi_overbought".to_string(), rsi::RSI_OVERBOUGHT);
                result.scalars.insert("rsi_oversold".to_string(), rsi::RSI_OVERSOLD);
            }
            IndicatorSpec::Stochastic { k_period, d_period, smooth_k } => {
                let out = stochastic::stochastic(high, low, close, *k_period, *smooth_k, *d_period);
                result.insert_series("stoch_k", out.k);
                result.insert_series("stoch_d", out.d);
            }
            IndicatorSpec::WilliamsR { period } => {
                result.insert_series("williams_r", williams::williams_r(high, low, close, *period));
            }
            IndicatorSpec::Cci { period } => {
                result.insert_series("cci", cci::cci(high, low, close, *period));
            }
            IndicatorSpec::Macd { fast, slow, signal } => {
                let out = macd::macd(close, *fast, *slow, *signal);
                result.insert_series("macd", out.macd);
                result.insert_series("macd_signal", out.signal);
                result.insert_series("macd_hist", out.hist);
            }
            IndicatorSpec::Dmi { period } => {
                let out = adx::dmi(high, low, close, *period);
                result.insert_series("plus_di", out.plus_di);
                result.insert_series("minus_di", out.minus_di);
                result.insert_series("adx", out.adx);
            }
            IndicatorSpec::Bollinger { period, stddev } => {
                let out = bollinger::bollinger(close, *period, *stddev);
                result.insert_series("bb_upper", out.upper);
                result.insert_series("bb_middle", out.middle);
                result.insert_series("bb_lower", out.lower);
                result.insert_series("bb_width", out.width);
            }
            IndicatorSpec::Atr { period } => {
                result.insert_series("atr", atr::atr(high, low, close, *period));
            }
            IndicatorSpec::Sma { periods } => {
                for p in periods {
                    result.insert_series(format!("sma_{p}"), ma::sma(close, *p));
                }
            }
            IndicatorSpec::Ema { periods } => {
                for p in periods {
                    result.insert_series(format!("ema_{p}"), ma::ema(close, *p));
                }
            }
            IndicatorSpec::Supertrend { tag, period, multiplier } => {
                let out = supertrend::supertrend(high, low, close, *period, *multiplier);
                result.insert_series(
                    format!("st_{tag}_direction"),
                    out.direction.iter().map(|d| *d as f64).collect(),
                );
                result.insert_series(format!("st_{tag}_value"), out.value);
            }
        }
    }

    Ok(result)
}

/// The recipe behind the default multi-indicator strategy.
pub fn default_recipe() -> Vec<IndicatorSpec> {
    vec![
        IndicatorSpec::rsi_default(),
        IndicatorSpec::stochastic_default(),
        IndicatorSpec::cci_default(),
        IndicatorSpec::macd_default(),
        IndicatorSpec::williams_r_default(),
        IndicatorSpec::dmi_default(),
        IndicatorSpec::bollinger_default(),
        IndicatorSpec::atr_default(),
    ]
}
