//! Interval, period and asset-class enums.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Bar interval supported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "2h")]
    H2,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "1wk")]
    W1,
    #[serde(rename = "1mo")]
    Mo1,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::M1 => "1m",
            Interval::M5 => "5m",
            Interval::M15 => "15m",
            Interval::M30 => "30m",
            Interval::H1 => "1h",
            Interval::H2 => "2h",
            Interval::H4 => "4h",
            Interval::D1 => "1d",
            Interval::W1 => "1wk",
            Interval::Mo1 => "1mo",
        }
    }

    /// Nominal duration of one bar. Months are approximated as 30 days; the
    /// value is only used for completeness estimates, never for scheduling.
    pub fn duration(&self) -> Duration {
        match self {
            Interval::M1 => Duration::minutes(1),
            Interval::M5 => Duration::minutes(5),
            Interval::M15 => Duration::minutes(15),
            Interval::M30 => Duration::minutes(30),
            Interval::H1 => Duration::hours(1),
            Interval::H2 => Duration::hours(2),
            Interval::H4 => Duration::hours(4),
            Interval::D1 => Duration::days(1),
            Interval::W1 => Duration::weeks(1),
            Interval::Mo1 => Duration::days(30),
        }
    }
}

impl FromStr for Interval {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1m" => Ok(Interval::M1),
            "5m" => Ok(Interval::M5),
            "15m" => Ok(Interval::M15),
            "30m" => Ok(Interval::M30),
            "1h" => Ok(Interval::H1),
            "2h" => Ok(Interval::H2),
            "4h" => Ok(Interval::H4),
            "1d" => Ok(Interval::D1),
            "1wk" => Ok(Interval::W1),
            "1mo" => Ok(Interval::Mo1),
            other => Err(EngineError::ParameterValidation(vec![format!("unknown interval: {other}")])),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// History period requested from a data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1d")]
    P1d,
    #[serde(rename = "5d")]
    P5d,
    #[serde(rename = "7d")]
    P7d,
    #[serde(rename = "1wk")]
    P1wk,
    #[serde(rename = "1mo")]
    P1mo,
    #[serde(rename = "3mo")]
    P3mo,
    #[serde(rename = "6mo")]
    P6mo,
    #[serde(rename = "1y")]
    P1y,
    #[serde(rename = "2y")]
    P2y,
    #[serde(rename = "5y")]
    P5y,
    #[serde(rename = "max")]
    Max,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::P1d => "1d",
            Period::P5d => "5d",
            Period::P7d => "7d",
            Period::P1wk => "1wk",
            Period::P1mo => "1mo",
            Period::P3mo => "3mo",
            Period::P6mo => "6mo",
            Period::P1y => "1y",
            Period::P2y => "2y",
            Period::P5y => "5y",
            Period::Max => "max",
        }
    }
}

impl FromStr for Period {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1d" => Ok(Period::P1d),
            "5d" => Ok(Period::P5d),
            "7d" => Ok(Period::P7d),
            "1wk" => Ok(Period::P1wk),
            "1mo" => Ok(Period::P1mo),
            "3mo" => Ok(Period::P3mo),
            "6mo" => Ok(Period::P6mo),
            "1y" => Ok(Period::P1y),
            "2y" => Ok(Period::P2y),
            "5y" => Ok(Period::P5y),
            "max" => Ok(Period::Max),
            other => Err(EngineError::ParameterValidation(vec![format!("unknown period: {other}")])),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Asset class of a tradable instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Forex,
    Stocks,
    Crypto,
    Indices,
    Futures,
}

impl AssetClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Forex => "forex",
            AssetClass::Stocks => "stocks",
            AssetClass::Crypto => "crypto",
            AssetClass::Indices => "indices",
            AssetClass::Futures => "futures",
        }
    }
}

impl FromStr for AssetClass {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "forex" => Ok(AssetClass::Forex),
            "stocks" => Ok(AssetClass::Stocks),
            "crypto" => Ok(AssetClass::Crypto),
            "indices" => Ok(AssetClass::Indices),
            "futures" => Ok(AssetClass::Futures),
            other => Err(EngineError::ParameterValidation(vec![format!("unknown asset class: {other}")])),
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
