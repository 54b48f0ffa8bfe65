//! Market-data provider seam.
//!
//! The engine treats the provider as a black box returning OHLCV frames.
//! Implementations are injected; a deterministic [`SyntheticProvider`] ships
//! for demos and tests so nothing in the engine depends on a network.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::data::{AssetClass, Bar, Frame, Interval, Period};
use crate::error::Result;

#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Fetch a window of bars for `symbol`. Errors surface as
    /// [`crate::EngineError::DataUnavailable`] (retriable) or
    /// [`crate::EngineError::InvalidFrame`].
    async fn fetch(
        &self,
        symbol: &str,
        asset_class: AssetClass,
        interval: Interval,
        period: Period,
    ) -> Result<Frame>;
}

/// Translate an engine symbol key into the upstream feed's ticker notation.
///
/// Forex pairs get the `=X` suffix, crypto quotes against USD, and common
/// index names map to their caret tickers.
pub fn provider_symbol(symbol: &str, asset_class: AssetClass) -> String {
    match asset_class {
        AssetClass::Forex => format!("{}=X", symbol.to_ascii_uppercase()),
        AssetClass::Crypto => format!("{}-USD", symbol.to_ascii_uppercase()),
        AssetClass::Indices => {
            let upper = symbol.to_ascii_uppercase();
            match upper.as_str() {
                "US30" | "DOW30" => "^DJI".to_string(),
                "SP500" | "US500" => "^GSPC".to_string(),
                "NAS100" | "NASDAQ" => "^IXIC".to_string(),
                "DAX" => "^GDAXI".to_string(),
                "FTSE100" => "^FTSE".to_string(),
                "NIKKEI" => "^N225".to_string(),
                _ => format!("^{upper}"),
            }
        }
        AssetClass::Stocks | AssetClass::Futures => symbol.to_ascii_uppercase(),
    }
}

/// Deterministic offline provider generating layered sine-wave series.
///
/// The same (symbol, interval, period) request always yields the same frame:
/// the phase is seeded from the symbol name and the timestamps are anchored
/// at a fixed epoch, never at the wall clock.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    bars: usize,
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self { bars: 240 }
    }
}

impl SyntheticProvider {
    pub fn new(bars: usize) -> Self {
        Self { bars }
    }
}

#[async_trait]
impl DataProvider for SyntheticProvider {
    async fn fetch(
        &self,
        symbol: &str,
        _asset_class: AssetClass,
        interval: Interval,
        _period: Period,
    ) -> Result<Frame> {
        let seed = symbol.bytes().map(|b| b as u64).sum::<u64>();
        let phase = (seed % 628) as f64 / 100.0;
        let base = 100.0 + (seed % 400) as f64;

        let epoch = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let step = interval.duration();

        let bars: Vec<Bar> = (0..self.bars)
            .map(|i| {
                let t = i as f64;
                let trend = t * 0.05;
                let swing = (t * 0.13 + phase).sin() * 4.0 + (t * 0.031 + phase).cos() * 9.0;
                let close = base + trend + swing;
                let open = base + (t - 1.0).max(0.0) * 0.05 + ((t - 1.0) * 0.13 + phase).sin() * 4.0
                    + ((t - 1.0) * 0.031 + phase).cos() * 9.0;
                let high = close.max(open) + 0.8;
                let low = close.min(open) - 0.8;
                let volume = 1000.0 + ((t * 0.4 + phase).sin() * 300.0).abs();
                Bar::new(epoch + step * i as i32, open, high, low, close, volume)
            })
            .collect();

        Frame::from_bars(symbol, interval, &bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_mapping_per_asset_class() {
        assert_eq!(provider_symbol("eurusd", AssetClass::Forex), "EURUSD=X");
        assert_eq!(provider_symbol("btc", AssetClass::Crypto), "BTC-USD");
        assert_eq!(provider_symbol("us30", AssetClass::Indices), "^DJI");
        assert_eq!(provider_symbol("sp500", AssetClass::Indices), "^GSPC");
        assert_eq!(provider_symbol("aapl", AssetClass::Stocks), "AAPL");
        assert_eq!(provider_symbol("vix", AssetClass::Indices), "^VIX");
    }

    #[tokio::test]
    async fn synthetic_frames_are_deterministic() {
        let provider = SyntheticProvider::default();
        let a = provider.fetch("eurusd", AssetClass::Forex, Interval::H1, Period::P7d).await.unwrap();
        let b = provider.fetch("eurusd", AssetClass::Forex, Interval::H1, Period::P7d).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 240);
    }

    #[tokio::test]
    async fn different_symbols_differ() {
        let provider = SyntheticProvider::default();
        let a = provider.fetch("eurusd", AssetClass::Forex, Interval::H1, Period::P7d).await.unwrap();
        let b = provider.fetch("gbpusd", AssetClass::Forex, Interval::H1, Period::P7d).await.unwrap();
        assert_ne!(a.close()[10], b.close()[10]);
    }
}
