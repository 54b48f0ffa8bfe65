//! Predefined group templates: ready-made portfolios for first-run setups.

use crate::data::{AssetClass, Interval, Period};
use crate::error::Result;
use crate::model::group::SymbolConfig;
use crate::model::store::GroupStore;

fn forex(symbol: &str) -> SymbolConfig {
    SymbolConfig::new(symbol, AssetClass::Forex, Interval::H1, Period::P7d)
}

fn stock(symbol: &str) -> SymbolConfig {
    SymbolConfig::new(symbol, AssetClass::Stocks, Interval::M30, Period::P5d)
}

fn crypto(symbol: &str) -> SymbolConfig {
    SymbolConfig::new(symbol, AssetClass::Crypto, Interval::M15, Period::P7d)
}

fn index(symbol: &str) -> SymbolConfig {
    SymbolConfig::new(symbol, AssetClass::Indices, Interval::M30, Period::P7d)
}

pub fn forex_major_pairs() -> Vec<(&'static str, SymbolConfig)> {
    ["eurusd", "gbpusd", "usdjpy", "usdchf", "audusd", "usdcad", "nzdusd"]
        .into_iter()
        .map(|s| (s, forex(s)))
        .collect()
}

pub fn tech_stocks() -> Vec<(&'static str, SymbolConfig)> {
    [
        ("aapl", "AAPL"),
        ("msft", "MSFT"),
        ("googl", "GOOGL"),
        ("amzn", "AMZN"),
        ("tsla", "TSLA"),
        ("meta", "META"),
        ("nvda", "NVDA"),
    ]
    .into_iter()
    .map(|(key, s)| (key, stock(s)))
    .collect()
}

pub fn crypto_portfolio() -> Vec<(&'static str, SymbolConfig)> {
    ["btc", "eth", "bnb", "sol", "ada", "doge"]
        .into_iter()
        .map(|s| (s, crypto(s)))
        .collect()
}

pub fn global_indices() -> Vec<(&'static str, SymbolConfig)> {
    ["us30", "sp500", "nas100", "dax", "ftse100", "nikkei"]
        .into_iter()
        .map(|s| (s, index(s)))
        .collect()
}

pub fn mixed_portfolio() -> Vec<(&'static str, SymbolConfig)> {
    vec![
        ("eurusd", forex("eurusd")),
        ("aapl", stock("AAPL")),
        ("btc", crypto("btc")),
        ("us30", index("us30")),
    ]
}

/// Create every predefined group that does not already exist.
/// Returns the ids of the groups created.
pub fn create_predefined_groups(store: &mut GroupStore) -> Result<Vec<String>> {
    let templates: [(&str, &str, &str, Vec<(&str, SymbolConfig)>); 5] = [
        ("forex_majors", "Major Forex Pairs", "Major currency pairs on the 1h timeframe", forex_major_pairs()),
        ("tech_stocks", "Technology Stocks", "Large-cap tech on the 30m timeframe", tech_stocks()),
        ("crypto_top", "Top Cryptocurrencies", "Top crypto assets on the 15m timeframe", crypto_portfolio()),
        ("global_indices", "Global Market Indices", "Major indices on the 30m timeframe", global_indices()),
        ("mixed_portfolio", "Mixed Asset Portfolio", "Diversified portfolio across asset classes", mixed_portfolio()),
    ];

    let mut created = Vec::new();
    for (id, name, description, members) in templates {
        if store.get(id).is_ok() {
            continue;
        }
        store.create_group_with_id(id, name, description)?;
        for (key, config) in members {
            store.add_symbol(id, key, config)?;
        }
        created.push(id.to_string());
    }
    Ok(created)
}
