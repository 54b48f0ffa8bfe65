//! OHLCV data structures.
//!
//! A [`Frame`] is an immutable, column-oriented window of bars for a single
//! (symbol, interval). Providers hand back plain [`Bar`] rows; the frame
//! constructor validates the OHLC invariants once so every downstream
//! component can rely on them.

pub mod frame;
pub mod interval;

pub use frame::{Bar, Frame};
pub use interval::{AssetClass, Interval, Period};
