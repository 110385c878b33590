//! # Domain Models
//!
//! Canonical types shared by the normalizers, the projector and the
//! orchestrator.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated ticker, 1–10 chars of `[A-Z0-9.-]` |
//! | [`SamplingInterval`] | Candle granularity (1m … 1mo) |
//! | [`RangeSelection`] | Range buttons (1D … Max) and their fixed windows |
//! | [`Candle`] / [`CandleSeries`] | OHLCV records, strictly time-ascending |
//! | [`Quote`] | Price, currency and display name |
//! | [`SearchResult`] | Symbol-search suggestion |
//! | [`UtcDateTime`] | UTC timestamp |

mod interval;
mod models;
mod range;
mod symbol;
mod timestamp;

pub use interval::SamplingInterval;
pub use models::{Candle, CandleSeries, Quote, SearchResult, VolumePoint};
pub use range::{RangeSelection, RangeWindow};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
