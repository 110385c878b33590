//! Validating boundary between untrusted provider payloads and the canonical
//! domain types.
//!
//! Candle records that fail validation are dropped one by one; a quote without
//! a price fails as a whole.

mod candles;
mod quote;

pub use candles::{normalize_candles, RawCandle, RawTime};
pub use quote::{normalize_quote, RawQuote, DEFAULT_CURRENCY};
