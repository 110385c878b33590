//! Provider adapters.
//!
//! | Adapter | Implements |
//! |---------|------------|
//! | [`YahooAdapter`] | [`QuoteProvider`](crate::data_source::QuoteProvider), [`CandleProvider`](crate::data_source::CandleProvider) |
//! | [`FinnhubAdapter`] | [`SearchProvider`](crate::data_source::SearchProvider) |
//!
//! Both serve deterministic offline data when built over a mock transport
//! such as [`NoopHttpClient`](crate::http_client::NoopHttpClient).

mod finnhub;
mod yahoo;

pub use finnhub::FinnhubAdapter;
pub use yahoo::{YahooAdapter, YahooAuthManager};
