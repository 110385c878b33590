//! # Quoteview Core
//!
//! Time-series pipeline behind a single-instrument quote and chart view.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Yahoo quote/candle provider and Finnhub search provider |
//! | [`crosshair`] | Cursor readout (OHLCV + % delta) for the chart surface |
//! | [`data_source`] | Provider traits, fetch timeouts and [`SourceError`] |
//! | [`domain`] | Symbols, ranges, intervals, candles, quotes |
//! | [`error`] | Validation and top-level errors, user-facing error classes |
//! | [`http_client`] | HTTP transport abstraction (reqwest or no-op) |
//! | [`normalize`] | Validating boundary for raw provider payloads |
//! | [`orchestrator`] | Request-cycle state machine with stale-response suppression |
//! | [`search`] | Debounced symbol autocomplete |
//!
//! ## Data flow
//!
//! ```text
//! RangeSelection ──resolve──▶ (days, interval)
//!        │
//!        ▼
//! DataFetchOrchestrator ──join──▶ QuoteProvider + CandleProvider
//!        │                               │
//!        │◀──── normalize_quote / normalize_candles
//!        ▼
//! ViewState (watch) ──▶ chart surface ──CursorMoveEvent──▶ CrosshairProjector
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use quoteview_core::{
//!     DataFetchOrchestrator, OrchestratorConfig, RangeSelection, Symbol, YahooAdapter,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let yahoo = Arc::new(YahooAdapter::default());
//! let orchestrator =
//!     DataFetchOrchestrator::new(yahoo.clone(), yahoo, OrchestratorConfig::default());
//!
//! orchestrator
//!     .on_parameters_changed(Symbol::parse("AAPL")?, RangeSelection::OneYear)
//!     .await;
//! let state = orchestrator.snapshot();
//! println!("{} candles", state.series.len());
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod crosshair;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod normalize;
pub mod orchestrator;
pub mod search;

pub use adapters::{FinnhubAdapter, YahooAdapter};

pub use crosshair::{format_compact_volume, CrosshairProjector, CursorMoveEvent, CursorStat};

pub use data_source::{
    CandleProvider, CandlesRequest, QuoteProvider, SearchProvider, SourceError, SourceErrorKind,
};

pub use domain::{
    Candle, CandleSeries, Quote, RangeSelection, RangeWindow, SamplingInterval, SearchResult,
    Symbol, UtcDateTime, VolumePoint,
};

pub use error::{CoreError, ErrorClass, QuoteError, ValidationError};

pub use http_client::{HttpClient, NoopHttpClient, ReqwestHttpClient};

pub use normalize::{normalize_candles, normalize_quote, RawCandle, RawQuote};

pub use orchestrator::{
    CycleOutcome, CyclePhase, DataFetchOrchestrator, OrchestratorConfig, ViewError, ViewState,
};

pub use search::{SearchConfig, SearchOutcome, SymbolSearch};
