use std::fmt::{Display, Formatter};

use serde::Serialize;
use thiserror::Error;

use crate::data_source::{SourceError, SourceErrorKind};

/// Local validation errors, raised before any upstream call is made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid interval '{value}', expected one of 1m, 5m, 15m, 30m, 60m, 1d, 1wk, 1mo")]
    InvalidInterval { value: String },
    #[error("invalid range '{value}', expected one of 1D, 1M, 6M, 1Y, 5Y, Max")]
    InvalidRange { value: String },
    #[error("days must be an integer between 1 and {max}, got '{value}'")]
    InvalidDays { value: String, max: u32 },

    #[error("timestamp cannot be parsed: '{value}'")]
    InvalidTimestamp { value: String },

    #[error("field '{field}' is missing")]
    MissingField { field: &'static str },
    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("candle high must be >= low")]
    InvalidCandleRange,
    #[error("candle open/close must be within high/low range")]
    InvalidCandleBounds,
}

/// The quote provider answered without a usable price.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuoteError {
    #[error("quote for '{symbol}' has no finite price")]
    InvalidQuote { symbol: String },
}

/// Top-level error type for core operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Quote(#[from] QuoteError),
}

impl CoreError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Validation(_) => ErrorClass::Validation,
            Self::Source(error) => ErrorClass::from(error.kind()),
            Self::Quote(_) => ErrorClass::MalformedUpstreamData,
        }
    }

    /// Whether re-issuing the same request may succeed.
    pub fn retryable(&self) -> bool {
        match self {
            Self::Source(error) => error.retryable(),
            Self::Validation(_) | Self::Quote(_) => false,
        }
    }
}

/// User-visible error classes surfaced by the view and the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Validation,
    NotFound,
    Timeout,
    RateLimited,
    MalformedUpstreamData,
    UnknownUpstream,
}

impl ErrorClass {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Timeout => "timeout",
            Self::RateLimited => "rate_limited",
            Self::MalformedUpstreamData => "malformed_upstream_data",
            Self::UnknownUpstream => "unknown_upstream",
        }
    }

    pub const fn user_message(self) -> &'static str {
        match self {
            Self::Validation => "The symbol or parameters are invalid.",
            Self::NotFound => "No instrument was found for this symbol.",
            Self::Timeout => "The data provider took too long to respond.",
            Self::RateLimited => "Too many requests, please try again later.",
            Self::MalformedUpstreamData => "The data provider returned invalid data.",
            Self::UnknownUpstream => "The data could not be loaded.",
        }
    }

    pub const fn http_status(self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::NotFound => 404,
            Self::RateLimited => 503,
            Self::Timeout => 504,
            Self::MalformedUpstreamData | Self::UnknownUpstream => 502,
        }
    }
}

impl From<SourceErrorKind> for ErrorClass {
    fn from(kind: SourceErrorKind) -> Self {
        match kind {
            SourceErrorKind::NotFound => Self::NotFound,
            SourceErrorKind::RateLimited => Self::RateLimited,
            SourceErrorKind::Timeout => Self::Timeout,
            SourceErrorKind::MalformedData => Self::MalformedUpstreamData,
            SourceErrorKind::Unknown => Self::UnknownUpstream,
        }
    }
}

impl Display for ErrorClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
