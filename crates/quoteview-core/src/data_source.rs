//! Provider contracts and the structured upstream error.
//!
//! The view talks to three collaborators, each behind its own trait so that a
//! deployment can mix vendors (quotes and candles from Yahoo, search from
//! Finnhub) and tests can substitute gated fakes.
//!
//! | Trait | Request | Response |
//! |-------|---------|----------|
//! | [`QuoteProvider`] | [`Symbol`] | [`RawQuote`] |
//! | [`CandleProvider`] | [`CandlesRequest`] | `Vec<`[`RawCandle`]`>` |
//! | [`SearchProvider`] | query text | `Vec<`[`SearchResult`]`>` |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::normalize::{RawCandle, RawQuote};
use crate::{RangeWindow, SamplingInterval, SearchResult, Symbol, UtcDateTime};

/// Boxed future returned by every provider call.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Upstream failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceErrorKind {
    NotFound,
    RateLimited,
    Timeout,
    MalformedData,
    Unknown,
}

/// Structured provider error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::NotFound,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Timeout,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::MalformedData,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unknown,
            message: message.into(),
            retryable: true,
        }
    }

    /// Classify a non-success HTTP status returned by a provider.
    pub fn from_status(provider: &str, status: u16) -> Self {
        match status {
            404 => Self::not_found(format!("{provider} returned status 404")),
            429 => Self::rate_limited(format!("{provider} returned status 429")),
            408 | 504 => Self::timeout(format!("{provider} returned status {status}")),
            _ => Self::unknown(format!("{provider} returned status {status}")),
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::NotFound => "source.not_found",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::Timeout => "source.timeout",
            SourceErrorKind::MalformedData => "source.malformed_data",
            SourceErrorKind::Unknown => "source.unknown",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Candle fetch parameters: everything from `start` up to now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandlesRequest {
    pub symbol: Symbol,
    pub start: UtcDateTime,
    pub interval: SamplingInterval,
}

impl CandlesRequest {
    pub fn new(symbol: Symbol, start: UtcDateTime, interval: SamplingInterval) -> Self {
        Self {
            symbol,
            start,
            interval,
        }
    }

    /// Request covering the `days` days before `now`.
    pub fn for_window(symbol: Symbol, window: RangeWindow, now: UtcDateTime) -> Self {
        Self::new(symbol, now.days_before(window.days), window.interval)
    }
}

/// Quote collaborator.
pub trait QuoteProvider: Send + Sync {
    fn get_quote<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, RawQuote>;
}

/// Candle collaborator. Records come back in provider order, untrusted.
pub trait CandleProvider: Send + Sync {
    fn get_candles<'a>(&'a self, req: &'a CandlesRequest) -> SourceFuture<'a, Vec<RawCandle>>;
}

/// Symbol-search collaborator.
///
/// Implementations return an empty list for a blank query without calling
/// upstream.
pub trait SearchProvider: Send + Sync {
    fn search<'a>(&'a self, query: &'a str) -> SourceFuture<'a, Vec<SearchResult>>;
}

/// Bound a provider call; an elapsed deadline becomes a `Timeout` error.
pub async fn with_timeout<T, F>(what: &str, limit: Duration, future: F) -> Result<T, SourceError>
where
    F: Future<Output = Result<T, SourceError>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::timeout(format!(
            "{what} did not complete within {}ms",
            limit.as_millis()
        ))),
    }
}
