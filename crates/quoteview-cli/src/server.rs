//! HTTP surface: `/quote`, `/candles` and `/search`.
//!
//! Validation failures answer 4xx, upstream failures 5xx, both with a JSON
//! body `{ "error", "code", "status" }`.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use quoteview_core::data_source::with_timeout;
use quoteview_core::{
    normalize_candles, normalize_quote, CandleProvider, CandlesRequest, CoreError, QuoteError,
    QuoteProvider, SamplingInterval, SearchProvider, SourceError, Symbol, UtcDateTime,
    ValidationError,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

const DEFAULT_SYMBOL: &str = "AAPL";
const DEFAULT_DAYS: u32 = 365;
const MAX_DAYS: u32 = 36_500;
const QUOTE_CACHE_CONTROL: &str = "public, max-age=60, stale-while-revalidate=300";

/// Providers shared by every request.
pub struct AppState {
    pub quotes: Arc<dyn QuoteProvider>,
    pub candles: Arc<dyn CandleProvider>,
    pub search: Arc<dyn SearchProvider>,
    pub fetch_timeout: Duration,
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/quote", get(quote))
        .route("/candles", get(candles))
        .route("/search", get(search))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug)]
pub struct ApiError(CoreError);

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        Self(error.into())
    }
}

impl From<SourceError> for ApiError {
    fn from(error: SourceError) -> Self {
        Self(error.into())
    }
}

impl From<QuoteError> for ApiError {
    fn from(error: QuoteError) -> Self {
        Self(error.into())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
    status: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let class = self.0.class();
        let status = class.http_status();
        let error = match &self.0 {
            CoreError::Validation(error) => error.to_string(),
            other => {
                warn!(class = %class, error = %other, "upstream request failed");
                class.user_message().to_owned()
            }
        };

        let body = ErrorBody {
            error,
            code: class.as_str(),
            status,
        };
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
        (status, Json(body)).into_response()
    }
}

fn symbol_or_default(raw: Option<&str>) -> Result<Symbol, ValidationError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => Symbol::parse(value),
        None => Symbol::parse(DEFAULT_SYMBOL),
    }
}

// =============================================================================
// Quote
// =============================================================================

#[derive(Debug, Deserialize)]
struct QuoteParams {
    symbol: Option<String>,
}

async fn quote(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QuoteParams>,
) -> Result<Response, ApiError> {
    let symbol = symbol_or_default(params.symbol.as_deref())?;
    let raw = with_timeout(
        "quote fetch",
        state.fetch_timeout,
        state.quotes.get_quote(&symbol),
    )
    .await?;
    let quote = normalize_quote(&symbol, raw)?;

    Ok(([(header::CACHE_CONTROL, QUOTE_CACHE_CONTROL)], Json(quote)).into_response())
}

// =============================================================================
// Candles
// =============================================================================

#[derive(Debug, Deserialize)]
struct CandleParams {
    symbol: Option<String>,
    days: Option<String>,
    interval: Option<String>,
}

fn parse_days(raw: Option<&str>) -> Result<u32, ValidationError> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(DEFAULT_DAYS);
    };

    raw.parse::<u32>()
        .ok()
        .filter(|days| (1..=MAX_DAYS).contains(days))
        .ok_or_else(|| ValidationError::InvalidDays {
            value: raw.to_owned(),
            max: MAX_DAYS,
        })
}

fn parse_interval(raw: Option<&str>) -> Result<SamplingInterval, ValidationError> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map_or(Ok(SamplingInterval::OneDay), str::parse)
}

async fn candles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CandleParams>,
) -> Result<Response, ApiError> {
    let symbol = symbol_or_default(params.symbol.as_deref())?;
    let days = parse_days(params.days.as_deref())?;
    let interval = parse_interval(params.interval.as_deref())?;

    if let Some(max) = interval.max_lookback_days().filter(|max| days > *max) {
        warn!(
            symbol = %symbol,
            days,
            interval = %interval,
            max_lookback_days = max,
            "requested range exceeds provider lookback for interval"
        );
    }

    let request = CandlesRequest::new(symbol, UtcDateTime::now().days_before(days), interval);
    let raw = with_timeout(
        "candle fetch",
        state.fetch_timeout,
        state.candles.get_candles(&request),
    )
    .await?;

    Ok(Json(normalize_candles(raw)).into_response())
}

// =============================================================================
// Search
// =============================================================================

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
}

async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Response, ApiError> {
    let query = params.q.unwrap_or_default();
    let results = with_timeout(
        "symbol search",
        state.fetch_timeout,
        state.search.search(query.trim()),
    )
    .await?;

    Ok(Json(results).into_response())
}
