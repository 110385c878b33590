use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::data_source::{
    CandleProvider, CandlesRequest, QuoteProvider, SourceError, SourceFuture,
};
use crate::http_client::{HttpClient, HttpRequest, HttpResponse, NoopHttpClient};
use crate::normalize::{RawCandle, RawQuote};
use crate::{Symbol, UtcDateTime};

const PROVIDER: &str = "yahoo";
const REFERER: &str = "https://finance.yahoo.com/";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URLS: [&str; 2] = [
    "https://query1.finance.yahoo.com/v1/test/getcrumb",
    "https://query2.finance.yahoo.com/v1/test/getcrumb",
];
const CRUMB_TTL: Duration = Duration::from_secs(60 * 60);

// ============================================================================
// Yahoo Auth Manager - Handles cookie/crumb authentication
// ============================================================================

#[derive(Debug, Clone)]
struct CachedCrumb {
    value: String,
    fetched_at: Instant,
}

/// Cookie/crumb session for Yahoo's unofficial quote API.
///
/// The session cookie lives in the transport's cookie jar; only the crumb is
/// kept here. The lock is held across a refresh so concurrent callers share
/// one round-trip.
#[derive(Debug)]
pub struct YahooAuthManager {
    crumb: Mutex<Option<CachedCrumb>>,
    ttl: Duration,
}

impl Default for YahooAuthManager {
    fn default() -> Self {
        Self {
            crumb: Mutex::new(None),
            ttl: CRUMB_TTL,
        }
    }
}

impl YahooAuthManager {
    pub async fn crumb(
        &self,
        http_client: &dyn HttpClient,
        timeout: Duration,
    ) -> Result<String, SourceError> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached
            .as_ref()
            .filter(|crumb| crumb.fetched_at.elapsed() < self.ttl)
        {
            return Ok(crumb.value.clone());
        }

        let value = Self::fetch_crumb(http_client, timeout).await?;
        *cached = Some(CachedCrumb {
            value: value.clone(),
            fetched_at: Instant::now(),
        });
        Ok(value)
    }

    pub async fn invalidate(&self) {
        *self.crumb.lock().await = None;
    }

    async fn fetch_crumb(
        http_client: &dyn HttpClient,
        timeout: Duration,
    ) -> Result<String, SourceError> {
        // Any status is fine here; the point is the Set-Cookie header.
        let cookie_request = HttpRequest::get(COOKIE_URL)
            .with_header("referer", REFERER)
            .with_timeout(timeout);
        http_client
            .execute(cookie_request)
            .await
            .map_err(|error| error.into_source_error(PROVIDER))?;

        for endpoint in CRUMB_URLS {
            let request = HttpRequest::get(endpoint)
                .with_header("referer", REFERER)
                .with_timeout(timeout);

            let response = match http_client.execute(request).await {
                Ok(response) => response,
                Err(error) => {
                    debug!(endpoint, error = %error, "crumb endpoint failed");
                    continue;
                }
            };

            if response.status == 429 {
                return Err(SourceError::rate_limited(
                    "yahoo rate limited while fetching crumb",
                ));
            }

            let body = response.body.trim();
            if response.is_success() && is_plausible_crumb(body) {
                return Ok(body.to_owned());
            }
        }

        Err(SourceError::unknown(
            "failed to fetch yahoo crumb from all endpoints",
        ))
    }
}

fn is_plausible_crumb(body: &str) -> bool {
    !body.is_empty()
        && body.len() < 100
        && !body.contains(char::is_whitespace)
        && !body.contains('<')
}

// ============================================================================
// Yahoo Adapter
// ============================================================================

/// Quote and candle provider backed by Yahoo Finance, or by deterministic
/// offline data when the transport is a mock.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    auth_manager: Arc<YahooAuthManager>,
    use_real_api: bool,
    request_timeout: Duration,
}

impl Default for YahooAdapter {
    fn default() -> Self {
        Self::with_http_client(Arc::new(NoopHttpClient))
    }
}

impl YahooAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        let use_real_api = !http_client.is_mock();
        Self {
            http_client,
            auth_manager: Arc::new(YahooAuthManager::default()),
            use_real_api,
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn is_offline(&self) -> bool {
        !self.use_real_api
    }

    async fn send(&self, url: &str) -> Result<HttpResponse, SourceError> {
        let request = HttpRequest::get(url)
            .with_header("referer", REFERER)
            .with_timeout(self.request_timeout);
        self.http_client
            .execute(request)
            .await
            .map_err(|error| error.into_source_error(PROVIDER))
    }

    /// GET a crumb-authenticated endpoint, refreshing the crumb once on 401.
    async fn get_with_crumb<F>(&self, build_url: F) -> Result<String, SourceError>
    where
        F: Fn(&str) -> String + Send + Sync,
    {
        let client = self.http_client.as_ref();
        let crumb = self.auth_manager.crumb(client, self.request_timeout).await?;
        let mut response = self.send(&build_url(&crumb)).await?;

        if response.status == 401 {
            debug!("yahoo rejected crumb, refreshing session");
            self.auth_manager.invalidate().await;
            let crumb = self.auth_manager.crumb(client, self.request_timeout).await?;
            response = self.send(&build_url(&crumb)).await?;
        }

        if !response.is_success() {
            warn!(status = response.status, "yahoo returned non-success status");
            return Err(SourceError::from_status(PROVIDER, response.status));
        }

        Ok(response.body)
    }

    async fn fetch_real_quote(&self, symbol: &Symbol) -> Result<RawQuote, SourceError> {
        let encoded = urlencoding::encode(symbol.as_str()).into_owned();
        let body = self
            .get_with_crumb(|crumb| {
                format!(
                    "https://query1.finance.yahoo.com/v7/finance/quote?symbols={encoded}&crumb={}",
                    urlencoding::encode(crumb)
                )
            })
            .await?;
        parse_quote_response(symbol, &body)
    }

    async fn fetch_real_candles(&self, req: &CandlesRequest) -> Result<Vec<RawCandle>, SourceError> {
        let encoded = urlencoding::encode(req.symbol.as_str()).into_owned();
        let period1 = req.start.unix_timestamp();
        let period2 = UtcDateTime::now().unix_timestamp();
        let interval = req.interval.as_str();
        let body = self
            .get_with_crumb(|crumb| {
                format!(
                    "https://query1.finance.yahoo.com/v8/finance/chart/{encoded}?period1={period1}&period2={period2}&interval={interval}&crumb={}",
                    urlencoding::encode(crumb)
                )
            })
            .await?;
        parse_chart_response(&body)
    }
}

impl QuoteProvider for YahooAdapter {
    fn get_quote<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, RawQuote> {
        Box::pin(async move {
            if self.use_real_api {
                self.fetch_real_quote(symbol).await
            } else {
                Ok(fake_quote(symbol))
            }
        })
    }
}

impl CandleProvider for YahooAdapter {
    fn get_candles<'a>(&'a self, req: &'a CandlesRequest) -> SourceFuture<'a, Vec<RawCandle>> {
        Box::pin(async move {
            if self.use_real_api {
                self.fetch_real_candles(req).await
            } else {
                Ok(fake_candles(req, UtcDateTime::now()))
            }
        })
    }
}

// ============================================================================
// Response parsing
// ============================================================================

#[derive(Debug, Deserialize)]
struct YahooQuoteResponse {
    #[serde(rename = "quoteResponse")]
    quote_response: YahooQuoteResponseData,
}

#[derive(Debug, Deserialize)]
struct YahooQuoteResponseData {
    #[serde(default)]
    result: Vec<RawQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooApiError>,
}

#[derive(Debug, Deserialize)]
struct YahooApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

fn parse_quote_response(symbol: &Symbol, body: &str) -> Result<RawQuote, SourceError> {
    let response: YahooQuoteResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(format!("failed to parse yahoo quote: {e}")))?;

    let mut results = response.quote_response.result;
    let matching = results.iter().position(|quote| {
        quote
            .symbol
            .as_deref()
            .is_some_and(|echoed| echoed.eq_ignore_ascii_case(symbol.as_str()))
    });

    match matching {
        Some(index) => Ok(results.swap_remove(index)),
        None if results.is_empty() => Err(SourceError::not_found(format!(
            "yahoo has no quote for '{symbol}'"
        ))),
        None => Ok(results.swap_remove(0)),
    }
}

fn parse_chart_response(body: &str) -> Result<Vec<RawCandle>, SourceError> {
    let response: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = response.chart.error {
        let message = format!("yahoo chart error: {} {}", error.code, error.description);
        return Err(if error.code.eq_ignore_ascii_case("Not Found") {
            SourceError::not_found(message)
        } else {
            SourceError::unknown(message)
        });
    }

    let result = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| SourceError::not_found("yahoo chart returned no result"))?;

    if result.timestamp.is_empty() {
        return Ok(Vec::new());
    }

    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| SourceError::malformed("yahoo chart has timestamps but no prices"))?;

    let column = |values: &[Option<f64>], index: usize| values.get(index).copied().flatten();

    Ok(result
        .timestamp
        .iter()
        .enumerate()
        .map(|(index, &time)| RawCandle {
            time: Some(time.into()),
            open: column(&quote.open, index),
            high: column(&quote.high, index),
            low: column(&quote.low, index),
            close: column(&quote.close, index),
            volume: column(&quote.volume, index),
        })
        .collect())
}

// ============================================================================
// Offline data
// ============================================================================

fn symbol_seed(symbol: &Symbol) -> u64 {
    symbol
        .as_str()
        .bytes()
        .fold(0_u64, |acc, byte| acc.wrapping_mul(33).wrapping_add(byte as u64))
}

fn fake_quote(symbol: &Symbol) -> RawQuote {
    let seed = symbol_seed(symbol);
    RawQuote {
        symbol: Some(symbol.to_string()),
        regular_market_price: Some(fake_base_price(seed)),
        currency: Some(String::from("USD")),
        short_name: Some(format!("{symbol} Corp")),
        long_name: Some(format!("{symbol} Corporation")),
    }
}

fn fake_base_price(seed: u64) -> f64 {
    40.0 + (seed % 4_000) as f64 / 10.0
}

/// Deterministic random walk from `req.start` up to `now`, one candle per step.
fn fake_candles(req: &CandlesRequest, now: UtcDateTime) -> Vec<RawCandle> {
    let seed = symbol_seed(&req.symbol);
    let step = req.interval.step().whole_seconds().max(60);
    let start = req.start.unix_timestamp();
    let end = now.unix_timestamp();
    let first = start - start.rem_euclid(step);

    let mut close = fake_base_price(seed);
    let mut candles = Vec::new();
    let mut time = first;
    let mut index = 0_u64;

    while time <= end {
        let mix = seed.wrapping_add(index.wrapping_mul(7_919)) % 1_000;
        let change = (mix as f64 - 500.0) / 25_000.0;
        let open = close;
        close = (open * (1.0 + change)).max(1.0);
        let wick = open.max(close) * 0.004 * ((mix % 5) as f64 + 1.0) / 5.0;

        candles.push(
            RawCandle::new(time)
                .with_ohlc(open, open.max(close) + wick, (open.min(close) - wick).max(0.5), close)
                .with_volume((100_000 + (mix * 1_337) % 900_000) as f64),
        );

        time += step;
        index += 1;
    }

    candles
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex as StdMutex;

    use super::*;
    use crate::data_source::SourceErrorKind;
    use crate::http_client::{HttpError, HttpErrorKind};
    use crate::normalize::normalize_candles;
    use crate::{RangeSelection, SamplingInterval};

    /// Replays canned responses in order and records requested URLs.
    struct ScriptedHttpClient {
        responses: StdMutex<VecDeque<Result<HttpResponse, HttpError>>>,
        urls: StdMutex<Vec<String>>,
    }

    impl ScriptedHttpClient {
        fn new(responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
            Self {
                responses: StdMutex::new(responses.into()),
                urls: StdMutex::new(Vec::new()),
            }
        }

        fn urls(&self) -> Vec<String> {
            self.urls.lock().expect("url log not poisoned").clone()
        }
    }

    impl HttpClient for ScriptedHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.urls
                .lock()
                .expect("url log not poisoned")
                .push(request.url);
            let next = self
                .responses
                .lock()
                .expect("script not poisoned")
                .pop_front()
                .unwrap_or_else(|| Ok(HttpResponse::with_status(500, "script exhausted")));
            Box::pin(async move { next })
        }
    }

    fn ok(body: &str) -> Result<HttpResponse, HttpError> {
        Ok(HttpResponse::ok_json(body))
    }

    fn status(code: u16) -> Result<HttpResponse, HttpError> {
        Ok(HttpResponse::with_status(code, ""))
    }

    fn aapl() -> Symbol {
        Symbol::parse("AAPL").expect("valid symbol")
    }

    const QUOTE_BODY: &str = r#"{"quoteResponse":{"result":[{"symbol":"AAPL","regularMarketPrice":189.5,"currency":"USD","shortName":"Apple","longName":"Apple Inc."}],"error":null}}"#;

    #[tokio::test]
    async fn refreshes_crumb_once_after_unauthorized() {
        let client = Arc::new(ScriptedHttpClient::new(vec![
            ok(""),
            ok("first-crumb"),
            status(401),
            ok(""),
            ok("second-crumb"),
            ok(QUOTE_BODY),
        ]));
        let adapter = YahooAdapter::with_http_client(client.clone());

        let quote = adapter.get_quote(&aapl()).await.expect("quote after refresh");

        assert_eq!(quote.regular_market_price, Some(189.5));
        assert_eq!(quote.long_name.as_deref(), Some("Apple Inc."));
        let urls = client.urls();
        assert_eq!(urls.len(), 6);
        assert!(urls[2].contains("crumb=first-crumb"));
        assert!(urls[5].contains("/v7/finance/quote?symbols=AAPL"));
        assert!(urls[5].contains("crumb=second-crumb"));
    }

    #[tokio::test]
    async fn maps_statuses_onto_source_errors() {
        let client = Arc::new(ScriptedHttpClient::new(vec![ok(""), ok("crumb"), status(429)]));
        let adapter = YahooAdapter::with_http_client(client);

        let error = adapter.get_quote(&aapl()).await.expect_err("rate limited");
        assert_eq!(error.kind(), SourceErrorKind::RateLimited);
    }

    #[tokio::test]
    async fn transport_timeout_is_a_timeout() {
        let client = Arc::new(ScriptedHttpClient::new(vec![Err(HttpError::new(
            HttpErrorKind::Timeout,
            "request timeout",
        ))]));
        let adapter = YahooAdapter::with_http_client(client);

        let error = adapter.get_quote(&aapl()).await.expect_err("timed out");
        assert_eq!(error.kind(), SourceErrorKind::Timeout);
    }

    #[test]
    fn empty_quote_result_is_not_found() {
        let error = parse_quote_response(&aapl(), r#"{"quoteResponse":{"result":[]}}"#)
            .expect_err("no result");
        assert_eq!(error.kind(), SourceErrorKind::NotFound);

        let error = parse_quote_response(&aapl(), "<html>").expect_err("not json");
        assert_eq!(error.kind(), SourceErrorKind::MalformedData);
    }

    #[test]
    fn chart_columns_become_raw_candles() {
        let body = r#"{"chart":{"result":[{"timestamp":[1704153600,1704067200],
            "indicators":{"quote":[{"open":[10.0,8.0],"high":[12.0,9.0],"low":[9.0,7.0],
            "close":[11.0,null],"volume":[100,50]}]}}],"error":null}}"#;

        let raw = parse_chart_response(body).expect("valid chart");
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[1].close, None);

        let series = normalize_candles(raw);
        assert_eq!(series.len(), 1);
        assert_eq!(series.candles()[0].volume, Some(100.0));
    }

    #[test]
    fn chart_error_not_found_is_classified() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let error = parse_chart_response(body).expect_err("chart error");
        assert_eq!(error.kind(), SourceErrorKind::NotFound);
    }

    #[tokio::test]
    async fn offline_mode_is_deterministic_and_valid() {
        let adapter = YahooAdapter::default();
        assert!(adapter.is_offline());

        let first = adapter.get_quote(&aapl()).await.expect("offline quote");
        let second = adapter.get_quote(&aapl()).await.expect("offline quote");
        assert_eq!(first, second);

        let now = UtcDateTime::parse("2024-06-01T00:00:00Z").expect("valid");
        let req = CandlesRequest::for_window(aapl(), RangeSelection::OneMonth.resolve(), now);
        assert_eq!(req.interval, SamplingInterval::FiveMinutes);

        let raw = fake_candles(&req, now);
        let count = raw.len();
        let series = normalize_candles(raw);
        assert_eq!(series.len(), count);
        assert_eq!(count, 30 * 24 * 12 + 1);
    }
}
