use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::data_source::{SearchProvider, SourceError, SourceFuture};
use crate::http_client::{HttpClient, HttpRequest, NoopHttpClient};
use crate::SearchResult;

const PROVIDER: &str = "finnhub";
const SEARCH_URL: &str = "https://finnhub.io/api/v1/search";
const TOKEN_HEADER: &str = "X-Finnhub-Token";

/// Offline catalog served when the transport is a mock.
const OFFLINE_CATALOG: [(&str, &str); 12] = [
    ("AAPL", "APPLE INC"),
    ("AMD", "ADVANCED MICRO DEVICES"),
    ("AMZN", "AMAZON.COM INC"),
    ("BRK.B", "BERKSHIRE HATHAWAY INC-CL B"),
    ("GOOGL", "ALPHABET INC-CL A"),
    ("META", "META PLATFORMS INC-CLASS A"),
    ("MSFT", "MICROSOFT CORP"),
    ("NFLX", "NETFLIX INC"),
    ("NVDA", "NVIDIA CORP"),
    ("SPY", "SPDR S&P 500 ETF TRUST"),
    ("TSLA", "TESLA INC"),
    ("TSM", "TAIWAN SEMICONDUCTOR-SP ADR"),
];

/// Symbol search backed by Finnhub's `/search` endpoint.
#[derive(Clone)]
pub struct FinnhubAdapter {
    http_client: Arc<dyn HttpClient>,
    api_key: Option<String>,
    use_real_api: bool,
    request_timeout: Duration,
}

impl Default for FinnhubAdapter {
    fn default() -> Self {
        Self::with_http_client(Arc::new(NoopHttpClient), None)
    }
}

impl FinnhubAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>, api_key: Option<String>) -> Self {
        let use_real_api = !http_client.is_mock();
        Self {
            http_client,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            use_real_api,
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    async fn search_real(&self, query: &str) -> Result<Vec<SearchResult>, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SourceError::unknown("finnhub api key is not configured"))?;

        let url = format!("{SEARCH_URL}?q={}", urlencoding::encode(query));
        let request = HttpRequest::get(url)
            .with_header(TOKEN_HEADER, api_key)
            .with_timeout(self.request_timeout);
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| error.into_source_error(PROVIDER))?;

        if !response.is_success() {
            warn!(status = response.status, "finnhub returned non-success status");
            return Err(SourceError::from_status(PROVIDER, response.status));
        }

        parse_search_response(&response.body)
    }
}

impl SearchProvider for FinnhubAdapter {
    fn search<'a>(&'a self, query: &'a str) -> SourceFuture<'a, Vec<SearchResult>> {
        Box::pin(async move {
            let query = query.trim();
            if query.is_empty() {
                return Ok(Vec::new());
            }

            if self.use_real_api {
                self.search_real(query).await
            } else {
                Ok(search_offline(query))
            }
        })
    }
}

#[derive(Debug, Deserialize)]
struct FinnhubSearchResponse {
    #[serde(default)]
    result: Vec<FinnhubSearchHit>,
}

#[derive(Debug, Deserialize)]
struct FinnhubSearchHit {
    symbol: String,
    #[serde(default)]
    description: String,
}

fn parse_search_response(body: &str) -> Result<Vec<SearchResult>, SourceError> {
    let response: FinnhubSearchResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(format!("failed to parse finnhub search: {e}")))?;

    Ok(response
        .result
        .into_iter()
        .filter(|hit| !hit.symbol.trim().is_empty())
        .map(|hit| SearchResult {
            symbol: hit.symbol,
            description: hit.description,
        })
        .collect())
}

fn search_offline(query: &str) -> Vec<SearchResult> {
    let query = query.to_ascii_uppercase();
    OFFLINE_CATALOG
        .iter()
        .filter(|(symbol, description)| symbol.starts_with(&query) || description.contains(&query))
        .map(|(symbol, description)| SearchResult {
            symbol: (*symbol).to_owned(),
            description: (*description).to_owned(),
        })
        .collect()
}
