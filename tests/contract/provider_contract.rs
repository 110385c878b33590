use std::sync::Arc;

use quoteview_core::{
    normalize_candles, normalize_quote, CandleProvider, CandlesRequest, FinnhubAdapter,
    QuoteProvider, RangeSelection, SearchProvider, Symbol, UtcDateTime, YahooAdapter,
};

struct MarketCase {
    name: &'static str,
    quotes: Arc<dyn QuoteProvider>,
    candles: Arc<dyn CandleProvider>,
}

fn market_cases() -> Vec<MarketCase> {
    let yahoo = Arc::new(YahooAdapter::default());
    vec![MarketCase {
        name: "yahoo",
        quotes: yahoo.clone(),
        candles: yahoo,
    }]
}

fn search_cases() -> Vec<(&'static str, Arc<dyn SearchProvider>)> {
    vec![("finnhub", Arc::new(FinnhubAdapter::default()))]
}

#[tokio::test]
async fn quote_contract_yields_a_normalizable_quote() {
    for case in market_cases() {
        for ticker in ["AAPL", "TSLA", "BRK.B"] {
            let symbol = Symbol::parse(ticker).expect("valid symbol");
            let raw = case
                .quotes
                .get_quote(&symbol)
                .await
                .unwrap_or_else(|error| panic!("{} quote failed: {error}", case.name));

            let quote = normalize_quote(&symbol, raw)
                .unwrap_or_else(|error| panic!("{} quote invalid: {error}", case.name));
            assert_eq!(quote.symbol, symbol, "{}", case.name);
            assert!(quote.price.is_finite() && quote.price > 0.0, "{}", case.name);
            assert!(!quote.display_name.is_empty(), "{}", case.name);
        }
    }
}

#[tokio::test]
async fn candle_contract_covers_every_range_without_dropped_records() {
    let now = UtcDateTime::now();
    for case in market_cases() {
        for range in RangeSelection::ALL {
            let symbol = Symbol::parse("MSFT").expect("valid symbol");
            let request = CandlesRequest::for_window(symbol, range.resolve(), now);

            let raw = case
                .candles
                .get_candles(&request)
                .await
                .unwrap_or_else(|error| panic!("{} {range} candles failed: {error}", case.name));
            let count = raw.len();
            let series = normalize_candles(raw);

            assert!(count > 0, "{} {range} returned no candles", case.name);
            assert_eq!(series.len(), count, "{} {range} dropped records", case.name);
            let first = series.candles().first().map(|candle| candle.time);
            assert!(
                first.is_some_and(|time| time >= request.start.unix_timestamp() - request.interval.step().whole_seconds()),
                "{} {range} starts before the requested window",
                case.name
            );
        }
    }
}

#[tokio::test]
async fn search_contract_returns_nothing_for_blank_queries() {
    for (name, provider) in search_cases() {
        let results = provider.search("").await.expect("blank query never fails");
        assert!(results.is_empty(), "{name}");

        let results = provider.search("AAPL").await.expect("offline search");
        assert!(
            results.iter().any(|hit| hit.symbol == "AAPL"),
            "{name} should find AAPL"
        );
        assert!(results.iter().all(|hit| !hit.description.is_empty()), "{name}");
    }
}
