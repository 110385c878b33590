//! Behavior-driven tests for the time-series pipeline
//!
//! These tests verify HOW raw provider payloads become a chartable series:
//! range resolution, candle and quote normalization, and the crosshair
//! readout derived from cursor movement.

use quoteview_core::crosshair::project;
use quoteview_core::{
    normalize_candles, normalize_quote, CrosshairProjector, CursorMoveEvent, QuoteError,
    RangeSelection, RawCandle, RawQuote, SamplingInterval, Symbol, UtcDateTime,
};

fn epoch(date: &str) -> i64 {
    UtcDateTime::parse(date).expect("valid date").unix_timestamp()
}

// =============================================================================
// Range Resolution
// =============================================================================

#[test]
fn when_any_range_is_selected_system_resolves_a_positive_window() {
    // Given: Every range button
    for selection in RangeSelection::ALL {
        // When: The range is resolved
        let window = selection.resolve();

        // Then: The day count is positive and the interval is a known granularity
        assert!(window.days > 0, "{selection} resolved to zero days");
        assert!(SamplingInterval::ALL.contains(&window.interval));
    }
}

#[test]
fn when_ranges_are_resolved_system_uses_the_fixed_table() {
    // Given / When / Then: The table is stable
    let table: Vec<_> = RangeSelection::ALL
        .iter()
        .map(|selection| {
            let window = selection.resolve();
            (selection.label(), window.days, window.interval.as_str())
        })
        .collect();

    assert_eq!(
        table,
        vec![
            ("1D", 1, "1m"),
            ("1M", 30, "5m"),
            ("6M", 180, "30m"),
            ("1Y", 365, "1d"),
            ("5Y", 1825, "1wk"),
            ("Max", 3650, "1mo"),
        ]
    );
}

// =============================================================================
// Candle Normalization
// =============================================================================

#[test]
fn when_provider_returns_descending_candles_system_resorts_them() {
    // Given: Two daily candles in reverse order
    let raw = vec![
        RawCandle::new("2024-01-02")
            .with_ohlc(10.0, 12.0, 9.0, 11.0)
            .with_volume(100.0),
        RawCandle::new("2024-01-01")
            .with_ohlc(8.0, 9.0, 7.0, 8.5)
            .with_volume(50.0),
    ];

    // When: The records are normalized
    let series = normalize_candles(raw);

    // Then: The series is ascending by time
    let candles = series.candles();
    assert_eq!(candles.len(), 2);
    assert_eq!(candles[0].time, epoch("2024-01-01"));
    assert_eq!(candles[0].open, 8.0);
    assert_eq!(candles[1].time, epoch("2024-01-02"));
    assert_eq!(candles[1].open, 10.0);
}

#[test]
fn when_provider_sends_noisy_records_system_keeps_only_valid_unique_candles() {
    // Given: A retransmitted timestamp, a missing close and a broken high/low
    let raw = vec![
        RawCandle::new(300_i64).with_ohlc(1.0, 2.0, 0.5, 1.5),
        RawCandle::new(100_i64).with_ohlc(1.0, 2.0, 0.5, 1.5),
        RawCandle {
            close: None,
            ..RawCandle::new(200_i64).with_ohlc(1.0, 2.0, 0.5, 1.5)
        },
        RawCandle::new(400_i64).with_ohlc(1.0, 0.5, 2.0, 1.5),
        RawCandle::new(300_i64).with_ohlc(2.0, 3.0, 1.5, 2.5),
    ];

    // When: The records are normalized
    let series = normalize_candles(raw);

    // Then: Output is strictly ascending, unique, within bounds, last write wins
    let times: Vec<_> = series.iter().map(|candle| candle.time).collect();
    assert_eq!(times, vec![100, 300]);
    assert_eq!(series.find(300).map(|candle| candle.open), Some(2.0));
    for candle in &series {
        assert!(candle.low <= candle.open && candle.open <= candle.high);
        assert!(candle.low <= candle.close && candle.close <= candle.high);
    }
}

#[test]
fn when_series_is_normalized_twice_system_returns_the_same_series() {
    // Given: A normalized series
    let once = normalize_candles(vec![
        RawCandle::new(120_i64).with_ohlc(2.0, 3.0, 1.0, 2.5),
        RawCandle::new(60_i64).with_ohlc(1.0, 2.0, 0.5, 1.5).with_volume(0.0),
    ]);

    // When: It is fed back through the normalizer
    let twice = normalize_candles(once.iter().map(RawCandle::from));

    // Then: Nothing changes, including a zero volume
    assert_eq!(once, twice);
    assert_eq!(twice.find(60).and_then(|candle| candle.volume), Some(0.0));
}

#[test]
fn when_provider_returns_nothing_system_yields_an_empty_series() {
    let series = normalize_candles(Vec::<RawCandle>::new());
    assert!(series.is_empty());
    assert!(series.volume_points().is_empty());
}

// =============================================================================
// Quote Normalization
// =============================================================================

#[test]
fn when_quote_lacks_long_name_and_currency_system_applies_fallbacks() {
    // Given: A quote with only a price and a short name
    let raw: RawQuote =
        serde_json::from_str(r#"{"regularMarketPrice":150.2,"shortName":"Apple"}"#)
            .expect("valid payload");
    let symbol = Symbol::parse("AAPL").expect("valid");

    // When: It is normalized
    let quote = normalize_quote(&symbol, raw).expect("price present");

    // Then: Currency defaults to USD and the short name is displayed
    assert_eq!(quote.price, 150.2);
    assert_eq!(quote.currency, "USD");
    assert_eq!(quote.display_name, "Apple");
    assert_eq!(quote.symbol, symbol);
}

#[test]
fn when_quote_has_no_price_system_rejects_it() {
    let symbol = Symbol::parse("AAPL").expect("valid");
    let raw = RawQuote {
        long_name: Some(String::from("Apple Inc.")),
        ..RawQuote::default()
    };

    let error = normalize_quote(&symbol, raw).expect_err("price is required");

    assert_eq!(
        error,
        QuoteError::InvalidQuote {
            symbol: String::from("AAPL")
        }
    );
}

// =============================================================================
// Crosshair
// =============================================================================

#[test]
fn when_cursor_leaves_the_plot_system_clears_the_readout() {
    // Given: A projector showing a stat for a loaded candle
    let series = normalize_candles(vec![RawCandle::new("2024-01-01")
        .with_ohlc(100.0, 105.0, 99.0, 101.0)
        .with_volume(3_400_000.0)]);
    let projector = CrosshairProjector::new();
    let shown = projector
        .on_cursor_move(&CursorMoveEvent::at(epoch("2024-01-01")), &series)
        .expect("cursor on candle");
    assert_eq!(shown.delta_badge().as_deref(), Some("+1.00%"));
    assert_eq!(shown.volume_label(), "3.4M");

    // When: The cursor leaves the plot area
    let cleared = projector.on_cursor_move(&CursorMoveEvent::left_plot(), &series);

    // Then: The readout is gone
    assert!(cleared.is_none());
    assert!(projector.current().is_none());
}

#[test]
fn when_open_is_zero_system_omits_the_delta() {
    let series = normalize_candles(vec![RawCandle::new(60_i64).with_ohlc(0.0, 1.0, 0.0, 1.0)]);

    let stat = project(&CursorMoveEvent::at(60), &series).expect("cursor on candle");

    assert_eq!(stat.delta_percent, None);
    assert_eq!(stat.delta_badge(), None);
    assert_eq!(stat.volume_label(), "—");
}
