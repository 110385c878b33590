use serde::Deserialize;

use crate::{Quote, QuoteError, Symbol};

/// Currency assumed when the provider omits one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Quote record exactly as the provider returned it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuote {
    pub symbol: Option<String>,
    pub regular_market_price: Option<f64>,
    pub currency: Option<String>,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
}

/// Validate a provider quote against the symbol that was requested.
///
/// The price is the only required field. The display name falls back from the
/// long name to the short name to the requested symbol.
pub fn normalize_quote(requested: &Symbol, raw: RawQuote) -> Result<Quote, QuoteError> {
    let price = raw
        .regular_market_price
        .filter(|price| price.is_finite())
        .ok_or_else(|| QuoteError::InvalidQuote {
            symbol: requested.to_string(),
        })?;

    let symbol = raw
        .symbol
        .as_deref()
        .and_then(|echoed| Symbol::parse(echoed).ok())
        .unwrap_or_else(|| requested.clone());

    let currency = non_blank(raw.currency)
        .map(|currency| currency.to_ascii_uppercase())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_owned());

    let display_name = non_blank(raw.long_name)
        .or_else(|| non_blank(raw.short_name))
        .unwrap_or_else(|| requested.to_string());

    Ok(Quote {
        symbol,
        price,
        currency,
        display_name,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}
