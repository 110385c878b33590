use serde::{Deserialize, Serialize};

use crate::{Symbol, ValidationError};

/// One OHLCV candle keyed by its epoch-second open time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// `None` means the provider did not report a volume; zero is a real value.
    pub volume: Option<f64>,
}

impl Candle {
    pub fn new(
        time: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: Option<f64>,
    ) -> Result<Self, ValidationError> {
        validate_finite("open", open)?;
        validate_finite("high", high)?;
        validate_finite("low", low)?;
        validate_finite("close", close)?;

        if high < low {
            return Err(ValidationError::InvalidCandleRange);
        }

        if open < low || open > high || close < low || close > high {
            return Err(ValidationError::InvalidCandleBounds);
        }

        Ok(Self {
            time,
            open,
            high,
            low,
            close,
            volume: volume.filter(|value| value.is_finite() && *value >= 0.0),
        })
    }
}

/// Volume bar handed to the rendering surface alongside the candles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolumePoint {
    pub time: i64,
    pub value: f64,
}

/// Strictly time-ascending candles for one `(symbol, days, interval)` request.
///
/// Only the candle normalizer builds non-empty series, so timestamps are
/// unique and sorted. A new request replaces the whole series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_sorted(candles: Vec<Candle>) -> Self {
        debug_assert!(candles.windows(2).all(|pair| pair[0].time < pair[1].time));
        Self { candles }
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candle> {
        self.candles.iter()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Exact lookup on the time axis.
    pub fn find(&self, time: i64) -> Option<&Candle> {
        self.candles
            .binary_search_by_key(&time, |candle| candle.time)
            .ok()
            .map(|index| &self.candles[index])
    }

    /// Volume histogram points; candles with unknown volume are skipped.
    pub fn volume_points(&self) -> Vec<VolumePoint> {
        self.candles
            .iter()
            .filter_map(|candle| {
                candle.volume.map(|value| VolumePoint {
                    time: candle.time,
                    value,
                })
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a CandleSeries {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Canonical quote shown in the view header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: Symbol,
    pub price: f64,
    pub currency: String,
    pub display_name: String,
}

/// One symbol-search suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub symbol: String,
    pub description: String,
}

fn validate_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(time: i64, volume: Option<f64>) -> Candle {
        Candle::new(time, 10.0, 12.0, 9.0, 11.0, volume).expect("valid candle")
    }

    #[test]
    fn rejects_invalid_candle_bounds() {
        let err = Candle::new(0, 10.0, 12.0, 9.0, 12.5, Some(10.0)).expect_err("must fail");
        assert_eq!(err, ValidationError::InvalidCandleBounds);
    }

    #[test]
    fn rejects_inverted_range() {
        let err = Candle::new(0, 10.0, 9.0, 12.0, 10.0, None).expect_err("must fail");
        assert_eq!(err, ValidationError::InvalidCandleRange);
    }

    #[test]
    fn rejects_non_finite_prices() {
        let err = Candle::new(0, f64::NAN, 12.0, 9.0, 11.0, None).expect_err("must fail");
        assert_eq!(err, ValidationError::NonFiniteValue { field: "open" });
    }

    #[test]
    fn keeps_zero_volume_and_drops_non_finite_volume() {
        assert_eq!(candle(0, Some(0.0)).volume, Some(0.0));
        assert_eq!(candle(0, Some(f64::INFINITY)).volume, None);
        assert_eq!(candle(0, Some(-5.0)).volume, None);
    }

    #[test]
    fn finds_candles_by_exact_time() {
        let series = CandleSeries::from_sorted(vec![candle(60, None), candle(120, Some(5.0))]);
        assert_eq!(series.find(120).map(|c| c.time), Some(120));
        assert!(series.find(90).is_none());
    }

    #[test]
    fn volume_points_skip_unknown_volume() {
        let series = CandleSeries::from_sorted(vec![candle(60, None), candle(120, Some(0.0))]);
        assert_eq!(
            series.volume_points(),
            vec![VolumePoint {
                time: 120,
                value: 0.0
            }]
        );
    }

    #[test]
    fn quote_serializes_display_name_in_camel_case() {
        let quote = Quote {
            symbol: Symbol::parse("AAPL").expect("valid"),
            price: 150.2,
            currency: String::from("USD"),
            display_name: String::from("Apple"),
        };
        let json = serde_json::to_value(&quote).expect("serialize");
        assert_eq!(json["displayName"], "Apple");
        assert_eq!(json["symbol"], "AAPL");
    }
}
