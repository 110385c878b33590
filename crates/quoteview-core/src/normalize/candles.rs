use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::{debug, trace};

use crate::{Candle, CandleSeries, UtcDateTime, ValidationError};

/// Time field as providers send it: epoch seconds (integral or not) or a
/// date / RFC3339 string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawTime {
    Seconds(i64),
    Fractional(f64),
    Text(String),
}

impl RawTime {
    /// Whole epoch seconds, floored, if the value denotes a representable instant.
    pub fn epoch_seconds(&self) -> Option<i64> {
        let seconds = match self {
            Self::Seconds(seconds) => *seconds,
            Self::Fractional(value) => {
                if !value.is_finite() || *value < i64::MIN as f64 || *value >= i64::MAX as f64 {
                    return None;
                }
                value.floor() as i64
            }
            Self::Text(text) => UtcDateTime::parse(text).ok()?.unix_timestamp(),
        };

        UtcDateTime::from_unix(seconds).ok().map(|_| seconds)
    }
}

impl From<i64> for RawTime {
    fn from(value: i64) -> Self {
        Self::Seconds(value)
    }
}

impl From<f64> for RawTime {
    fn from(value: f64) -> Self {
        Self::Fractional(value)
    }
}

impl From<&str> for RawTime {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// One candle record exactly as the provider returned it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawCandle {
    #[serde(alias = "date", alias = "timestamp")]
    pub time: Option<RawTime>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl RawCandle {
    pub fn new(time: impl Into<RawTime>) -> Self {
        Self {
            time: Some(time.into()),
            ..Self::default()
        }
    }

    pub fn with_ohlc(mut self, open: f64, high: f64, low: f64, close: f64) -> Self {
        self.open = Some(open);
        self.high = Some(high);
        self.low = Some(low);
        self.close = Some(close);
        self
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    fn validate(&self) -> Result<Candle, ValidationError> {
        let time = match &self.time {
            Some(raw) => raw
                .epoch_seconds()
                .ok_or_else(|| ValidationError::InvalidTimestamp {
                    value: format!("{raw:?}"),
                })?,
            None => return Err(ValidationError::MissingField { field: "time" }),
        };

        Candle::new(
            time,
            required("open", self.open)?,
            required("high", self.high)?,
            required("low", self.low)?,
            required("close", self.close)?,
            self.volume,
        )
    }
}

impl From<&Candle> for RawCandle {
    fn from(candle: &Candle) -> Self {
        Self {
            time: Some(RawTime::Seconds(candle.time)),
            open: Some(candle.open),
            high: Some(candle.high),
            low: Some(candle.low),
            close: Some(candle.close),
            volume: candle.volume,
        }
    }
}

/// Build a strictly time-ascending series from untrusted records.
///
/// Invalid records are dropped. When two records share a timestamp the later
/// one in input order wins.
pub fn normalize_candles<I>(raw: I) -> CandleSeries
where
    I: IntoIterator<Item = RawCandle>,
{
    let mut by_time = BTreeMap::new();
    let mut dropped = 0_usize;

    for (index, record) in raw.into_iter().enumerate() {
        match record.validate() {
            Ok(candle) => {
                by_time.insert(candle.time, candle);
            }
            Err(reason) => {
                dropped += 1;
                trace!(index, %reason, "dropping candle record");
            }
        }
    }

    if dropped > 0 {
        debug!(dropped, kept = by_time.len(), "dropped malformed candle records");
    }

    CandleSeries::from_sorted(by_time.into_values().collect())
}

fn required(field: &'static str, value: Option<f64>) -> Result<f64, ValidationError> {
    value.ok_or(ValidationError::MissingField { field })
}
