use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{SamplingInterval, ValidationError};

/// Range buttons offered by the view. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeSelection {
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "6M")]
    SixMonths,
    #[default]
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "5Y")]
    FiveYears,
    #[serde(rename = "Max")]
    Max,
}

/// Day count and sampling interval a range selection expands to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RangeWindow {
    pub days: u32,
    pub interval: SamplingInterval,
}

impl RangeSelection {
    pub const ALL: [Self; 6] = [
        Self::OneDay,
        Self::OneMonth,
        Self::SixMonths,
        Self::OneYear,
        Self::FiveYears,
        Self::Max,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::OneDay => "1D",
            Self::OneMonth => "1M",
            Self::SixMonths => "6M",
            Self::OneYear => "1Y",
            Self::FiveYears => "5Y",
            Self::Max => "Max",
        }
    }

    /// Expand the selection into its fixed `(days, interval)` pair.
    pub const fn resolve(self) -> RangeWindow {
        let (days, interval) = match self {
            Self::OneDay => (1, SamplingInterval::OneMinute),
            Self::OneMonth => (30, SamplingInterval::FiveMinutes),
            Self::SixMonths => (180, SamplingInterval::ThirtyMinutes),
            Self::OneYear => (365, SamplingInterval::OneDay),
            Self::FiveYears => (1825, SamplingInterval::OneWeek),
            Self::Max => (3650, SamplingInterval::OneMonth),
        };
        RangeWindow { days, interval }
    }
}

impl Display for RangeSelection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RangeSelection {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|range| range.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ValidationError::InvalidRange {
                value: trimmed.to_owned(),
            })
    }
}
