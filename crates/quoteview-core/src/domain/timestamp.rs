use std::fmt::{Display, Formatter};

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, UtcOffset};

use crate::ValidationError;

/// Point in time normalized to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcDateTime(OffsetDateTime);

impl UtcDateTime {
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    pub fn from_unix(seconds: i64) -> Result<Self, ValidationError> {
        OffsetDateTime::from_unix_timestamp(seconds)
            .map(Self)
            .map_err(|_| ValidationError::InvalidTimestamp {
                value: seconds.to_string(),
            })
    }

    /// Parse RFC3339 (any offset, converted to UTC) or a bare `YYYY-MM-DD` date
    /// taken as midnight UTC.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
            return Ok(Self(parsed.to_offset(UtcOffset::UTC)));
        }

        Date::parse(trimmed, format_description!("[year]-[month]-[day]"))
            .map(|date| Self(date.midnight().assume_utc()))
            .map_err(|_| ValidationError::InvalidTimestamp {
                value: trimmed.to_owned(),
            })
    }

    pub fn unix_timestamp(self) -> i64 {
        self.0.unix_timestamp()
    }

    /// The instant `days` days earlier, saturating at the earliest representable date.
    pub fn days_before(self, days: u32) -> Self {
        self.0
            .checked_sub(Duration::days(i64::from(days)))
            .map(Self)
            .unwrap_or(self)
    }

    pub fn format_rfc3339(self) -> String {
        self.0
            .format(&Rfc3339)
            .unwrap_or_else(|_| self.unix_timestamp().to_string())
    }

    /// Human-readable label used for the crosshair readout.
    pub fn display_label(self) -> String {
        self.0
            .format(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second] UTC"
            ))
            .unwrap_or_else(|_| self.unix_timestamp().to_string())
    }
}

impl Display for UtcDateTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_date_as_midnight_utc() {
        let parsed = UtcDateTime::parse("2024-01-02").expect("must parse");
        assert_eq!(parsed.unix_timestamp(), 1_704_153_600);
    }

    #[test]
    fn converts_offset_timestamps_to_utc() {
        let parsed = UtcDateTime::parse("2024-01-01T01:00:00+01:00").expect("must parse");
        assert_eq!(parsed.format_rfc3339(), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn rejects_garbage() {
        let err = UtcDateTime::parse("yesterday").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidTimestamp { .. }));
    }

    #[test]
    fn formats_display_label() {
        let ts = UtcDateTime::from_unix(1_704_153_600 + 3_661).expect("valid");
        assert_eq!(ts.display_label(), "2024-01-02 01:01:01 UTC");
    }

    #[test]
    fn subtracts_days() {
        let ts = UtcDateTime::parse("2024-03-01").expect("valid");
        assert_eq!(ts.days_before(1).format_rfc3339(), "2024-02-29T00:00:00Z");
    }
}
