//! Time-window resolution
//!
//! Translates the coarse period selector into a concrete lower-bound timestamp
//! for the record store query. A month is a fixed 30 days, not a calendar
//! month, so the bound is a pure function of `now`.

use crate::error::StatsError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Retrospective window selected by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    #[default]
    Week,
    Month,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
        }
    }

    /// Length of the window in whole days
    pub fn days(&self) -> i64 {
        match self {
            Period::Day => 1,
            Period::Week => 7,
            Period::Month => 30,
        }
    }

    /// Inclusive lower bound (`recorded_at >= since`) for a query issued at `now`
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days())
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            other => Err(StatsError::InvalidPeriod(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_since_offsets() {
        assert_eq!(
            Period::Day.since(now()),
            Utc.with_ymd_and_hms(2024, 3, 30, 12, 0, 0).unwrap()
        );
        assert_eq!(
            Period::Week.since(now()),
            Utc.with_ymd_and_hms(2024, 3, 24, 12, 0, 0).unwrap()
        );
        // Fixed 30 days, even across a 31-day month
        assert_eq!(
            Period::Month.since(now()),
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("day".parse::<Period>().unwrap(), Period::Day);
        assert_eq!(" WEEK ".parse::<Period>().unwrap(), Period::Week);
        assert_eq!("Month".parse::<Period>().unwrap(), Period::Month);
        assert!("year".parse::<Period>().is_err());

        assert_eq!(Period::Month.to_string(), "month");
        assert_eq!(Period::default(), Period::Week);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Period::Day).unwrap();
        assert_eq!(json, "\"day\"");
        let parsed: Period = serde_json::from_str("\"month\"").unwrap();
        assert_eq!(parsed, Period::Month);
    }
}
