//! Pipeline configuration
//!
//! Settings can come from a JSON file, from `HSTATS_*` environment variables,
//! or both (environment overrides file values).

use crate::error::StatsError;
use crate::window::Period;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default number of points in a trend series
pub const DEFAULT_TREND_POINTS: usize = 10;

/// How a record with no usable first value is treated by the aggregator and
/// the trend extractor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingValuePolicy {
    /// Count the record but leave it out of average/min/max and trend points.
    #[default]
    Exclude,
    /// Treat the missing value as 0. Matches the legacy mobile client, which
    /// coerced unparseable input to 0; this skews average and min downward.
    ZeroDefault,
}

impl MissingValuePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingValuePolicy::Exclude => "exclude",
            MissingValuePolicy::ZeroDefault => "zero_default",
        }
    }

    /// Resolve a record's first value under this policy
    pub fn resolve(&self, value: Option<f64>) -> Option<f64> {
        match (self, value) {
            (_, Some(v)) if v.is_finite() => Some(v),
            (MissingValuePolicy::Exclude, _) => None,
            (MissingValuePolicy::ZeroDefault, _) => Some(0.0),
        }
    }
}

impl fmt::Display for MissingValuePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissingValuePolicy {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "exclude" => Ok(MissingValuePolicy::Exclude),
            "zero_default" | "zero" => Ok(MissingValuePolicy::ZeroDefault),
            other => Err(StatsError::ConfigError(format!(
                "unknown missing value policy: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Cap on the number of points per trend series
    pub trend_points: usize,
    pub missing_value_policy: MissingValuePolicy,
    /// Window used when the caller does not pick one
    pub default_period: Period,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            trend_points: DEFAULT_TREND_POINTS,
            missing_value_policy: MissingValuePolicy::default(),
            default_period: Period::default(),
        }
    }
}

impl StatsConfig {
    /// Load configuration from JSON; missing keys take their defaults
    pub fn from_json(json: &str) -> Result<Self, StatsError> {
        serde_json::from_str(json).map_err(|e| StatsError::ConfigError(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, StatsError> {
        serde_json::to_string_pretty(self).map_err(StatsError::JsonError)
    }

    pub fn from_env() -> Result<Self, StatsError> {
        Self::default().with_env_overrides(|k| std::env::var(k).ok())
    }

    /// Apply `HSTATS_*` overrides read through `get`, so tests never touch
    /// the process environment.
    pub fn with_env_overrides<F>(mut self, mut get: F) -> Result<Self, StatsError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(points) = get("HSTATS_TREND_POINTS") {
            self.trend_points = points.trim().parse().map_err(|_| {
                StatsError::ConfigError(format!("HSTATS_TREND_POINTS is not a count: {points}"))
            })?;
        }
        if let Some(policy) = get("HSTATS_MISSING_VALUE_POLICY") {
            self.missing_value_policy = policy.parse()?;
        }
        if let Some(period) = get("HSTATS_DEFAULT_PERIOD") {
            self.default_period = period.parse()?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StatsConfig::default();
        assert_eq!(config.trend_points, 10);
        assert_eq!(config.missing_value_policy, MissingValuePolicy::Exclude);
        assert_eq!(config.default_period, Period::Week);
    }

    #[test]
    fn test_from_json_partial() {
        let config = StatsConfig::from_json(r#"{"trend_points": 5}"#).unwrap();
        assert_eq!(config.trend_points, 5);
        assert_eq!(config.missing_value_policy, MissingValuePolicy::Exclude);

        let config =
            StatsConfig::from_json(r#"{"missing_value_policy": "zero_default", "default_period": "month"}"#)
                .unwrap();
        assert_eq!(config.missing_value_policy, MissingValuePolicy::ZeroDefault);
        assert_eq!(config.default_period, Period::Month);

        assert!(StatsConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let get = |k: &str| match k {
            "HSTATS_TREND_POINTS" => Some("20".into()),
            "HSTATS_MISSING_VALUE_POLICY" => Some("zero-default".into()),
            "HSTATS_DEFAULT_PERIOD" => Some("day".into()),
            _ => None,
        };
        let config = StatsConfig::default().with_env_overrides(get).unwrap();
        assert_eq!(config.trend_points, 20);
        assert_eq!(config.missing_value_policy, MissingValuePolicy::ZeroDefault);
        assert_eq!(config.default_period, Period::Day);
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let get = |k: &str| match k {
            "HSTATS_TREND_POINTS" => Some("ten".into()),
            _ => None,
        };
        assert!(StatsConfig::default().with_env_overrides(get).is_err());
    }

    #[test]
    fn test_policy_resolve() {
        assert_eq!(MissingValuePolicy::Exclude.resolve(Some(4.0)), Some(4.0));
        assert_eq!(MissingValuePolicy::Exclude.resolve(None), None);
        assert_eq!(MissingValuePolicy::Exclude.resolve(Some(f64::NAN)), None);
        assert_eq!(MissingValuePolicy::ZeroDefault.resolve(None), Some(0.0));
        assert_eq!(MissingValuePolicy::ZeroDefault.resolve(Some(7.0)), Some(7.0));
    }
}
