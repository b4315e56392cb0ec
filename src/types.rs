//! Core types for the Health Stats pipeline
//!
//! This module defines the data structures that flow through the statistics
//! pipeline: stored health records, per-category summaries, trend series and
//! the report handed back to the presentation layer.

use crate::error::StatsError;
use crate::window::Period;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of value/unit slots a record can carry
pub const MAX_VALUE_SLOTS: usize = 4;

/// One positional measurement on a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueSlot {
    /// Numeric value; `None` when the stored value was missing or unparseable
    pub value: Option<f64>,
    /// Unit paired with the value (e.g. "mmHg", "mg/dL")
    pub unit: String,
}

impl ValueSlot {
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value: Some(value),
            unit: unit.into(),
        }
    }
}

/// A single logged measurement, as returned by the record store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    /// Opaque identifier assigned by the store
    pub id: String,
    /// Identifier of the recording user
    pub owner_id: String,
    /// Category key (e.g. "blood-pressure", "diabetes")
    pub category_id: String,
    /// Display name denormalized onto the record at write time
    pub category_label: String,
    /// Positional value/unit slots (1..=4)
    pub values: Vec<ValueSlot>,
    /// When the measurement was taken
    pub recorded_at: DateTime<Utc>,
}

impl HealthRecord {
    /// Value in the first slot, the one all statistics are computed over
    pub fn value1(&self) -> Option<f64> {
        self.values.first().and_then(|slot| slot.value)
    }

    /// Unit of the first slot
    pub fn unit1(&self) -> Option<&str> {
        self.values.first().map(|slot| slot.unit.as_str())
    }

    /// Check the closed-shape invariants: 1..=4 slots and non-empty keys
    pub fn validate(&self) -> Result<(), StatsError> {
        if self.values.is_empty() {
            return Err(StatsError::InvalidRecord(format!(
                "record {} has no values",
                self.id
            )));
        }
        if self.values.len() > MAX_VALUE_SLOTS {
            return Err(StatsError::InvalidRecord(format!(
                "record {} has {} values (max {})",
                self.id,
                self.values.len(),
                MAX_VALUE_SLOTS
            )));
        }
        if self.category_id.trim().is_empty() {
            return Err(StatsError::InvalidRecord(format!(
                "record {} has an empty category id",
                self.id
            )));
        }
        Ok(())
    }
}

/// Per-category statistical reduction over the records of a window
///
/// `average`, `min` and `max` cover the first value slot only. They are
/// `None` when no record of the group carried a usable first value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category_id: String,
    pub category_label: String,
    /// Number of records in the window for this category
    pub count: usize,
    /// Mean of value 1, rounded to two decimals
    pub average: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Record with the most recent `recorded_at`
    pub latest: HealthRecord,
}

/// One charted point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Chronologically ascending series for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub category_id: String,
    pub points: Vec<TrendPoint>,
}

/// Headline totals across all categories of a window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overview {
    /// Records across all categories
    pub total_records: usize,
    /// Distinct categories present
    pub category_count: usize,
}

impl Overview {
    pub fn from_summaries<'a>(summaries: impl IntoIterator<Item = &'a CategorySummary>) -> Self {
        summaries
            .into_iter()
            .fold(Overview::default(), |acc, summary| Overview {
                total_records: acc.total_records + summary.count,
                category_count: acc.category_count + 1,
            })
    }
}

/// Complete statistics for one owner and window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsReport {
    pub owner_id: String,
    pub period: Period,
    /// Inclusive lower bound used for the store query
    pub since: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
    pub overview: Overview,
    /// Summaries sorted by category id
    pub summaries: Vec<CategorySummary>,
    /// Trend series in the same order as `summaries`; empty series are omitted
    pub trends: Vec<TrendSeries>,
}
