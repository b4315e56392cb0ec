//! Per-category aggregation
//!
//! Groups a flat list of health records by category and reduces each group to
//! a [`CategorySummary`]: record count, mean/min/max over the first value
//! slot, and the most recent record.

use crate::config::MissingValuePolicy;
use crate::types::{CategorySummary, HealthRecord};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Aggregator for computing category summaries
pub struct Aggregator;

impl Aggregator {
    /// Summarize records with the default missing-value policy
    pub fn summarize(records: &[HealthRecord]) -> HashMap<String, CategorySummary> {
        Self::summarize_with_policy(records, MissingValuePolicy::default())
    }

    /// Summarize records, one entry per distinct category id present
    pub fn summarize_with_policy(
        records: &[HealthRecord],
        policy: MissingValuePolicy,
    ) -> HashMap<String, CategorySummary> {
        let mut groups: HashMap<&str, GroupAccumulator> = HashMap::new();

        for record in records {
            let value = policy.resolve(record.value1());
            match (value, record.value1()) {
                (None, _) => warn!(
                    record_id = %record.id,
                    category = %record.category_id,
                    "record has no usable first value; excluded from statistics"
                ),
                (Some(_), None) => debug!(
                    record_id = %record.id,
                    category = %record.category_id,
                    "record has no usable first value; counted as 0"
                ),
                _ => {}
            }

            groups
                .entry(record.category_id.as_str())
                .or_insert_with(|| GroupAccumulator::new(record))
                .add(record, value);
        }

        groups
            .into_iter()
            .map(|(category_id, acc)| (category_id.to_string(), acc.into_summary()))
            .collect()
    }
}

/// Running reduction over one category's records
struct GroupAccumulator<'a> {
    count: usize,
    mean: f64,
    valued: usize,
    min: Option<f64>,
    max: Option<f64>,
    latest: &'a HealthRecord,
}

impl<'a> GroupAccumulator<'a> {
    fn new(first: &'a HealthRecord) -> Self {
        Self {
            count: 0,
            mean: 0.0,
            valued: 0,
            min: None,
            max: None,
            latest: first,
        }
    }

    fn add(&mut self, record: &'a HealthRecord, value: Option<f64>) {
        self.count += 1;

        // Strictly greater: on equal timestamps the first record seen wins
        if record.recorded_at > self.latest.recorded_at {
            self.latest = record;
        }

        if let Some(v) = value {
            // Running mean stays finite where a plain sum of large values would not
            self.valued += 1;
            self.mean += (v - self.mean) / self.valued as f64;
            self.min = Some(self.min.map_or(v, |m| m.min(v)));
            self.max = Some(self.max.map_or(v, |m| m.max(v)));
        }
    }

    fn into_summary(self) -> CategorySummary {
        let average = match (self.min, self.max) {
            (Some(min), Some(max)) => Some(round2(self.mean.clamp(min, max))),
            _ => None,
        };

        CategorySummary {
            category_id: self.latest.category_id.clone(),
            category_label: self.latest.category_label.clone(),
            count: self.count,
            average,
            min: self.min.map(round2),
            max: self.max.map(round2),
            latest: self.latest.clone(),
        }
    }
}

/// Round to two decimal places, halves away from zero
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / 100.0
}
