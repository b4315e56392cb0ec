//! Pipeline orchestration
//!
//! This module provides the public API for Health Stats. It composes window
//! resolution, the record store query, aggregation and trend extraction into a
//! single statistics report.

use crate::aggregator::Aggregator;
use crate::config::StatsConfig;
use crate::error::StatsError;
use crate::schema::RecordAdapter;
use crate::store::{InMemoryStore, RecordStore};
use crate::trend::TrendExtractor;
use crate::types::{CategorySummary, HealthRecord, Overview, StatisticsReport, TrendPoint};
use crate::window::Period;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

/// Summarize records per category with the default configuration.
///
/// Every distinct `category_id` in `records` appears exactly once as a key.
pub fn summarize(records: &[HealthRecord]) -> HashMap<String, CategorySummary> {
    Aggregator::summarize(records)
}

/// The `n` most recent points of `category_id`, oldest first.
pub fn trend(records: &[HealthRecord], category_id: &str, n: usize) -> Vec<TrendPoint> {
    TrendExtractor::trend(records, category_id, n)
}

/// Build a statistics report from stored documents JSON.
///
/// # Arguments
/// * `documents_json` - JSON array of store documents
/// * `owner_id` - Owner whose records are summarized
/// * `period` - "day", "week" or "month"
/// * `now` - Query time; the window ends here
///
/// # Returns
/// The report serialized as JSON
///
/// # Example
/// ```ignore
/// let report = documents_to_report_json(
///     documents_json,
///     "user-123".to_string(),
///     "week".to_string(),
///     Utc::now(),
/// )?;
/// ```
pub fn documents_to_report_json(
    documents_json: String,
    owner_id: String,
    period: String,
    now: DateTime<Utc>,
) -> Result<String, StatsError> {
    let period: Period = period.parse()?;
    let documents = RecordAdapter::parse_array(&documents_json)?;
    let store = InMemoryStore::with_records(RecordAdapter::to_records(&documents)?)?;

    let report = StatsProcessor::new().report(&store, &owner_id, period, now)?;
    serde_json::to_string(&report).map_err(StatsError::JsonError)
}

/// Processor carrying the configuration for repeated statistics requests.
#[derive(Debug, Clone, Default)]
pub struct StatsProcessor {
    config: StatsConfig,
}

impl StatsProcessor {
    /// Create a new processor with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StatsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StatsConfig {
        &self.config
    }

    /// Summarize records using the configured missing-value policy
    pub fn summarize(&self, records: &[HealthRecord]) -> HashMap<String, CategorySummary> {
        Aggregator::summarize_with_policy(records, self.config.missing_value_policy)
    }

    /// Trend for one category, capped at the configured number of points
    pub fn trend(&self, records: &[HealthRecord], category_id: &str) -> Vec<TrendPoint> {
        TrendExtractor::trend_with_policy(
            records,
            category_id,
            self.config.trend_points,
            self.config.missing_value_policy,
        )
    }

    /// Fetch an owner's records for `period` and compute the full report
    pub fn report(
        &self,
        store: &dyn RecordStore,
        owner_id: &str,
        period: Period,
        now: DateTime<Utc>,
    ) -> Result<StatisticsReport, StatsError> {
        let since = period.since(now);
        let records = store.fetch_records(owner_id, since)?;
        debug!(owner_id, %period, records = records.len(), "building statistics report");

        Ok(self.report_from_records(owner_id, period, since, now, records))
    }

    /// Compute a report from records that were already fetched for the window
    pub fn report_from_records(
        &self,
        owner_id: &str,
        period: Period,
        since: DateTime<Utc>,
        now: DateTime<Utc>,
        mut records: Vec<HealthRecord>,
    ) -> StatisticsReport {
        // The store promises newest-first, but do not rely on it
        records.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));

        let mut summaries: Vec<CategorySummary> = self.summarize(&records).into_values().collect();
        summaries.sort_by(|a, b| a.category_id.cmp(&b.category_id));

        let trends = TrendExtractor::series_for(
            &records,
            summaries.iter().map(|s| s.category_id.as_str()),
            self.config.trend_points,
            self.config.missing_value_policy,
        );

        StatisticsReport {
            owner_id: owner_id.to_string(),
            period,
            since,
            generated_at: now,
            overview: Overview::from_summaries(&summaries),
            summaries,
            trends,
        }
    }
}
