//! Trend extraction
//!
//! Produces a bounded, chronologically ascending series of first-slot values
//! for one category, ready for charting left to right.

use crate::config::MissingValuePolicy;
use crate::types::{HealthRecord, TrendPoint, TrendSeries};

/// Trend extractor for computing chart series
pub struct TrendExtractor;

impl TrendExtractor {
    /// Most recent `n` points for `category_id`, oldest first
    pub fn trend(records: &[HealthRecord], category_id: &str, n: usize) -> Vec<TrendPoint> {
        Self::trend_with_policy(records, category_id, n, MissingValuePolicy::default())
    }

    /// Like [`TrendExtractor::trend`] with an explicit missing-value policy.
    ///
    /// Records are re-sorted newest first (stable), so the input order only
    /// matters for records sharing a timestamp: the first one seen is kept and
    /// later duplicates are dropped, keeping the output strictly ascending.
    pub fn trend_with_policy(
        records: &[HealthRecord],
        category_id: &str,
        n: usize,
        policy: MissingValuePolicy,
    ) -> Vec<TrendPoint> {
        if n == 0 {
            return Vec::new();
        }

        let mut group: Vec<&HealthRecord> = records
            .iter()
            .filter(|r| r.category_id == category_id)
            .collect();
        group.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));

        let mut points: Vec<TrendPoint> = Vec::with_capacity(n.min(group.len()));
        for record in group {
            if points.len() == n {
                break;
            }
            let Some(value) = policy.resolve(record.value1()) else {
                continue;
            };
            if points
                .last()
                .is_some_and(|p| p.timestamp == record.recorded_at)
            {
                continue;
            }
            points.push(TrendPoint {
                timestamp: record.recorded_at,
                value,
            });
        }

        points.reverse();
        points
    }

    /// One series per requested category, skipping categories with no points
    pub fn series_for<'a>(
        records: &[HealthRecord],
        category_ids: impl IntoIterator<Item = &'a str>,
        n: usize,
        policy: MissingValuePolicy,
    ) -> Vec<TrendSeries> {
        category_ids
            .into_iter()
            .filter_map(|category_id| {
                let points = Self::trend_with_policy(records, category_id, n, policy);
                if points.is_empty() {
                    None
                } else {
                    Some(TrendSeries {
                        category_id: category_id.to_string(),
                        points,
                    })
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueSlot;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t(hours: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap() + Duration::hours(hours)
    }

    fn make_record(id: &str, category: &str, value: Option<f64>, hours: i64) -> HealthRecord {
        HealthRecord {
            id: id.to_string(),
            owner_id: "user-1".to_string(),
            category_id: category.to_string(),
            category_label: category.to_string(),
            values: vec![ValueSlot {
                value,
                unit: "u".to_string(),
            }],
            recorded_at: t(hours),
        }
    }

    #[test]
    fn test_diabetes_scenario() {
        let records = vec![
            make_record("r3", "diabetes", Some(90.0), 3),
            make_record("r2", "diabetes", Some(110.0), 2),
            make_record("r1", "diabetes", Some(100.0), 1),
        ];

        let points = TrendExtractor::trend(&records, "diabetes", 2);
        assert_eq!(
            points,
            vec![
                TrendPoint { timestamp: t(2), value: 110.0 },
                TrendPoint { timestamp: t(3), value: 90.0 },
            ]
        );
    }

    #[test]
    fn test_fewer_than_n_returns_all_ascending() {
        let records = vec![
            make_record("b", "sleep", Some(8.0), 5),
            make_record("a", "sleep", Some(7.0), 1),
        ];

        let points = TrendExtractor::trend(&records, "sleep", 10);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].timestamp, t(1));
        assert_eq!(points[1].timestamp, t(5));
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let records = vec![
            make_record("a", "sleep", Some(1.0), 1),
            make_record("c", "sleep", Some(3.0), 3),
            make_record("b", "sleep", Some(2.0), 2),
            make_record("d", "sleep", Some(4.0), 4),
        ];

        let values: Vec<f64> = TrendExtractor::trend(&records, "sleep", 3)
            .iter()
            .map(|p| p.value)
            .collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_filters_by_category() {
        let records = vec![
            make_record("w", "weight", Some(70.0), 2),
            make_record("s", "sleep", Some(7.0), 1),
        ];

        let points = TrendExtractor::trend(&records, "weight", 10);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].value, 70.0);
    }

    #[test]
    fn test_empty_cases() {
        assert!(TrendExtractor::trend(&[], "sleep", 10).is_empty());

        let records = vec![make_record("w", "weight", Some(70.0), 2)];
        assert!(TrendExtractor::trend(&records, "sleep", 10).is_empty());
        assert!(TrendExtractor::trend(&records, "weight", 0).is_empty());
    }

    #[test]
    fn test_duplicate_timestamps_keep_first() {
        let records = vec![
            make_record("first", "sleep", Some(7.0), 1),
            make_record("second", "sleep", Some(9.0), 1),
        ];

        let points = TrendExtractor::trend(&records, "sleep", 10);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].value, 7.0);
    }

    #[test]
    fn test_missing_values_follow_policy() {
        let records = vec![
            make_record("c", "sleep", Some(8.0), 3),
            make_record("b", "sleep", None, 2),
            make_record("a", "sleep", Some(6.0), 1),
        ];

        let excluded = TrendExtractor::trend(&records, "sleep", 10);
        assert_eq!(excluded.len(), 2);

        let zeroed =
            TrendExtractor::trend_with_policy(&records, "sleep", 10, MissingValuePolicy::ZeroDefault);
        assert_eq!(zeroed.len(), 3);
        assert_eq!(zeroed[1].value, 0.0);
    }

    #[test]
    fn test_default_cap_is_ten() {
        let records: Vec<HealthRecord> = (0..15)
            .map(|i| make_record(&format!("r{i}"), "exercise", Some(i as f64), i))
            .collect();

        let points = TrendExtractor::trend(&records, "exercise", crate::config::DEFAULT_TREND_POINTS);
        assert_eq!(points.len(), 10);
        assert_eq!(points.first().unwrap().value, 5.0);
        assert_eq!(points.last().unwrap().value, 14.0);
    }

    #[test]
    fn test_series_for_skips_empty() {
        let records = vec![
            make_record("w", "weight", Some(70.0), 2),
            make_record("s", "sleep", None, 1),
        ];

        let series =
            TrendExtractor::series_for(&records, ["weight", "sleep"], 10, MissingValuePolicy::Exclude);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].category_id, "weight");
    }
}
