//! Record store boundary
//!
//! The hosted document database is an external collaborator; the pipeline
//! only needs "records of this owner since this instant, newest first".
//! [`InMemoryStore`] implements that contract for the CLI, FFI and tests.

use crate::entry::RecordDraft;
use crate::error::StatsError;
use crate::types::HealthRecord;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

/// Query side of the record store
pub trait RecordStore {
    /// Records owned by `owner_id` with `recorded_at >= since`, ordered by
    /// `recorded_at` descending
    fn fetch_records(
        &self,
        owner_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<HealthRecord>, StatsError>;
}

/// In-memory storage for health records
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    records: Arc<Mutex<HashMap<String, HealthRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with already-identified records.
    ///
    /// Ids must be unique within the batch.
    pub fn with_records(records: impl IntoIterator<Item = HealthRecord>) -> Result<Self, StatsError> {
        let store = Self::new();
        {
            let mut map = store.lock()?;
            for record in records {
                record.validate()?;
                if map.contains_key(&record.id) {
                    warn!(record_id = %record.id, "duplicate record id in batch");
                    return Err(StatsError::InvalidRecord(format!(
                        "duplicate record id: {}",
                        record.id
                    )));
                }
                map.insert(record.id.clone(), record);
            }
        }
        Ok(store)
    }

    /// Store a new draft, assigning it an id
    pub fn insert(&self, draft: RecordDraft) -> Result<HealthRecord, StatsError> {
        let record = HealthRecord {
            id: Uuid::new_v4().to_string(),
            owner_id: draft.owner_id,
            category_id: draft.category_id,
            category_label: draft.category_label,
            values: draft.values,
            recorded_at: draft.recorded_at,
        };
        self.insert_record(record.clone())?;
        Ok(record)
    }

    /// Store a record as-is, replacing any record with the same id
    pub fn insert_record(&self, record: HealthRecord) -> Result<(), StatsError> {
        record.validate()?;
        let mut store = self.lock()?;
        store.insert(record.id.clone(), record);
        Ok(())
    }

    pub fn len(&self) -> Result<usize, StatsError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StatsError> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, HealthRecord>>, StatsError> {
        self.records
            .lock()
            .map_err(|e| StatsError::StoreError(e.to_string()))
    }
}

impl RecordStore for InMemoryStore {
    fn fetch_records(
        &self,
        owner_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<HealthRecord>, StatsError> {
        let store = self.lock()?;

        let mut records: Vec<HealthRecord> = store
            .values()
            .filter(|r| r.owner_id == owner_id && r.recorded_at >= since)
            .cloned()
            .collect();

        // Newest first; id breaks ties so map iteration order never leaks out
        records.sort_by(|a, b| {
            b.recorded_at
                .cmp(&a.recorded_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        debug!(owner_id, %since, count = records.len(), "fetched records");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueSlot;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    fn make_record(id: &str, owner: &str, days_ago: i64) -> HealthRecord {
        HealthRecord {
            id: id.to_string(),
            owner_id: owner.to_string(),
            category_id: "weight".to_string(),
            category_label: "Weight".to_string(),
            values: vec![ValueSlot::new(70.0, "kg")],
            recorded_at: now() - Duration::days(days_ago),
        }
    }

    #[test]
    fn test_insert_assigns_id() {
        let store = InMemoryStore::new();
        let draft = RecordDraft::from_form("user-1", "sleep", &["7.5", "8"], now()).unwrap();

        let stored = store.insert(draft).unwrap();
        assert!(Uuid::parse_str(&stored.id).is_ok());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_fetch_filters_owner_and_bound() {
        let store = InMemoryStore::with_records(vec![
            make_record("a", "user-1", 1),
            make_record("b", "user-1", 7),
            make_record("c", "user-1", 8),
            make_record("d", "user-2", 1),
        ])
        .unwrap();

        let since = now() - Duration::days(7);
        let ids: Vec<String> = store
            .fetch_records("user-1", since)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();

        // Bound is inclusive; result is newest first
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_with_records_rejects_duplicate_ids() {
        let result = InMemoryStore::with_records(vec![
            make_record("a", "user-1", 1),
            make_record("a", "user-1", 2),
        ]);
        assert!(matches!(result, Err(StatsError::InvalidRecord(msg)) if msg == "duplicate record id: a"));
    }

    #[test]
    fn test_rejects_invalid_record() {
        let store = InMemoryStore::new();
        let mut record = make_record("a", "user-1", 1);
        record.values.clear();
        assert!(store.insert_record(record).is_err());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_clones_share_storage() {
        let store = InMemoryStore::new();
        let other = store.clone();
        other.insert_record(make_record("a", "user-1", 0)).unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }
}
