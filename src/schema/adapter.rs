//! Adapter for converting stored documents to HealthRecords
//!
//! All shape uncertainty of the store is resolved here: documents are parsed,
//! validated, and their numeric fields coerced, so the aggregation core only
//! ever sees closed `HealthRecord` values.

use crate::error::StatsError;
use crate::schema::document::*;
use crate::types::{HealthRecord, ValueSlot};
use tracing::{debug, warn};

/// Adapter for converting store documents to health records
pub struct RecordAdapter;

impl RecordAdapter {
    /// Parse a JSON string containing an array of documents
    pub fn parse_array(json: &str) -> Result<Vec<StoredDocument>, StatsError> {
        let documents: Vec<StoredDocument> = serde_json::from_str(json)?;
        Ok(documents)
    }

    /// Parse NDJSON (newline-delimited JSON) containing documents
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<StoredDocument>, StatsError> {
        let mut documents = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<StoredDocument>(trimmed) {
                Ok(document) => documents.push(document),
                Err(e) => {
                    return Err(StatsError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(documents)
    }

    /// Convert documents to records, failing on the first invalid document
    pub fn to_records(documents: &[StoredDocument]) -> Result<Vec<HealthRecord>, StatsError> {
        let records = documents
            .iter()
            .map(Self::to_record)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = records.len(), "converted store documents");
        Ok(records)
    }

    /// Convert a single document
    ///
    /// A first value that is missing or not numeric becomes `None`; the
    /// aggregator's missing-value policy decides what that means.
    pub fn to_record(document: &StoredDocument) -> Result<HealthRecord, StatsError> {
        document
            .validate()
            .map_err(|e| StatsError::InvalidRecord(format!("{}: {}", document.id, e)))?;

        let values: Vec<ValueSlot> = document
            .slots()
            .iter()
            .enumerate()
            .filter_map(|(idx, (value, unit))| {
                let unit = (*unit)?;
                let numeric = (*value).and_then(|v| v.as_f64());
                if numeric.is_none() {
                    warn!(
                        document_id = %document.id,
                        slot = idx + 1,
                        "document value is missing or not numeric"
                    );
                }
                Some(ValueSlot {
                    value: numeric,
                    unit: unit.to_string(),
                })
            })
            .collect();

        Ok(HealthRecord {
            id: document.id.clone(),
            owner_id: document.user_id.clone(),
            category_id: document.disease_id.clone(),
            category_label: document
                .disease_name
                .clone()
                .unwrap_or_else(|| document.disease_id.clone()),
            values,
            recorded_at: document.record_date,
        })
    }

    /// Convert a record back to its stored document shape
    pub fn to_document(record: &HealthRecord) -> StoredDocument {
        let slot = |i: usize| record.values.get(i);
        let value = |i: usize| slot(i).and_then(|s| s.value).map(DocumentValue::Number);
        let unit = |i: usize| slot(i).map(|s| s.unit.clone());

        StoredDocument {
            id: record.id.clone(),
            user_id: record.owner_id.clone(),
            disease_id: record.category_id.clone(),
            disease_name: Some(record.category_label.clone()),
            value1: value(0),
            value2: value(1),
            value3: value(2),
            value4: value(3),
            unit1: unit(0),
            unit2: unit(1),
            unit3: unit(2),
            unit4: unit(3),
            record_date: record.recorded_at,
        }
    }

    /// Validate a batch of documents, returning only the failures
    pub fn validate_documents(documents: &[StoredDocument]) -> Vec<ValidationResult> {
        documents
            .iter()
            .enumerate()
            .map(|(idx, document)| ValidationResult {
                index: idx,
                document_id: Some(document.id.clone()).filter(|id| !id.is_empty()),
                result: document.validate().err(),
            })
            .filter(|r| r.result.is_some())
            .collect()
    }
}

/// Result of document validation
#[derive(Debug)]
pub struct ValidationResult {
    pub index: usize,
    pub document_id: Option<String>,
    pub result: Option<ValidationError>,
}
