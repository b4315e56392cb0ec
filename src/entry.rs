//! Record entry
//!
//! Builds a new record from the raw text a user typed into a category's input
//! form. Every field is required and must parse as a number; unlike the legacy
//! client, unparseable text is rejected instead of being stored as 0.

use crate::catalog::find_category;
use crate::error::StatsError;
use crate::types::ValueSlot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A record that has not been stored yet (no id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDraft {
    pub owner_id: String,
    pub category_id: String,
    pub category_label: String,
    pub values: Vec<ValueSlot>,
    pub recorded_at: DateTime<Utc>,
}

impl RecordDraft {
    /// Build a draft from form input, one string per catalog field in order
    pub fn from_form<S: AsRef<str>>(
        owner_id: &str,
        category_id: &str,
        inputs: &[S],
        recorded_at: DateTime<Utc>,
    ) -> Result<Self, StatsError> {
        let category = find_category(category_id)
            .ok_or_else(|| StatsError::UnknownCategory(category_id.to_string()))?;

        if owner_id.trim().is_empty() {
            return Err(StatsError::InvalidRecord("owner id is required".to_string()));
        }

        if inputs.len() != category.fields.len() {
            return Err(StatsError::InvalidRecord(format!(
                "{} expects {} fields, got {}",
                category.id,
                category.fields.len(),
                inputs.len()
            )));
        }

        let values = category
            .fields
            .iter()
            .zip(inputs)
            .map(|(field, input)| {
                let text = input.as_ref().trim();
                if text.is_empty() {
                    return Err(StatsError::InvalidFieldInput {
                        field: field.name.to_string(),
                        reason: "value is required".to_string(),
                    });
                }
                let value = parse_number(text).ok_or_else(|| StatsError::InvalidFieldInput {
                    field: field.name.to_string(),
                    reason: format!("'{text}' is not a number"),
                })?;
                Ok(ValueSlot::new(value, field.unit))
            })
            .collect::<Result<Vec<_>, StatsError>>()?;

        Ok(Self {
            owner_id: owner_id.to_string(),
            category_id: category.id.to_string(),
            category_label: category.label.to_string(),
            values,
            recorded_at,
        })
    }
}

/// Parse user-typed numbers, accepting a decimal comma ("5,5")
fn parse_number(text: &str) -> Option<f64> {
    let normalized = if text.contains(',') && !text.contains('.') {
        text.replace(',', ".")
    } else {
        text.to_string()
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}
