//! Stored health record document
//!
//! The hosted store keeps one flat document per measurement: identity fields,
//! up to four `valueN`/`unitN` pairs and an RFC 3339 `recordDate`. Values were
//! written by several client versions, so a value may arrive as a number or as
//! numeric text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Loosely typed numeric field as found in stored documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentValue {
    Number(f64),
    Text(String),
}

impl From<f64> for DocumentValue {
    fn from(v: f64) -> Self {
        DocumentValue::Number(v)
    }
}

impl From<String> for DocumentValue {
    fn from(v: String) -> Self {
        DocumentValue::Text(v)
    }
}

impl DocumentValue {
    /// Numeric reading, `None` for non-finite numbers and non-numeric text
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DocumentValue::Number(n) => Some(*n),
            DocumentValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
        .filter(|v| v.is_finite())
    }
}

/// One stored measurement document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Store-assigned identifier
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "diseaseId")]
    pub disease_id: String,
    /// Display label denormalized at write time
    #[serde(rename = "diseaseName", default, skip_serializing_if = "Option::is_none")]
    pub disease_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value1: Option<DocumentValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value2: Option<DocumentValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value3: Option<DocumentValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value4: Option<DocumentValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit3: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit4: Option<String>,
    /// When the measurement was taken
    #[serde(rename = "recordDate")]
    pub record_date: DateTime<Utc>,
}

impl StoredDocument {
    /// Value/unit pairs in slot order
    pub fn slots(&self) -> [(Option<&DocumentValue>, Option<&str>); 4] {
        [
            (self.value1.as_ref(), self.unit1.as_deref()),
            (self.value2.as_ref(), self.unit2.as_deref()),
            (self.value3.as_ref(), self.unit3.as_deref()),
            (self.value4.as_ref(), self.unit4.as_deref()),
        ]
    }

    /// Validate the document shape
    ///
    /// A slot is present when its unit is present. Slots must be contiguous
    /// from slot 1, and a value without a unit is misaligned.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::MissingField("$id".to_string()));
        }
        if self.user_id.trim().is_empty() {
            return Err(ValidationError::MissingField("userId".to_string()));
        }
        if self.disease_id.trim().is_empty() {
            return Err(ValidationError::MissingField("diseaseId".to_string()));
        }

        let mut gap_at: Option<usize> = None;
        for (idx, (value, unit)) in self.slots().iter().enumerate() {
            let slot = idx + 1;
            match (value, unit) {
                (Some(_), None) => return Err(ValidationError::UnitMissing { slot }),
                (_, Some(_)) => {
                    if let Some(gap) = gap_at {
                        return Err(ValidationError::SlotGap { missing: gap, present: slot });
                    }
                }
                (None, None) => {
                    gap_at.get_or_insert(slot);
                }
            }
        }

        if self.unit1.is_none() {
            return Err(ValidationError::NoValues);
        }

        Ok(())
    }
}

/// Shape errors in stored documents
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Document has no value slots")]
    NoValues,

    #[error("value{slot} has no paired unit{slot}")]
    UnitMissing { slot: usize },

    #[error("Slot {present} is present but slot {missing} is not")]
    SlotGap { missing: usize, present: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> StoredDocument {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_deserialize_document() {
        let doc = parse(
            r#"{
                "$id": "doc-1",
                "userId": "user-1",
                "diseaseId": "blood-pressure",
                "diseaseName": "Blood pressure",
                "value1": 120,
                "value2": "80",
                "unit1": "mmHg",
                "unit2": "mmHg",
                "recordDate": "2024-01-15T08:30:00.000Z"
            }"#,
        );

        assert_eq!(doc.disease_id, "blood-pressure");
        assert_eq!(doc.value1.as_ref().and_then(|v| v.as_f64()), Some(120.0));
        assert_eq!(doc.value2.as_ref().and_then(|v| v.as_f64()), Some(80.0));
        assert!(doc.value3.is_none());
        assert!(doc.validate().is_ok());
    }

    #[test]
    fn test_document_value_coercion() {
        assert_eq!(DocumentValue::Number(5.5).as_f64(), Some(5.5));
        assert_eq!(DocumentValue::Text(" 7.25 ".to_string()).as_f64(), Some(7.25));
        assert_eq!(DocumentValue::Text("abc".to_string()).as_f64(), None);
        assert_eq!(DocumentValue::Text("NaN".to_string()).as_f64(), None);
    }

    #[test]
    fn test_validation_errors() {
        let base = r#""$id": "d", "userId": "u", "diseaseId": "weight", "recordDate": "2024-01-15T08:30:00Z""#;

        let no_values = parse(&format!("{{{base}}}"));
        assert_eq!(no_values.validate(), Err(ValidationError::NoValues));

        let unpaired = parse(&format!(r#"{{{base}, "value1": 70}}"#));
        assert_eq!(unpaired.validate(), Err(ValidationError::UnitMissing { slot: 1 }));

        let gap = parse(&format!(r#"{{{base}, "value1": 70, "unit1": "kg", "value3": 1, "unit3": "x"}}"#));
        assert_eq!(
            gap.validate(),
            Err(ValidationError::SlotGap { missing: 2, present: 3 })
        );

        let missing_value = parse(&format!(r#"{{{base}, "unit1": "kg"}}"#));
        assert!(missing_value.validate().is_ok());
    }

    #[test]
    fn test_blank_identity_rejected() {
        let doc = parse(
            r#"{"$id": "d", "userId": " ", "diseaseId": "weight", "value1": 1, "unit1": "kg",
                "recordDate": "2024-01-15T08:30:00Z"}"#,
        );
        assert_eq!(
            doc.validate(),
            Err(ValidationError::MissingField("userId".to_string()))
        );
    }
}
