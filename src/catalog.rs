//! Category catalog
//!
//! Static table of the health metric categories the application offers for
//! logging. The statistics core never validates against it; it is used by
//! record entry and by presentation layers.

use serde::Serialize;

/// Input kind of a category field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Decimal,
    Number,
    Text,
}

/// One value slot of a category
#[derive(Debug, Clone, Serialize)]
pub struct CategoryField {
    pub name: &'static str,
    pub unit: &'static str,
    pub placeholder: &'static str,
    pub kind: FieldKind,
}

/// A kind of health metric
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    pub description: &'static str,
    /// Ordered fields; field i maps to value slot i + 1
    pub fields: &'static [CategoryField],
}

const fn field(
    name: &'static str,
    unit: &'static str,
    placeholder: &'static str,
    kind: FieldKind,
) -> CategoryField {
    CategoryField {
        name,
        unit,
        placeholder,
        kind,
    }
}

static CATALOG: [Category; 6] = [
    Category {
        id: "blood-pressure",
        label: "Blood pressure",
        icon: "heart",
        color: "#FF6B6B",
        description: "Systolic and diastolic pressure",
        fields: &[
            field("Systolic", "mmHg", "120", FieldKind::Number),
            field("Diastolic", "mmHg", "80", FieldKind::Number),
        ],
    },
    Category {
        id: "diabetes",
        label: "Diabetes",
        icon: "water-drop",
        color: "#FFA500",
        description: "Blood glucose",
        fields: &[
            field("Blood glucose", "mg/dL", "100", FieldKind::Decimal),
            field("HbA1c", "%", "5.5", FieldKind::Decimal),
        ],
    },
    Category {
        id: "cholesterol",
        label: "Cholesterol",
        icon: "test-tube",
        color: "#4ECDC4",
        description: "Cholesterol and triglycerides",
        fields: &[
            field("Total cholesterol", "mg/dL", "200", FieldKind::Number),
            field("Triglycerides", "mg/dL", "150", FieldKind::Number),
            field("LDL", "mg/dL", "100", FieldKind::Number),
            field("HDL", "mg/dL", "50", FieldKind::Number),
        ],
    },
    Category {
        id: "weight",
        label: "Weight",
        icon: "scale",
        color: "#95E1D3",
        description: "Body weight and BMI tracking",
        fields: &[
            field("Weight", "kg", "70", FieldKind::Decimal),
            field("Height", "cm", "170", FieldKind::Number),
        ],
    },
    Category {
        id: "exercise",
        label: "Exercise",
        icon: "run",
        color: "#A8E6CF",
        description: "Physical activity",
        fields: &[
            field("Steps", "steps", "10000", FieldKind::Number),
            field("Calories burned", "kcal", "2500", FieldKind::Number),
            field("Workout time", "min", "30", FieldKind::Number),
        ],
    },
    Category {
        id: "sleep",
        label: "Sleep",
        icon: "sleep",
        color: "#FFD3B6",
        description: "Sleep duration and quality",
        fields: &[
            field("Sleep duration", "h", "8", FieldKind::Decimal),
            field("Quality", "1-10", "8", FieldKind::Number),
        ],
    },
];

/// All known categories, in display order
pub fn catalog() -> &'static [Category] {
    &CATALOG
}

pub fn find_category(id: &str) -> Option<&'static Category> {
    CATALOG.iter().find(|c| c.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MAX_VALUE_SLOTS;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_ids_unique() {
        let ids: HashSet<&str> = catalog().iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), catalog().len());
    }

    #[test]
    fn test_fields_fit_value_slots() {
        for category in catalog() {
            assert!(!category.fields.is_empty(), "{} has no fields", category.id);
            assert!(category.fields.len() <= MAX_VALUE_SLOTS);
        }
    }

    #[test]
    fn test_find_category() {
        let bp = find_category("blood-pressure").unwrap();
        assert_eq!(bp.fields[0].unit, "mmHg");
        assert_eq!(find_category("cholesterol").unwrap().fields.len(), 4);
        assert!(find_category("unknown").is_none());
    }
}
