//! Expected column layout of the dataset

use crate::core::{ClassifyError, Result};
use std::collections::HashSet;

/// Label column of the mushroom dataset
pub const LABEL_COLUMN: &str = "type";

/// Feature columns of the UCI mushroom dataset
pub const MUSHROOM_FEATURES: [&str; 22] = [
    "cap_shape",
    "cap_surface",
    "cap_color",
    "bruises",
    "odor",
    "gill_attachment",
    "gill_spacing",
    "gill_size",
    "gill_color",
    "stalk_shape",
    "stalk_root",
    "stalk_surface_above_ring",
    "stalk_surface_below_ring",
    "stalk_color_above_ring",
    "stalk_color_below_ring",
    "veil_type",
    "veil_color",
    "ring_number",
    "ring_type",
    "spore_print_color",
    "population",
    "habitat",
];

/// Column names are compared after trimming and mapping `-` to `_`
pub fn normalize_column_name(name: &str) -> String {
    name.trim().replace('-', "_")
}

/// Label column plus an optional fixed feature set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSchema {
    label: String,
    features: Option<Vec<String>>,
}

impl DatasetSchema {
    /// Exact mushroom layout: `type` plus the 22 UCI feature columns
    pub fn mushroom() -> Self {
        Self {
            label: LABEL_COLUMN.to_string(),
            features: Some(MUSHROOM_FEATURES.iter().map(|s| s.to_string()).collect()),
        }
    }

    /// Only require the label column; any feature columns are accepted
    pub fn label_only(label: &str) -> Self {
        Self {
            label: normalize_column_name(label),
            features: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn features(&self) -> Option<&[String]> {
        self.features.as_deref()
    }

    /// Check normalized header names against the schema
    pub fn validate(&self, headers: &[String]) -> Result<()> {
        let mut seen = HashSet::new();
        for name in headers {
            if name.is_empty() {
                return Err(ClassifyError::InvalidSchema(
                    "empty column name in header".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(ClassifyError::InvalidSchema(format!(
                    "duplicate column '{name}'"
                )));
            }
        }

        if !seen.contains(self.label.as_str()) {
            return Err(ClassifyError::InvalidSchema(format!(
                "label column '{}' is missing",
                self.label
            )));
        }

        if let Some(features) = &self.features {
            let missing: Vec<&str> = features
                .iter()
                .map(String::as_str)
                .filter(|name| !seen.contains(name))
                .collect();
            let unexpected: Vec<&str> = headers
                .iter()
                .map(String::as_str)
                .filter(|name| *name != self.label && !features.iter().any(|f| f == name))
                .collect();

            if !missing.is_empty() || !unexpected.is_empty() {
                return Err(ClassifyError::InvalidSchema(format!(
                    "feature columns do not match the expected layout (missing: [{}], unexpected: [{}])",
                    missing.join(", "),
                    unexpected.join(", ")
                )));
            }
        }

        Ok(())
    }
}

impl Default for DatasetSchema {
    fn default() -> Self {
        Self::mushroom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mushroom_headers() -> Vec<String> {
        std::iter::once(LABEL_COLUMN)
            .chain(MUSHROOM_FEATURES)
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_normalize_column_name() {
        assert_eq!(normalize_column_name(" cap-shape "), "cap_shape");
        assert_eq!(normalize_column_name("type"), "type");
    }

    #[test]
    fn test_mushroom_schema_accepts_exact_layout() {
        let schema = DatasetSchema::mushroom();
        assert!(schema.validate(&mushroom_headers()).is_ok());

        // column order does not matter
        let mut reversed = mushroom_headers();
        reversed.reverse();
        assert!(schema.validate(&reversed).is_ok());
    }

    #[test]
    fn test_missing_label_is_invalid_schema() {
        let headers: Vec<String> = MUSHROOM_FEATURES.iter().map(|s| s.to_string()).collect();
        let err = DatasetSchema::mushroom().validate(&headers).unwrap_err();
        assert!(matches!(err, ClassifyError::InvalidSchema(_)));
        assert!(err.to_string().contains("'type'"));
    }

    #[test]
    fn test_missing_and_unexpected_features_reported() {
        let mut headers = mushroom_headers();
        headers.retain(|h| h != "odor");
        headers.push("smell".to_string());

        let err = DatasetSchema::mushroom().validate(&headers).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("missing: [odor]"), "{message}");
        assert!(message.contains("unexpected: [smell]"), "{message}");
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let headers = vec!["type".to_string(), "odor".to_string(), "odor".to_string()];
        let result = DatasetSchema::label_only("type").validate(&headers);
        assert!(matches!(result, Err(ClassifyError::InvalidSchema(_))));
    }

    #[test]
    fn test_label_only_schema() {
        let schema = DatasetSchema::label_only("type");
        let headers = vec!["type".to_string(), "anything".to_string()];
        assert!(schema.validate(&headers).is_ok());
        assert!(schema.features().is_none());
    }
}
