use serde::{Deserialize, Serialize};
use validator::Validate;

/// A proposed pairing of one column from each dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Correspondence {
    /// Column from the first dataset
    #[serde(rename = "column1", alias = "columnFromA")]
    pub column_a: String,

    /// Column from the second dataset
    #[serde(rename = "column2", alias = "columnFromB")]
    pub column_b: String,

    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default)]
    pub confidence: f64,

    #[serde(default, alias = "rationale")]
    pub reason: String,

    #[validate(length(min = 1))]
    pub merged_name: String,
}

impl Correspondence {
    pub fn new(
        column_a: impl Into<String>,
        column_b: impl Into<String>,
        merged_name: impl Into<String>,
    ) -> Self {
        Self {
            column_a: column_a.into(),
            column_b: column_b.into(),
            confidence: 1.0,
            reason: String::new(),
            merged_name: merged_name.into(),
        }
    }

    pub fn with_confidence(mut self, confidence: f64, reason: impl Into<String>) -> Self {
        self.confidence = confidence;
        self.reason = reason.into();
        self
    }
}

/// What the mapping oracle hands back for review.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingSuggestion {
    #[serde(default)]
    pub mappings: Vec<Correspondence>,
    #[serde(default)]
    pub unmatched_columns1: Vec<String>,
    #[serde(default)]
    pub unmatched_columns2: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        let corr = Correspondence::new("email", "e-mail", "email").with_confidence(0.9, "synonym");
        let json = serde_json::to_value(&corr).unwrap();
        assert_eq!(json["column1"], "email");
        assert_eq!(json["column2"], "e-mail");
        assert_eq!(json["mergedName"], "email");
        assert_eq!(json["reason"], "synonym");
    }

    #[test]
    fn test_accepts_descriptive_aliases() {
        let corr: Correspondence = serde_json::from_str(
            r#"{"columnFromA":"a","columnFromB":"b","mergedName":"ab","confidence":0.5,"rationale":"same"}"#,
        )
        .unwrap();
        assert_eq!(corr.column_a, "a");
        assert_eq!(corr.column_b, "b");
        assert_eq!(corr.reason, "same");
    }

    #[test]
    fn test_confidence_range_is_validated() {
        let corr = Correspondence::new("a", "b", "ab").with_confidence(1.5, "");
        assert!(corr.validate().is_err());

        let corr = Correspondence::new("a", "b", "").with_confidence(0.5, "");
        assert!(corr.validate().is_err());

        let corr = Correspondence::new("a", "b", "ab").with_confidence(0.5, "");
        assert!(corr.validate().is_ok());
    }
}
