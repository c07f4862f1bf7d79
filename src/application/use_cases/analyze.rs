use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use crate::application::use_cases::mapping_oracle::MappingOracle;
use crate::domain::dataset::Record;
use crate::domain::error::{AppError, Result};
use crate::domain::mapping::{Correspondence, MappingSuggestion};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub columns1: Option<Vec<String>>,
    #[serde(default)]
    pub columns2: Option<Vec<String>>,
    #[serde(default)]
    pub sample_data1: Vec<Record>,
    #[serde(default)]
    pub sample_data2: Vec<Record>,
}

pub struct AnalyzeUseCase {
    oracle: Arc<dyn MappingOracle + Send + Sync>,
    sample_rows: usize,
}

impl AnalyzeUseCase {
    pub fn new(oracle: Arc<dyn MappingOracle + Send + Sync>, sample_rows: usize) -> Self {
        Self {
            oracle,
            sample_rows,
        }
    }

    pub async fn execute(&self, request: AnalyzeRequest) -> Result<MappingSuggestion> {
        let columns1 = require_columns(request.columns1, "columns1")?;
        let columns2 = require_columns(request.columns2, "columns2")?;

        let samples1: Vec<Record> = request.sample_data1.into_iter().take(self.sample_rows).collect();
        let samples2: Vec<Record> = request.sample_data2.into_iter().take(self.sample_rows).collect();

        info!(
            columns1 = columns1.len(),
            columns2 = columns2.len(),
            samples1 = samples1.len(),
            samples2 = samples2.len(),
            "Requesting column mappings"
        );

        let proposed = self
            .oracle
            .propose_mappings(&columns1, &columns2, &samples1, &samples2)
            .await?;

        let suggestion = sanitize_suggestion(proposed, &columns1, &columns2);

        info!(
            mappings = suggestion.mappings.len(),
            unmatched1 = suggestion.unmatched_columns1.len(),
            unmatched2 = suggestion.unmatched_columns2.len(),
            "Column mappings proposed"
        );

        Ok(suggestion)
    }
}

fn require_columns(columns: Option<Vec<String>>, field: &str) -> Result<Vec<String>> {
    match columns {
        Some(columns) if !columns.is_empty() => Ok(columns),
        Some(_) => Err(AppError::ValidationError(format!("{} must not be empty", field))),
        None => Err(AppError::ValidationError(format!("{} is required", field))),
    }
}

/// Drop proposals that reference unknown columns or reuse a source column,
/// then recompute the unmatched lists from what survived so the three
/// lists always partition both schemas.
pub fn sanitize_suggestion(
    suggestion: MappingSuggestion,
    columns1: &[String],
    columns2: &[String],
) -> MappingSuggestion {
    let known1: HashSet<&str> = columns1.iter().map(String::as_str).collect();
    let known2: HashSet<&str> = columns2.iter().map(String::as_str).collect();
    let mut used1: HashSet<String> = HashSet::new();
    let mut used2: HashSet<String> = HashSet::new();

    let mut mappings: Vec<Correspondence> = Vec::with_capacity(suggestion.mappings.len());
    for mut corr in suggestion.mappings {
        if !known1.contains(corr.column_a.as_str()) || !known2.contains(corr.column_b.as_str()) {
            warn!(
                column1 = %corr.column_a,
                column2 = %corr.column_b,
                "Dropping proposed mapping with unknown column"
            );
            continue;
        }
        if used1.contains(&corr.column_a) || used2.contains(&corr.column_b) {
            warn!(
                column1 = %corr.column_a,
                column2 = %corr.column_b,
                "Dropping proposed mapping that reuses a column"
            );
            continue;
        }

        corr.confidence = if corr.confidence.is_finite() {
            corr.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if corr.merged_name.trim().is_empty() {
            corr.merged_name = corr.column_a.clone();
        }

        used1.insert(corr.column_a.clone());
        used2.insert(corr.column_b.clone());
        mappings.push(corr);
    }

    MappingSuggestion {
        unmatched_columns1: columns1
            .iter()
            .filter(|c| !used1.contains(*c))
            .cloned()
            .collect(),
        unmatched_columns2: columns2
            .iter()
            .filter(|c| !used2.contains(*c))
            .cloned()
            .collect(),
        mappings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubOracle {
        suggestion: MappingSuggestion,
        seen_samples: Mutex<Option<(usize, usize)>>,
    }

    #[async_trait]
    impl MappingOracle for StubOracle {
        async fn propose_mappings(
            &self,
            _columns1: &[String],
            _columns2: &[String],
            samples1: &[Record],
            samples2: &[Record],
        ) -> Result<MappingSuggestion> {
            *self.seen_samples.lock().unwrap() = Some((samples1.len(), samples2.len()));
            Ok(self.suggestion.clone())
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_missing_column_list_is_rejected() {
        let oracle = Arc::new(StubOracle {
            suggestion: MappingSuggestion::default(),
            seen_samples: Mutex::new(None),
        });
        let use_case = AnalyzeUseCase::new(oracle.clone(), 5);

        let err = use_case
            .execute(AnalyzeRequest {
                columns1: Some(strings(&["a"])),
                columns2: None,
                sample_data1: vec![],
                sample_data2: vec![],
            })
            .await
            .unwrap_err();

        assert!(err.is_client_error());
        assert!(err.to_string().contains("columns2 is required"));
        assert!(oracle.seen_samples.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_samples_are_trimmed() {
        let oracle = Arc::new(StubOracle {
            suggestion: MappingSuggestion::default(),
            seen_samples: Mutex::new(None),
        });
        let use_case = AnalyzeUseCase::new(oracle.clone(), 2);

        let suggestion = use_case
            .execute(AnalyzeRequest {
                columns1: Some(strings(&["a"])),
                columns2: Some(strings(&["b"])),
                sample_data1: vec![Record::new(); 4],
                sample_data2: vec![Record::new(); 1],
            })
            .await
            .unwrap();

        assert_eq!(*oracle.seen_samples.lock().unwrap(), Some((2, 1)));
        assert_eq!(suggestion.unmatched_columns1, strings(&["a"]));
        assert_eq!(suggestion.unmatched_columns2, strings(&["b"]));
    }

    #[test]
    fn test_sanitize_drops_unknown_and_reused_columns() {
        let proposed = MappingSuggestion {
            mappings: vec![
                Correspondence::new("email", "e-mail", "email").with_confidence(1.7, "synonym"),
                Correspondence::new("ghost", "age", "ghost"),
                Correspondence::new("name", "e-mail", "name"),
                Correspondence::new("name", "age", ""),
            ],
            unmatched_columns1: strings(&["bogus"]),
            unmatched_columns2: vec![],
        };

        let clean = sanitize_suggestion(
            proposed,
            &strings(&["email", "name", "phone"]),
            &strings(&["e-mail", "age"]),
        );

        assert_eq!(clean.mappings.len(), 2);
        assert_eq!(clean.mappings[0].confidence, 1.0);
        assert_eq!(clean.mappings[1].column_a, "name");
        assert_eq!(clean.mappings[1].column_b, "age");
        assert_eq!(clean.mappings[1].merged_name, "name");
        assert_eq!(clean.unmatched_columns1, strings(&["phone"]));
        assert!(clean.unmatched_columns2.is_empty());
    }
}
