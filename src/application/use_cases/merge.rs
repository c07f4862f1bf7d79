use serde::Deserialize;
use tracing::info;

use crate::application::use_cases::merge_engine::{merge, validate_correspondences};
use crate::domain::dataset::TabularDataset;
use crate::domain::error::{AppError, Result};
use crate::domain::mapping::Correspondence;
use crate::domain::merged::MergedDataset;

/// Merge payload as it arrives over the wire. Every field is optional so a
/// missing piece gets a specific message instead of a generic decode error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    #[serde(default)]
    pub file1: Option<TabularDataset>,
    #[serde(default)]
    pub file2: Option<TabularDataset>,
    #[serde(default)]
    pub mappings: Option<serde_json::Value>,
}

pub struct MergeUseCase;

impl MergeUseCase {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(&self, request: MergeRequest) -> Result<MergedDataset> {
        let file1 = request
            .file1
            .ok_or_else(|| AppError::ValidationError("file1 is required".to_string()))?;
        let file2 = request
            .file2
            .ok_or_else(|| AppError::ValidationError("file2 is required".to_string()))?;
        let mappings = parse_mappings(request.mappings)?;

        file1.validate("file1")?;
        file2.validate("file2")?;
        validate_correspondences(&file1, &file2, &mappings)?;

        let merged = merge(&file1, &file2, &mappings);

        info!(
            file1 = %file1.name,
            file2 = %file2.name,
            mappings = mappings.len(),
            columns = merged.columns.len(),
            rows = merged.row_count,
            "Merged datasets"
        );

        Ok(merged)
    }
}

impl Default for MergeUseCase {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_mappings(value: Option<serde_json::Value>) -> Result<Vec<Correspondence>> {
    match value {
        Some(value @ serde_json::Value::Array(_)) => serde_json::from_value(value)
            .map_err(|err| AppError::ValidationError(format!("mappings are malformed: {}", err))),
        Some(_) => Err(AppError::ValidationError(
            "mappings must be an array".to_string(),
        )),
        None => Err(AppError::ValidationError("mappings is required".to_string())),
    }
}
