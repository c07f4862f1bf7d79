use serde::Deserialize;

use crate::domain::error::{AppError, Result};
use crate::domain::mapping::{Correspondence, MappingSuggestion};

/// Lenient view of a model reply; models routinely omit fields or send
/// nulls, so nothing here is required.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSuggestion {
    #[serde(default)]
    mappings: Vec<RawMapping>,
    #[serde(default)]
    unmatched_columns1: Vec<String>,
    #[serde(default)]
    unmatched_columns2: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMapping {
    #[serde(default, alias = "columnFromA")]
    column1: Option<String>,
    #[serde(default, alias = "columnFromB")]
    column2: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default, alias = "rationale")]
    reason: Option<String>,
    #[serde(default)]
    merged_name: Option<String>,
}

pub(crate) fn parse_suggestion(payload: &str) -> Result<MappingSuggestion> {
    let raw: RawSuggestion = serde_json::from_str(payload).map_err(|err| {
        AppError::LLMError(format!(
            "Failed to parse mapping output: {} | output_snippet={}",
            err,
            preview_text(payload, 400)
        ))
    })?;

    let mappings = raw
        .mappings
        .into_iter()
        .filter_map(|m| {
            let column_a = m.column1?;
            let column_b = m.column2?;
            let merged_name = m
                .merged_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| column_a.clone());
            Some(Correspondence {
                column_a,
                column_b,
                confidence: clamp_confidence(m.confidence),
                reason: m.reason.unwrap_or_default(),
                merged_name: merged_name.trim().to_string(),
            })
        })
        .collect();

    Ok(MappingSuggestion {
        mappings,
        unmatched_columns1: raw.unmatched_columns1,
        unmatched_columns2: raw.unmatched_columns2,
    })
}

fn clamp_confidence(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v.clamp(0.0, 1.0),
        _ => 0.0,
    }
}

fn preview_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut preview: String = value.chars().take(max_chars).collect();
    preview.push_str("...");
    preview
}
