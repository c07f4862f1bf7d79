// ============================================================
// MERGE ENGINE
// ============================================================
// Reshape two datasets into one: rename mapped columns, union the
// rest, fill the other side's columns with the no-value marker.

use std::collections::{HashMap, HashSet};

use validator::Validate;

use crate::domain::dataset::{field, CellValue, Record, TabularDataset};
use crate::domain::error::{AppError, Result};
use crate::domain::mapping::Correspondence;
use crate::domain::merged::MergedDataset;

/// Merge `a` and `b` using the accepted correspondences.
///
/// Pure and infallible. Callers are expected to run
/// [`validate_correspondences`] first; if they don't, a colliding merged
/// name keeps its first column position and the last write wins per row.
pub fn merge(
    a: &TabularDataset,
    b: &TabularDataset,
    correspondences: &[Correspondence],
) -> MergedDataset {
    let used_a: HashSet<&str> = correspondences.iter().map(|c| c.column_a.as_str()).collect();
    let used_b: HashSet<&str> = correspondences.iter().map(|c| c.column_b.as_str()).collect();

    let unmapped_a: Vec<&str> = a
        .columns
        .iter()
        .map(String::as_str)
        .filter(|c| !used_a.contains(c))
        .collect();
    let unmapped_b: Vec<&str> = b
        .columns
        .iter()
        .map(String::as_str)
        .filter(|c| !used_b.contains(c))
        .collect();

    let columns = ordered_columns(&unmapped_a, correspondences, &unmapped_b);

    let mut rows = Vec::with_capacity(a.rows.len() + b.rows.len());

    for row in &a.rows {
        let mut merged = Record::with_capacity(columns.len());
        for column in &unmapped_a {
            merged.insert(column.to_string(), field(row, column).clone());
        }
        for corr in correspondences {
            merged.insert(corr.merged_name.clone(), field(row, &corr.column_a).clone());
        }
        for column in &unmapped_b {
            merged.insert(column.to_string(), CellValue::Null);
        }
        rows.push(merged);
    }

    for row in &b.rows {
        let mut merged = Record::with_capacity(columns.len());
        for column in &unmapped_a {
            merged.insert(column.to_string(), CellValue::Null);
        }
        for corr in correspondences {
            merged.insert(corr.merged_name.clone(), field(row, &corr.column_b).clone());
        }
        for column in &unmapped_b {
            merged.insert(column.to_string(), field(row, column).clone());
        }
        rows.push(merged);
    }

    MergedDataset {
        row_count: rows.len(),
        columns,
        rows,
        mappings: correspondences.to_vec(),
        file1_name: a.name.clone(),
        file2_name: b.name.clone(),
    }
}

fn ordered_columns(
    unmapped_a: &[&str],
    correspondences: &[Correspondence],
    unmapped_b: &[&str],
) -> Vec<String> {
    let mut seen = HashSet::new();
    unmapped_a
        .iter()
        .copied()
        .chain(correspondences.iter().map(|c| c.merged_name.as_str()))
        .chain(unmapped_b.iter().copied())
        .filter(|column| seen.insert(*column))
        .map(str::to_string)
        .collect()
}

/// Reject correspondence sets the engine would handle silently: unknown
/// source columns, a source column consumed twice, merged names that
/// collide with each other or with an unmapped column, and a column name
/// left unmapped in both files (B's null fill would erase A's values).
pub fn validate_correspondences(
    a: &TabularDataset,
    b: &TabularDataset,
    correspondences: &[Correspondence],
) -> Result<()> {
    let mut used_a: HashSet<&str> = HashSet::new();
    let mut used_b: HashSet<&str> = HashSet::new();
    let mut merged_names: HashMap<&str, usize> = HashMap::new();

    for (index, corr) in correspondences.iter().enumerate() {
        let position = index + 1;

        corr.validate().map_err(|err| {
            AppError::ValidationError(format!("Mapping {} is invalid: {}", position, err))
        })?;

        if corr.merged_name.trim().is_empty() {
            return Err(AppError::ValidationError(format!(
                "Mapping {} has an empty merged name",
                position
            )));
        }
        if !a.has_column(&corr.column_a) {
            return Err(AppError::ValidationError(format!(
                "Mapping {} references column '{}' which does not exist in {}",
                position, corr.column_a, a.name
            )));
        }
        if !b.has_column(&corr.column_b) {
            return Err(AppError::ValidationError(format!(
                "Mapping {} references column '{}' which does not exist in {}",
                position, corr.column_b, b.name
            )));
        }
        if !used_a.insert(corr.column_a.as_str()) {
            return Err(AppError::ValidationError(format!(
                "Column '{}' from {} is mapped more than once",
                corr.column_a, a.name
            )));
        }
        if !used_b.insert(corr.column_b.as_str()) {
            return Err(AppError::ValidationError(format!(
                "Column '{}' from {} is mapped more than once",
                corr.column_b, b.name
            )));
        }
        if let Some(first) = merged_names.insert(corr.merged_name.as_str(), position) {
            return Err(AppError::ValidationError(format!(
                "Mappings {} and {} both produce column '{}'",
                first, position, corr.merged_name
            )));
        }
    }

    let unmapped_b: HashSet<&str> = b
        .columns
        .iter()
        .map(String::as_str)
        .filter(|c| !used_b.contains(c))
        .collect();
    if let Some(shared) = a
        .columns
        .iter()
        .find(|c| !used_a.contains(c.as_str()) && unmapped_b.contains(c.as_str()))
    {
        return Err(AppError::ValidationError(format!(
            "Column '{}' exists in both {} and {} but is not mapped; add a mapping for it",
            shared, a.name, b.name
        )));
    }

    let unmapped = a
        .columns
        .iter()
        .filter(|c| !used_a.contains(c.as_str()))
        .map(|c| (c, &a.name))
        .chain(
            b.columns
                .iter()
                .filter(|c| !used_b.contains(c.as_str()))
                .map(|c| (c, &b.name)),
        );
    for (column, source) in unmapped {
        if let Some(position) = merged_names.get(column.as_str()) {
            return Err(AppError::ValidationError(format!(
                "Mapping {} produces column '{}' which collides with an unmapped column from {}",
                position, column, source
            )));
        }
    }

    Ok(())
}
