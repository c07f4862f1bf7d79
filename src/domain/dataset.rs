// ============================================================
// TABULAR DATASET TYPES
// ============================================================
// One parsed input file: ordered columns plus ordered records

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::domain::error::{AppError, Result};

/// A single scalar cell.
///
/// `Null` is the no-value marker: the row has nothing for this column,
/// either because the source never had it or because the row came from the
/// other file. A legitimately empty cell is `Text("")`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Infer a typed value from raw text, as read from a CSV cell.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Text(String::new());
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return CellValue::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return CellValue::Bool(false);
        }
        if let Some(number) = parse_number(trimmed) {
            return CellValue::Number(number);
        }
        CellValue::Text(raw.to_string())
    }

    pub fn from_f64(value: f64) -> Self {
        serde_json::Number::from_f64(value)
            .map(CellValue::Number)
            .unwrap_or(CellValue::Null)
    }
}

/// A number only when it renders back to exactly the same text, so IDs,
/// zip codes and formatted amounts (`02134`, `1.50`, 25-digit keys) stay text.
fn parse_number(text: &str) -> Option<serde_json::Number> {
    let number = if let Ok(int) = text.parse::<i64>() {
        serde_json::Number::from(int)
    } else if let Ok(int) = text.parse::<u64>() {
        serde_json::Number::from(int)
    } else {
        if !text.chars().any(|c| c.is_ascii_digit()) {
            return None;
        }
        text.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .and_then(serde_json::Number::from_f64)?
    };

    (number.to_string() == text).then_some(number)
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(value) => write!(f, "{}", value),
            CellValue::Number(value) => write!(f, "{}", value),
            CellValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(serde_json::Number::from(value))
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

/// Column name to value. Missing keys read as `CellValue::Null`.
pub type Record = HashMap<String, CellValue>;

static NULL_CELL: CellValue = CellValue::Null;

/// Read a field, treating a missing key as the no-value marker.
pub fn field<'a>(record: &'a Record, column: &str) -> &'a CellValue {
    record.get(column).unwrap_or(&NULL_CELL)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabularDataset {
    pub name: String,

    /// Ordered, unique column names
    #[serde(alias = "headers")]
    pub columns: Vec<String>,

    #[serde(default)]
    pub rows: Vec<Record>,

    /// Informational only; `rows.len()` is authoritative
    #[serde(default)]
    pub row_count: usize,
}

impl TabularDataset {
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Record>) -> Self {
        let row_count = rows.len();
        Self {
            name: name.into(),
            columns,
            rows,
            row_count,
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// First `limit` rows, used as oracle samples.
    pub fn sample_rows(&self, limit: usize) -> Vec<Record> {
        self.rows.iter().take(limit).cloned().collect()
    }

    /// Check the structural invariants: a non-blank name, unique column
    /// names and no record carrying a key outside `columns`.
    pub fn validate(&self, label: &str) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::ValidationError(format!("{} name is required", label)));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.as_str()) {
                return Err(AppError::ValidationError(format!(
                    "{} has duplicate column '{}'",
                    label, column
                )));
            }
        }

        for (index, row) in self.rows.iter().enumerate() {
            if let Some(unknown) = row.keys().find(|key| !seen.contains(key.as_str())) {
                return Err(AppError::ValidationError(format!(
                    "{} row {} has field '{}' which is not a declared column",
                    label,
                    index + 1,
                    unknown
                )));
            }
        }

        Ok(())
    }
}
