use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use crate::domain::dataset::{CellValue, Record, TabularDataset};
use crate::domain::error::{AppError, Result};
use crate::infrastructure::csv::normalize_headers;

/// Reads the first worksheet of an Excel or OpenDocument workbook.
#[derive(Debug, Default)]
pub struct XlsxParser;

impl XlsxParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_bytes(&self, name: &str, bytes: Vec<u8>) -> Result<TabularDataset> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| AppError::ParseError(format!("Failed to open workbook: {}", e)))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| AppError::ParseError("No worksheet found".to_string()))?
            .map_err(|e| AppError::ParseError(format!("Failed to read worksheet: {}", e)))?;

        let mut sheet_rows = range.rows().skip_while(|row| is_blank(row));

        let header_row = sheet_rows
            .next()
            .ok_or_else(|| AppError::ParseError(format!("{} has no header row", name)))?;
        let columns = normalize_headers(header_row.iter().map(header_text).collect());

        let rows: Vec<Record> = sheet_rows
            .filter(|row| !is_blank(row))
            .map(|row| {
                columns
                    .iter()
                    .zip(row.iter())
                    .map(|(column, cell)| (column.clone(), cell_value(cell)))
                    .collect()
            })
            .collect();

        Ok(TabularDataset::new(name, columns, rows))
    }
}

fn is_blank(row: &[Data]) -> bool {
    row.iter().all(|cell| match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    })
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Convert one cell. An empty cell is empty text, the same as an empty CSV
/// field; only the merge's fill for the other file's columns is null.
pub(crate) fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Text(String::new()),
        Data::Int(value) => CellValue::from(*value),
        Data::Float(value) => float_value(*value),
        Data::Bool(value) => CellValue::Bool(*value),
        Data::String(value) => CellValue::Text(value.clone()),
        other => CellValue::Text(other.to_string()),
    }
}

fn float_value(value: f64) -> CellValue {
    // Excel stores every number as a double; keep whole numbers integral.
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        CellValue::from(value as i64)
    } else {
        CellValue::from_f64(value)
    }
}
