use std::path::Path;

use tracing::info;

use crate::domain::dataset::TabularDataset;
use crate::domain::error::{AppError, Result};
use crate::infrastructure::csv::CsvParser;
use crate::infrastructure::excel::XlsxParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Tsv,
    Spreadsheet,
}

impl FileKind {
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let extension = Path::new(file_name)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        match extension.as_str() {
            "csv" | "txt" => Some(FileKind::Csv),
            "tsv" => Some(FileKind::Tsv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(FileKind::Spreadsheet),
            _ => None,
        }
    }
}

/// Turns an uploaded file into a dataset.
#[derive(Default)]
pub struct IngestUseCase;

impl IngestUseCase {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, file_name: &str, bytes: Vec<u8>) -> Result<TabularDataset> {
        let file_name = file_name.trim();
        if file_name.is_empty() {
            return Err(AppError::ValidationError("fileName is required".to_string()));
        }
        if bytes.is_empty() {
            return Err(AppError::ValidationError(format!("{} is empty", file_name)));
        }

        let kind = FileKind::from_file_name(file_name).ok_or_else(|| {
            AppError::ValidationError(format!(
                "Unsupported file type: {} (expected CSV, TSV or Excel)",
                file_name
            ))
        })?;

        let dataset = match kind {
            FileKind::Csv => CsvParser::new().parse_bytes(file_name, &bytes)?,
            FileKind::Tsv => CsvParser::new()
                .with_delimiter(b'\t')
                .parse_bytes(file_name, &bytes)?,
            FileKind::Spreadsheet => XlsxParser::new().parse_bytes(file_name, bytes)?,
        };

        info!(
            file = %file_name,
            kind = ?kind,
            columns = dataset.columns.len(),
            rows = dataset.row_count,
            "Parsed upload"
        );

        Ok(dataset)
    }
}
