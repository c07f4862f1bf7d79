use csv::{QuoteStyle, WriterBuilder};

use crate::domain::dataset::field;
use crate::domain::error::{AppError, Result};
use crate::domain::merged::MergedDataset;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Renders a merged dataset as CSV. The no-value marker becomes an empty field.
#[derive(Debug, Default, Clone)]
pub struct CsvWriter {
    /// Prefix output with a UTF-8 byte order mark so Excel picks the
    /// right encoding
    utf8_bom: bool,
}

impl CsvWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bom(mut self, utf8_bom: bool) -> Self {
        self.utf8_bom = utf8_bom;
        self
    }

    pub fn write(&self, merged: &MergedDataset) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        if self.utf8_bom {
            buffer.extend_from_slice(UTF8_BOM);
        }

        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Necessary)
            .from_writer(buffer);

        writer.write_record(&merged.columns)?;
        for row in &merged.rows {
            writer.write_record(
                merged
                    .columns
                    .iter()
                    .map(|column| field(row, column).to_string()),
            )?;
        }

        writer
            .into_inner()
            .map_err(|e| AppError::Internal(format!("Failed to flush CSV output: {}", e)))
    }
}
