// ============================================================
// CSV PARSER
// ============================================================
// Decode an uploaded CSV file and read it into a TabularDataset

use csv::{ReaderBuilder, Trim};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

use super::header::normalize_headers;
use crate::domain::dataset::{CellValue, Record, TabularDataset};
use crate::domain::error::{AppError, Result};

/// CSV parser with encoding and delimiter detection
pub struct CsvParser {
    /// Delimiter override; detected from content when unset
    delimiter: Option<u8>,

    /// Whether to trim whitespace from values
    trim: bool,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self {
            delimiter: None,
            trim: true,
        }
    }
}

impl CsvParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force a delimiter instead of detecting one
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Decode raw upload bytes and parse them.
    pub fn parse_bytes(&self, name: &str, bytes: &[u8]) -> Result<TabularDataset> {
        let content = decode_text(bytes);
        self.parse_content(name, &content)
    }

    /// Parse CSV text. The first non-blank record is the header row.
    pub fn parse_content(&self, name: &str, content: &str) -> Result<TabularDataset> {
        let delimiter = self
            .delimiter
            .unwrap_or_else(|| Self::detect_delimiter(content));

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .trim(if self.trim { Trim::All } else { Trim::None })
            .flexible(true) // Allow rows with different lengths
            .from_reader(content.as_bytes());

        let mut records = reader.records();

        let header_record = loop {
            match records.next() {
                Some(record) => {
                    let record = record.map_err(|e| {
                        AppError::ParseError(format!("Failed to read CSV headers: {}", e))
                    })?;
                    if !is_blank(&record) {
                        break record;
                    }
                }
                None => {
                    return Err(AppError::ParseError(format!(
                        "{} has no header row",
                        name
                    )))
                }
            }
        };

        let columns = normalize_headers(header_record.iter().map(str::to_string).collect());

        let mut rows = Vec::new();
        for (index, result) in records.enumerate() {
            let record = result.map_err(|e| {
                AppError::ParseError(format!("Failed to parse CSV row {}: {}", index + 1, e))
            })?;
            if is_blank(&record) {
                continue;
            }

            let row: Record = columns
                .iter()
                .zip(record.iter())
                .map(|(column, value)| (column.clone(), CellValue::infer(value)))
                .collect();
            rows.push(row);
        }

        Ok(TabularDataset::new(name, columns, rows))
    }

    /// Detect delimiter from content (comma, semicolon, tab, pipe)
    pub fn detect_delimiter(content: &str) -> u8 {
        let candidates = [b',', b';', b'\t', b'|'];
        let sample_lines: Vec<_> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .take(10)
            .collect();

        let mut best_delimiter = b',';
        let mut best_score = 0.0f32;

        if sample_lines.is_empty() {
            return best_delimiter;
        }

        for &delimiter in &candidates {
            let field_counts: Vec<usize> = sample_lines
                .iter()
                .map(|line| line.bytes().filter(|&b| b == delimiter).count())
                .collect();

            // Score by consistency (low standard deviation) and frequency
            let avg = field_counts.iter().sum::<usize>() as f32 / field_counts.len() as f32;
            let variance = field_counts
                .iter()
                .map(|&x| (x as f32 - avg).powi(2))
                .sum::<f32>()
                / field_counts.len() as f32;

            let score = avg / (1.0 + variance.sqrt());

            if score > best_score {
                best_score = score;
                best_delimiter = delimiter;
            }
        }

        best_delimiter
    }
}

fn is_blank(record: &csv::StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}

/// Decode upload bytes: honour a BOM if present, otherwise try UTF-8 and
/// fall back to Windows-1252, which is what spreadsheet tools on Windows
/// emit for "CSV".
pub fn decode_text(bytes: &[u8]) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return text.into_owned();
    }

    let (text, had_errors) = UTF_8.decode_without_bom_handling(bytes);
    if !had_errors {
        return text.into_owned();
    }

    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    text.into_owned()
}
