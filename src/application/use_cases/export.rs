use std::path::Path;

use tracing::info;

use crate::domain::error::Result;
use crate::domain::merged::{CsvExport, MergedDataset};
use crate::infrastructure::csv::CsvWriter;

pub struct ExportUseCase {
    writer: CsvWriter,
}

impl ExportUseCase {
    pub fn new(utf8_bom: bool) -> Self {
        Self {
            writer: CsvWriter::new().with_bom(utf8_bom),
        }
    }

    pub fn execute(&self, merged: &MergedDataset) -> Result<CsvExport> {
        let bytes = self.writer.write(merged)?;
        let file_name = export_file_name(&merged.file1_name, &merged.file2_name);

        info!(
            file = %file_name,
            rows = merged.rows.len(),
            bytes = bytes.len(),
            "Exported merged dataset"
        );

        Ok(CsvExport { file_name, bytes })
    }
}

/// `merged_<stem1>_<stem2>.csv`, restricted to characters that are safe in
/// a Content-Disposition header.
pub fn export_file_name(file1: &str, file2: &str) -> String {
    let parts: Vec<String> = [file1, file2]
        .iter()
        .map(|name| sanitize_stem(name))
        .filter(|stem| !stem.is_empty())
        .collect();

    if parts.is_empty() {
        "merged.csv".to_string()
    } else {
        format!("merged_{}.csv", parts.join("_"))
    }
}

fn sanitize_stem(name: &str) -> String {
    let stem = Path::new(name.trim())
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    stem.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}
