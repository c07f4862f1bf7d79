use serde::{Deserialize, Serialize};

use super::dataset::Record;
use super::mapping::Correspondence;

/// The unified dataset produced by one merge request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedDataset {
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
    /// Correspondences the merge was run with
    #[serde(default)]
    pub mappings: Vec<Correspondence>,
    #[serde(default)]
    pub row_count: usize,
    #[serde(default)]
    pub file1_name: String,
    #[serde(default)]
    pub file2_name: String,
}

/// A rendered CSV download.
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub file_name: String,
    pub bytes: Vec<u8>,
}
