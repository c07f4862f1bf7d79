// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// CSV parsing with encoding/delimiter detection, and CSV export

mod csv_parser;
mod csv_writer;
mod header;

pub use csv_parser::{decode_text, CsvParser};
pub use csv_writer::CsvWriter;
pub use header::normalize_headers;
