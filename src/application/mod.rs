pub mod use_cases;

pub use use_cases::analyze::{AnalyzeRequest, AnalyzeUseCase};
pub use use_cases::export::ExportUseCase;
pub use use_cases::ingest::IngestUseCase;
pub use use_cases::mapping_oracle::{LlmMappingOracle, MappingOracle};
pub use use_cases::merge::{MergeRequest, MergeUseCase};
