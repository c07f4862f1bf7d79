use std::sync::Arc;

use crate::application::use_cases::mapping_oracle::MappingOracle;
use crate::application::{AnalyzeUseCase, ExportUseCase, IngestUseCase, MergeUseCase};
use crate::domain::llm_config::LLMConfig;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::llm_clients::LLMClient;

/// Everything the handlers need, built once at startup.
pub struct AppState {
    pub analyze_use_case: AnalyzeUseCase,
    pub merge_use_case: Arc<MergeUseCase>,
    pub ingest_use_case: Arc<IngestUseCase>,
    pub export_use_case: ExportUseCase,
    pub llm_client: Arc<dyn LLMClient + Send + Sync>,
    pub llm_config: LLMConfig,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        llm_client: Arc<dyn LLMClient + Send + Sync>,
        oracle: Arc<dyn MappingOracle + Send + Sync>,
    ) -> Self {
        Self {
            analyze_use_case: AnalyzeUseCase::new(oracle, config.analysis.sample_rows),
            merge_use_case: Arc::new(MergeUseCase::new()),
            ingest_use_case: Arc::new(IngestUseCase::new()),
            export_use_case: ExportUseCase::new(config.export.utf8_bom),
            llm_client,
            llm_config: config.llm.clone(),
        }
    }
}
