mod llm_output;
mod prompts;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::dataset::Record;
use crate::domain::error::Result;
use crate::domain::llm_config::LLMConfig;
use crate::domain::mapping::MappingSuggestion;
use crate::infrastructure::llm_clients::LLMClient;
use crate::infrastructure::response::{clean_llm_response, extract_json_payload};

use llm_output::parse_suggestion;
use prompts::{build_system_prompt, build_user_prompt};

/// Proposes column correspondences between two schemas.
///
/// Implementations are free to be non-deterministic; callers sanitise the
/// result against the real column lists before using it.
#[async_trait]
pub trait MappingOracle {
    async fn propose_mappings(
        &self,
        columns1: &[String],
        columns2: &[String],
        samples1: &[Record],
        samples2: &[Record],
    ) -> Result<MappingSuggestion>;
}

pub struct LlmMappingOracle {
    llm_client: Arc<dyn LLMClient + Send + Sync>,
    config: LLMConfig,
}

impl LlmMappingOracle {
    pub fn new(llm_client: Arc<dyn LLMClient + Send + Sync>, config: LLMConfig) -> Self {
        Self { llm_client, config }
    }
}

#[async_trait]
impl MappingOracle for LlmMappingOracle {
    async fn propose_mappings(
        &self,
        columns1: &[String],
        columns2: &[String],
        samples1: &[Record],
        samples2: &[Record],
    ) -> Result<MappingSuggestion> {
        let system_prompt = build_system_prompt();
        let user_prompt = build_user_prompt(columns1, columns2, samples1, samples2);

        let raw_output = self
            .llm_client
            .generate(&self.config, &system_prompt, &user_prompt)
            .await?;

        let cleaned = clean_llm_response(&raw_output);
        let payload = extract_json_payload(&cleaned);
        debug!(model = %self.config.model, bytes = payload.len(), "Received mapping proposal");

        parse_suggestion(&payload)
    }
}
