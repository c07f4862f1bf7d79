use std::time::Duration;

use super::{build_http_client, endpoint, LLMClient};
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::{LLMConfig, LLMProvider};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

/// Client for OpenAI-compatible chat completion APIs (OpenAI itself, and
/// local servers such as LM Studio or Ollama's `/v1` endpoint).
pub struct OpenAIClient {
    client: reqwest::Client,
}

impl OpenAIClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: build_http_client(timeout),
        }
    }

    fn authorize(
        request: reqwest::RequestBuilder,
        config: &LLMConfig,
    ) -> Result<reqwest::RequestBuilder> {
        match (&config.api_key, &config.provider) {
            (Some(key), _) if !key.trim().is_empty() => Ok(request.bearer_auth(key)),
            (_, LLMProvider::Local) => Ok(request),
            _ => Err(AppError::LLMError(
                "Missing API key for OpenAI provider".to_string(),
            )),
        }
    }
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn generate(&self, config: &LLMConfig, system: &str, user: &str) -> Result<String> {
        let url = endpoint(&config.base_url, "chat/completions");

        let body = json!({
            "model": config.model,
            "messages": [
                {
                    "role": "system",
                    "content": system
                },
                {
                    "role": "user",
                    "content": user
                }
            ],
            "max_tokens": config.max_tokens,
            "temperature": config.temperature,
        });

        debug!(url = %url, model = %config.model, "Sending chat completion request");

        let response = Self::authorize(self.client.post(&url), config)?
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LLMError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::LLMError(format!(
                "API error ({}): {}",
                status, text
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::LLMError(format!("Failed to parse JSON: {}", e)))?;

        json["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::LLMError("Invalid response format".to_string()))
    }

    async fn list_models(&self, config: &LLMConfig) -> Result<Vec<String>> {
        let url = endpoint(&config.base_url, "models");

        let response = Self::authorize(self.client.get(&url), config)?
            .send()
            .await
            .map_err(|e| AppError::LLMError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::LLMError(format!(
                "API error ({}): {}",
                status, text
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::LLMError(format!("Failed to parse JSON: {}", e)))?;

        let models = json["data"]
            .as_array()
            .ok_or_else(|| {
                AppError::LLMError("Invalid response format: missing data array".to_string())
            })?
            .iter()
            .filter_map(|m| m["id"].as_str())
            .map(|id| id.to_string())
            .collect();

        Ok(models)
    }
}
