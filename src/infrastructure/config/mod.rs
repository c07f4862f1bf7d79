use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;

pub const CONFIG_PATH_ENV: &str = "SHEETMERGE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "sheetmerge.toml";
const ENV_PREFIX: &str = "SHEETMERGE_";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LLMConfig,
    pub analysis: AnalysisConfig,
    pub export: ExportConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub json_limit_bytes: usize,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            json_limit_bytes: 32 * 1024 * 1024,
            max_upload_bytes: 32 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Sample rows per side forwarded to the mapping oracle
    pub sample_rows: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { sample_rows: 5 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    pub utf8_bom: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults, then the TOML file, then `SHEETMERGE_*` environment
    /// variables (`__` separates nested keys, e.g. `SHEETMERGE_LLM__MODEL`).
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::from_figment(Self::figment(path))
    }

    pub fn figment(path: PathBuf) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AppError::ConfigError("server.port must not be 0".to_string()));
        }
        if self.analysis.sample_rows > 50 {
            return Err(AppError::ConfigError(
                "analysis.sample_rows must be at most 50".to_string(),
            ));
        }
        if let Some(temperature) = self.llm.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(AppError::ConfigError(
                    "llm.temperature must be between 0 and 2".to_string(),
                ));
            }
        }
        if self.llm.base_url.trim().is_empty() {
            return Err(AppError::ConfigError("llm.base_url is required".to_string()));
        }
        Ok(())
    }
}
