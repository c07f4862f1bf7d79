use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::error;

use crate::application::LlmMappingOracle;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::llm_clients::{LLMClient, RouterClient};
use crate::interfaces::http::{add_log, start_server, AppState, LogEntry};

/// Wires the LLM client, oracle and use cases together and serves the API
/// until the server stops.
pub async fn serve(config: AppConfig) -> std::io::Result<()> {
    let logs: Arc<Mutex<Vec<LogEntry>>> = Arc::new(Mutex::new(Vec::new()));

    let llm_client: Arc<dyn LLMClient + Send + Sync> = Arc::new(RouterClient::new(
        Duration::from_secs(config.llm.timeout_secs),
    ));
    let oracle = Arc::new(LlmMappingOracle::new(
        llm_client.clone(),
        config.llm.clone(),
    ));
    let app_state = Arc::new(AppState::new(&config, llm_client, oracle));

    add_log(
        &logs,
        "INFO",
        "Bootstrap",
        &format!(
            "Listening on http://{}:{} (provider={:?} model={})",
            config.server.host, config.server.port, config.llm.provider, config.llm.model
        ),
    );

    let server = start_server(app_state, logs, &config.server).map_err(|err| {
        error!(
            error = %err,
            host = %config.server.host,
            port = config.server.port,
            "Failed to start HTTP server"
        );
        err
    })?;

    server.await
}
