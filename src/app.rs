use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::infrastructure::config::AppConfig;

/// `RUST_LOG` wins over the configured filter when set.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub async fn run() -> std::io::Result<()> {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            init_tracing("info");
            error!(error = %err, "Failed to load configuration");
            return Err(std::io::Error::other(err));
        }
    };

    init_tracing(&config.log.filter);
    crate::infrastructure::bootstrap::serve(config).await
}
