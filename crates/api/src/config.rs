use std::time::Duration;

use aether_sonauto::api::DEFAULT_BASE_URL;
use aether_sonauto::orchestrator::{OrchestratorConfig, DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL};
use aether_sonauto::retry::RetryConfig;

/// Sonauto connection and lifecycle settings.
#[derive(Debug, Clone)]
pub struct SonautoSettings {
    /// API key; `None` leaves the service running but every generation
    /// fails with a configuration error.
    pub api_key: Option<String>,
    /// Base URL of the Sonauto API (default: `https://api.sonauto.ai`).
    pub base_url: String,
    /// Seconds between status polls (default: `3`).
    pub poll_interval_secs: u64,
    /// Maximum seconds spent polling one task (default: `600`).
    pub max_wait_secs: u64,
    /// Retries for transient poll/download failures (default: `3`).
    pub max_retries: u32,
}

impl SonautoSettings {
    /// Build the orchestrator configuration from these settings.
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            api_key: self.api_key.clone(),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            max_wait: Duration::from_secs(self.max_wait_secs),
            retry: RetryConfig {
                max_retries: self.max_retries,
                ..RetryConfig::default()
            },
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development except the
/// Sonauto API key.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3001`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`). Applies until the
    /// response head is sent, so open SSE streams are not cut off.
    pub request_timeout_secs: u64,
    /// Directory that holds saved media (default: `./media`).
    pub media_dir: String,
    pub sonauto: SonautoSettings,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                                                          |
    /// |------------------------------|------------------------------------------------------------------|
    /// | `HOST`                       | `0.0.0.0`                                                        |
    /// | `PORT`                       | `3001`                                                           |
    /// | `CORS_ORIGINS`               | `http://localhost:8080,http://localhost:5173,http://localhost:3000` |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                                                             |
    /// | `MEDIA_DIR`                  | `./media`                                                        |
    /// | `SONAUTO_API_KEY`            | none (legacy `SUNAOTO_API_KEY` also accepted)                    |
    /// | `SONAUTO_BASE_URL`           | `https://api.sonauto.ai`                                         |
    /// | `SONAUTO_POLL_INTERVAL_SECS` | `3`                                                              |
    /// | `SONAUTO_MAX_WAIT_SECS`      | `600`                                                            |
    /// | `SONAUTO_MAX_RETRIES`        | `3`                                                              |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3001".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| {
                "http://localhost:8080,http://localhost:5173,http://localhost:3000".into()
            })
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let media_dir = std::env::var("MEDIA_DIR").unwrap_or_else(|_| "./media".into());

        let api_key = std::env::var("SONAUTO_API_KEY")
            .or_else(|_| std::env::var("SUNAOTO_API_KEY"))
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let base_url =
            std::env::var("SONAUTO_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());

        let poll_interval_secs: u64 = std::env::var("SONAUTO_POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| DEFAULT_POLL_INTERVAL.as_secs().to_string())
            .parse()
            .expect("SONAUTO_POLL_INTERVAL_SECS must be a valid u64");

        let max_wait_secs: u64 = std::env::var("SONAUTO_MAX_WAIT_SECS")
            .unwrap_or_else(|_| DEFAULT_MAX_WAIT.as_secs().to_string())
            .parse()
            .expect("SONAUTO_MAX_WAIT_SECS must be a valid u64");

        let max_retries: u32 = std::env::var("SONAUTO_MAX_RETRIES")
            .unwrap_or_else(|_| RetryConfig::default().max_retries.to_string())
            .parse()
            .expect("SONAUTO_MAX_RETRIES must be a valid u32");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            media_dir,
            sonauto: SonautoSettings {
                api_key,
                base_url,
                poll_interval_secs,
                max_wait_secs,
                max_retries,
            },
        }
    }
}
