use serde::Deserialize;
use std::time::Duration;

use crate::client::RetryPolicy;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL database connection URL. The in-memory store is used when unset.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Redis connection URL. Caching is disabled when unset.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// JSON seed file loaded into the in-memory store
    #[serde(default)]
    pub seed_file: Option<String>,

    /// Secret used to sign session tokens
    pub jwt_secret: String,

    /// Session token lifetime in seconds
    #[serde(default = "default_jwt_ttl_secs")]
    pub jwt_ttl_secs: u64,

    /// Base URL of the ML recommendation service
    #[serde(default)]
    pub ml_service_url: Option<String>,

    /// Health check path on the ML service
    #[serde(default = "default_ml_health_path")]
    pub ml_health_path: String,

    /// Hard timeout for the ML health check
    #[serde(default = "default_ml_health_timeout_secs")]
    pub ml_health_timeout_secs: u64,

    /// Number of recommendations requested from the ML service
    #[serde(default = "default_ml_top_k")]
    pub ml_top_k: usize,

    /// Number of recipes shown per personalized list
    #[serde(default = "default_display_count")]
    pub display_count: usize,

    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,

    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_jwt_ttl_secs() -> u64 {
    86_400
}

fn default_ml_health_path() -> String {
    "/health".to_string()
}

fn default_ml_health_timeout_secs() -> u64 {
    5
}

fn default_ml_top_k() -> usize {
    10
}

fn default_display_count() -> usize {
    5
}

fn default_retry_max_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    200
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Client settings used by the server-side home feed
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            ml_service_url: self.ml_service_url.clone().unwrap_or_default(),
            ml_health_path: self.ml_health_path.clone(),
            ml_health_timeout_secs: self.ml_health_timeout_secs,
            ml_top_k: self.ml_top_k,
            display_count: self.display_count,
            retry_max_attempts: self.retry_max_attempts,
            retry_base_delay_ms: self.retry_base_delay_ms,
        }
    }
}

/// Settings for the recommendation client and the personalized feed
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub ml_service_url: String,
    pub ml_health_path: String,
    pub ml_health_timeout_secs: u64,
    pub ml_top_k: usize,
    pub display_count: usize,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ml_service_url: String::new(),
            ml_health_path: default_ml_health_path(),
            ml_health_timeout_secs: default_ml_health_timeout_secs(),
            ml_top_k: default_ml_top_k(),
            display_count: default_display_count(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

impl ClientConfig {
    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.ml_health_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::exponential(
            self.retry_max_attempts,
            Duration::from_millis(self.retry_base_delay_ms),
        )
    }
}
