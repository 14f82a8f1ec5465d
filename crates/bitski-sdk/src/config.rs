/*
[INPUT]:  YAML configuration file
[OUTPUT]: Parsed SDK configuration
[POS]:    Configuration layer - SDK and CLI setup
[UPDATE]: When adding new configuration options
*/

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bitski_provider::http::DEFAULT_RETRY_DELAYS_MS;
use bitski_provider::{ClientConfig, DEFAULT_API_BASE_URL, DEFAULT_POLLING_INTERVAL, RetryPolicy};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SdkError};
use crate::session::DEFAULT_STORAGE_NAMESPACE;

/// Top-level SDK configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SdkConfig {
    /// Client identifier issued for the application
    pub client_id: String,
    /// Base URL of the JSON-RPC API; registry endpoints hang off it
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Base URL of the web wallet
    #[serde(default)]
    pub web_base_url: Option<String>,
    /// Prefix of persisted storage keys
    #[serde(default = "default_storage_namespace")]
    pub storage_namespace: String,
    /// Directory of the refresh-token store; platform data dir when unset
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
    /// Block polling interval for new provider engines
    #[serde(default = "default_polling_interval_ms")]
    pub polling_interval_ms: u64,
    /// Headers sent with every JSON-RPC request
    #[serde(default)]
    pub additional_headers: BTreeMap<String, String>,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Retry schedule configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Delays before attempts 2..=5
    #[serde(default = "default_retry_delays_ms")]
    pub delays_ms: Vec<u64>,
    #[serde(default = "default_jitter")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            delays_ms: default_retry_delays_ms(),
            jitter: default_jitter(),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_storage_namespace() -> String {
    DEFAULT_STORAGE_NAMESPACE.to_string()
}

fn default_polling_interval_ms() -> u64 {
    DEFAULT_POLLING_INTERVAL.as_millis() as u64
}

fn default_retry_delays_ms() -> Vec<u64> {
    DEFAULT_RETRY_DELAYS_MS.to_vec()
}

fn default_jitter() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl SdkConfig {
    /// Configuration with defaults for everything but the client id
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            api_base_url: default_api_base_url(),
            web_base_url: None,
            storage_namespace: default_storage_namespace(),
            storage_dir: None,
            polling_interval_ms: default_polling_interval_ms(),
            additional_headers: BTreeMap::new(),
            retry: RetryConfig::default(),
            http: HttpConfig::default(),
        }
    }

    /// Load configuration from YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(content).map_err(|e| SdkError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(SdkError::Config("client_id must not be empty".to_string()));
        }
        if self.polling_interval_ms == 0 {
            return Err(SdkError::Config(
                "polling_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.polling_interval_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(&self.retry.delays_ms, self.retry.jitter)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.http.timeout_secs),
            connect_timeout: Duration::from_secs(self.http.connect_timeout_secs),
        }
    }

    /// Refresh-token store directory
    pub fn resolved_storage_dir(&self) -> PathBuf {
        match &self.storage_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(DEFAULT_STORAGE_NAMESPACE),
        }
    }
}
