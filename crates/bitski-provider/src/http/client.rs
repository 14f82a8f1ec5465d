/*
[INPUT]:  HTTP configuration (timeouts)
[OUTPUT]: Configured reqwest client ready for JSON-RPC calls
[POS]:    HTTP layer - shared client construction
[UPDATE]: When adding connection options
*/

use std::time::Duration;

use reqwest::Client;

use crate::http::{ProviderError, Result};

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    pub fn build_client(&self) -> Result<Client> {
        let client = Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(|e| ProviderError::Config(format!("HTTP client: {e}")))?;
        Ok(client)
    }
}
