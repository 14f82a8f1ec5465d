/*
[INPUT]:  Optional network name and API base URL
[OUTPUT]: Network (endpoint URL + chain id) or UnsupportedNetwork errors
[POS]:    Network layer - static registry lookup
[UPDATE]: When adding networks or changing endpoint templates
*/

use serde::{Deserialize, Serialize};

use crate::http::{ProviderError, Result};

/// Base URL for Bitski-hosted JSON-RPC endpoints
pub const DEFAULT_API_BASE_URL: &str = "https://api.bitski.com/v1";

const MAINNET: &str = "mainnet";

/// (name, chain id) of every well-known network; the first entry is the default
const KNOWN_NETWORKS: &[(&str, u64)] = &[(MAINNET, 1), ("rinkeby", 4), ("kovan", 42)];

/// Connection configuration for one network
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Network {
    /// Registry name; `None` for ad-hoc endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub rpc_url: String,
    pub chain_id: u64,
}

impl Network {
    /// Ad-hoc network that bypasses the registry
    pub fn custom(rpc_url: impl Into<String>, chain_id: u64) -> Self {
        Self {
            name: None,
            rpc_url: rpc_url.into(),
            chain_id,
        }
    }

    /// Whether this network came from the registry
    pub fn is_registry_network(&self) -> bool {
        self.name.is_some()
    }

    /// Canonical key used to cache one pipeline per network
    pub fn key(&self) -> NetworkKey {
        match &self.name {
            Some(name) => NetworkKey::Named(name.clone()),
            None => NetworkKey::Custom {
                rpc_url: self.rpc_url.clone(),
                chain_id: self.chain_id,
            },
        }
    }
}

/// Cache key derived from a resolved network's identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NetworkKey {
    Named(String),
    Custom { rpc_url: String, chain_id: u64 },
}

impl std::fmt::Display for NetworkKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkKey::Named(name) => write!(f, "{name}"),
            NetworkKey::Custom { rpc_url, chain_id } => write!(f, "{rpc_url}#{chain_id}"),
        }
    }
}

/// Static table of well-known networks
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    api_base_url: String,
}

impl NetworkRegistry {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Resolve a network name; `None` resolves to mainnet
    pub fn resolve(&self, name: Option<&str>) -> Result<Network> {
        let name = name.unwrap_or(MAINNET);

        if let Some((known, chain_id)) = KNOWN_NETWORKS.iter().find(|(known, _)| *known == name) {
            return Ok(self.network(known, *chain_id));
        }

        if name.contains("://") {
            return Err(ProviderError::UnsupportedNetworkUrl {
                name: name.to_string(),
            });
        }

        Err(ProviderError::UnsupportedNetwork {
            name: name.to_string(),
        })
    }

    pub fn default_network(&self) -> Network {
        self.network(MAINNET, 1)
    }

    /// All registry networks in table order
    pub fn networks(&self) -> Vec<Network> {
        KNOWN_NETWORKS
            .iter()
            .map(|(name, chain_id)| self.network(name, *chain_id))
            .collect()
    }

    fn network(&self, name: &str, chain_id: u64) -> Network {
        Network {
            name: Some(name.to_string()),
            rpc_url: format!("{}/web3/{}", self.api_base_url, name),
            chain_id,
        }
    }
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}
