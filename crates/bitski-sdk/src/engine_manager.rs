/*
[INPUT]:  Network identifier or provider options, token source, SDK settings
[OUTPUT]: Cached provider engines, one per distinct network
[POS]:    Engine layer - per-SDK-instance pipeline cache
[UPDATE]: When changing engine composition, cache keys, or stop semantics
*/

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use bitski_provider::{
    AccessTokenProvider, AuthenticatedTransport, ClientConfig, DEFAULT_POLLING_INTERVAL,
    FixtureStage, Network, NetworkKey, NetworkRegistry, ProviderEngine, RetryPolicy,
    TransportConfig,
};
use tracing::{debug, info};

use crate::error::Result;

/// Per-call provider settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderOptions {
    /// Registry network name; mainnet when neither this nor `network` is set
    pub network_name: Option<String>,
    /// Inline network, bypasses the registry and wins over `network_name`
    pub network: Option<Network>,
    pub polling_interval: Option<Duration>,
    pub web_base_url: Option<String>,
    /// Sent with every request; wins over SDK headers of the same name
    pub additional_headers: BTreeMap<String, String>,
    /// Header used to forward a request's origin
    pub origin_header_key: Option<String>,
}

impl ProviderOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            network_name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn custom(network: Network) -> Self {
        Self {
            network: Some(network),
            ..Self::default()
        }
    }

    pub fn with_polling_interval(mut self, polling_interval: Duration) -> Self {
        self.polling_interval = Some(polling_interval);
        self
    }

    pub fn with_web_base_url(mut self, web_base_url: impl Into<String>) -> Self {
        self.web_base_url = Some(web_base_url.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_origin_header_key(mut self, key: impl Into<String>) -> Self {
        self.origin_header_key = Some(key.into());
        self
    }
}

/// What `get_provider` was asked for
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ProviderIdentifier {
    #[default]
    Default,
    Name(String),
    Options(ProviderOptions),
}

impl From<&str> for ProviderIdentifier {
    fn from(name: &str) -> Self {
        ProviderIdentifier::Name(name.to_string())
    }
}

impl From<String> for ProviderIdentifier {
    fn from(name: String) -> Self {
        ProviderIdentifier::Name(name)
    }
}

impl From<Option<&str>> for ProviderIdentifier {
    fn from(name: Option<&str>) -> Self {
        name.map_or(ProviderIdentifier::Default, ProviderIdentifier::from)
    }
}

impl From<ProviderOptions> for ProviderIdentifier {
    fn from(options: ProviderOptions) -> Self {
        ProviderIdentifier::Options(options)
    }
}

impl From<Network> for ProviderIdentifier {
    fn from(network: Network) -> Self {
        ProviderIdentifier::Options(ProviderOptions::custom(network))
    }
}

impl ProviderIdentifier {
    fn into_options(self) -> ProviderOptions {
        match self {
            ProviderIdentifier::Default => ProviderOptions::default(),
            ProviderIdentifier::Name(name) => ProviderOptions::named(name),
            ProviderIdentifier::Options(options) => options,
        }
    }
}

/// SDK-wide settings applied to every engine the manager builds
#[derive(Debug, Clone)]
pub struct EngineManagerConfig {
    pub client_id: String,
    pub registry: NetworkRegistry,
    pub default_polling_interval: Duration,
    pub web_base_url: Option<String>,
    /// Sent on every engine; per-call options override by name
    pub additional_headers: BTreeMap<String, String>,
    pub retry: RetryPolicy,
    pub client: ClientConfig,
}

impl EngineManagerConfig {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            registry: NetworkRegistry::default(),
            default_polling_interval: DEFAULT_POLLING_INTERVAL,
            web_base_url: None,
            additional_headers: BTreeMap::new(),
            retry: RetryPolicy::default(),
            client: ClientConfig::default(),
        }
    }
}

/// Owns one provider engine per network key
pub struct ProviderEngineManager {
    config: EngineManagerConfig,
    token_provider: Arc<dyn AccessTokenProvider>,
    engines: Mutex<HashMap<NetworkKey, Arc<ProviderEngine>>>,
}

impl ProviderEngineManager {
    pub fn new(config: EngineManagerConfig, token_provider: Arc<dyn AccessTokenProvider>) -> Self {
        Self {
            config,
            token_provider,
            engines: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EngineManagerConfig {
        &self.config
    }

    /// Cached engine for the identified network, built and started on first use.
    ///
    /// Options on a cache hit are ignored.
    pub fn get_provider(&self, identifier: impl Into<ProviderIdentifier>) -> Result<Arc<ProviderEngine>> {
        let options = identifier.into().into_options();
        let network = match &options.network {
            // only registry lookups carry a name
            Some(network) => Network {
                name: None,
                ..network.clone()
            },
            None => self.config.registry.resolve(options.network_name.as_deref())?,
        };
        let key = network.key();

        let mut engines = self.engines.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(engine) = engines.get(&key) {
            debug!(key = %key, "provider cache hit");
            return Ok(engine.clone());
        }

        let engine = Arc::new(self.build_engine(network, &options)?);
        engine.start();
        engines.insert(key.clone(), engine.clone());
        info!(
            key = %key,
            rpc_url = %engine.network().rpc_url,
            polling_ms = engine.polling_interval().as_millis() as u64,
            "provider engine created"
        );
        Ok(engine)
    }

    /// Stop block polling on every cached engine; entries stay cached
    pub fn stop_all(&self) {
        let engines = self.engines.lock().unwrap_or_else(PoisonError::into_inner);
        for engine in engines.values() {
            engine.stop();
        }
        info!(count = engines.len(), "stopped all provider engines");
    }

    pub fn len(&self) -> usize {
        self.engines.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<NetworkKey> {
        let engines = self.engines.lock().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<NetworkKey> = engines.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn build_engine(&self, network: Network, options: &ProviderOptions) -> Result<ProviderEngine> {
        let mut headers = self.config.additional_headers.clone();
        headers.extend(options.additional_headers.clone());

        let mut transport_config = TransportConfig::new(network.rpc_url.clone())
            .with_additional_headers(headers)
            .with_retry(self.config.retry.clone());
        if network.is_registry_network() {
            transport_config = transport_config.with_client_id(self.config.client_id.clone());
        }
        if let Some(key) = &options.origin_header_key {
            transport_config = transport_config.with_origin_header_key(key.clone());
        }
        transport_config.client = self.config.client.clone();

        let mut rpc_headers = transport_config.client_headers.clone();
        rpc_headers.extend(transport_config.additional_headers.clone());

        let transport = AuthenticatedTransport::new(transport_config, self.token_provider.clone())?;

        Ok(ProviderEngine::builder(network.clone())
            .stage(Arc::new(FixtureStage::for_network(&network)))
            .stage(Arc::new(transport))
            .polling_interval(
                options
                    .polling_interval
                    .unwrap_or(self.config.default_polling_interval),
            )
            .rpc_headers(rpc_headers)
            .web_base_url(
                options
                    .web_base_url
                    .clone()
                    .or_else(|| self.config.web_base_url.clone()),
            )
            .build())
    }
}

impl std::fmt::Debug for ProviderEngineManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEngineManager")
            .field("client_id", &self.config.client_id)
            .field("engines", &self.keys())
            .finish()
    }
}
