/*
[INPUT]:  Client id, session manager, SDK options or YAML config
[OUTPUT]: Bitski facade over engines, session and connect button
[POS]:    Public API - entry point for embedding applications
[UPDATE]: When the public surface changes
*/

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use bitski_provider::{
    ClientConfig, DEFAULT_API_BASE_URL, DEFAULT_POLLING_INTERVAL, NetworkRegistry, ProviderEngine,
    RetryPolicy,
};
use tokio::sync::watch;
use tracing::info;

use crate::config::SdkConfig;
use crate::connect_button::{ConnectButton, ConnectButtonOptions, ConnectCallback};
use crate::engine_manager::{EngineManagerConfig, ProviderEngineManager, ProviderIdentifier};
use crate::error::Result;
use crate::session::{
    AuthSessionController, AuthenticationStatus, DEFAULT_STORAGE_NAMESPACE, FileStore,
    MemoryStore, SessionManager, SessionTokenSource, SignOutHandler, TokenStore, User,
    refresh_token_key,
};

/// Construction options for [`Bitski`]
#[derive(Clone)]
pub struct BitskiOptions {
    pub api_base_url: String,
    pub web_base_url: Option<String>,
    pub storage_namespace: String,
    pub polling_interval: Duration,
    pub additional_headers: BTreeMap<String, String>,
    pub retry: RetryPolicy,
    pub client: ClientConfig,
    /// Refresh-token backend; in-memory unless set
    pub store: Arc<dyn TokenStore>,
}

impl Default for BitskiOptions {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            web_base_url: None,
            storage_namespace: DEFAULT_STORAGE_NAMESPACE.to_string(),
            polling_interval: DEFAULT_POLLING_INTERVAL,
            additional_headers: BTreeMap::new(),
            retry: RetryPolicy::default(),
            client: ClientConfig::default(),
            store: Arc::new(MemoryStore::new()),
        }
    }
}

impl BitskiOptions {
    pub fn with_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl std::fmt::Debug for BitskiOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitskiOptions")
            .field("api_base_url", &self.api_base_url)
            .field("web_base_url", &self.web_base_url)
            .field("storage_namespace", &self.storage_namespace)
            .field("polling_interval", &self.polling_interval)
            .field("retry", &self.retry)
            .finish()
    }
}

/// SDK instance: one engine cache and one session controller
#[derive(Debug)]
pub struct Bitski {
    client_id: String,
    engines: Arc<ProviderEngineManager>,
    auth: Arc<AuthSessionController>,
}

impl Bitski {
    pub fn new(
        client_id: impl Into<String>,
        session: Arc<dyn SessionManager>,
        options: BitskiOptions,
    ) -> Self {
        let client_id = client_id.into();

        let engine_config = EngineManagerConfig {
            client_id: client_id.clone(),
            registry: NetworkRegistry::new(options.api_base_url),
            default_polling_interval: options.polling_interval,
            web_base_url: options.web_base_url,
            additional_headers: options.additional_headers,
            retry: options.retry,
            client: options.client,
        };
        let token_source = Arc::new(SessionTokenSource::new(session.clone()));
        let engines = Arc::new(ProviderEngineManager::new(engine_config, token_source));

        let auth = Arc::new(AuthSessionController::new(
            session,
            engines.clone(),
            options.store,
            refresh_token_key(&options.storage_namespace, &client_id),
        ));

        info!(client_id = %client_id, "bitski sdk initialized");
        Self {
            client_id,
            engines,
            auth,
        }
    }

    /// Build from YAML config with a file-backed refresh-token store
    pub fn from_config(config: &SdkConfig, session: Arc<dyn SessionManager>) -> Result<Self> {
        config.validate()?;
        let options = BitskiOptions {
            api_base_url: config.api_base_url.clone(),
            web_base_url: config.web_base_url.clone(),
            storage_namespace: config.storage_namespace.clone(),
            polling_interval: config.polling_interval(),
            additional_headers: config.additional_headers.clone(),
            retry: config.retry_policy(),
            client: config.client_config(),
            store: Arc::new(FileStore::new(config.resolved_storage_dir())),
        };
        Ok(Self::new(config.client_id.clone(), session, options))
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn get_provider(&self, identifier: impl Into<ProviderIdentifier>) -> Result<Arc<ProviderEngine>> {
        self.engines.get_provider(identifier)
    }

    /// Mainnet engine
    pub fn get_default_provider(&self) -> Result<Arc<ProviderEngine>> {
        self.engines.get_provider(ProviderIdentifier::Default)
    }

    pub async fn start(&self) -> Result<User> {
        self.auth.start().await
    }

    pub async fn sign_in(&self) -> Result<User> {
        self.auth.sign_in().await
    }

    pub fn sign_in_redirect(&self) {
        self.auth.sign_in_redirect();
    }

    pub async fn connect(&self) -> Result<User> {
        self.auth.connect().await
    }

    pub async fn get_user(&self) -> Result<User> {
        self.auth.get_user().await
    }

    pub fn get_auth_status(&self) -> AuthenticationStatus {
        self.auth.get_auth_status()
    }

    pub fn subscribe_auth_status(&self) -> watch::Receiver<AuthenticationStatus> {
        self.auth.subscribe_auth_status()
    }

    pub async fn redirect_callback(&self) -> Result<User> {
        self.auth.redirect_callback().await
    }

    pub fn add_sign_out_handler(&self, handler: SignOutHandler) {
        self.auth.add_sign_out_handler(handler);
    }

    pub fn remove_sign_out_handler(&self, handler: &SignOutHandler) {
        self.auth.remove_sign_out_handler(handler);
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.auth.sign_out().await
    }

    pub fn get_connect_button(
        &self,
        host: Option<String>,
        callback: Option<ConnectCallback>,
    ) -> ConnectButton {
        ConnectButton::new(
            self.auth.clone(),
            host,
            ConnectButtonOptions::default(),
            callback,
        )
    }

    pub fn engines(&self) -> &ProviderEngineManager {
        &self.engines
    }

    pub fn auth(&self) -> &AuthSessionController {
        &self.auth
    }
}
