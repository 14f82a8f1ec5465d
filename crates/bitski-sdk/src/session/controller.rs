/*
[INPUT]:  Session manager, refresh-token store, provider engine manager
[OUTPUT]: Sign-in/connect/sign-out orchestration and sign-out handlers
[POS]:    Session layer - ties engine lifecycle to authentication state
[UPDATE]: When changing sign-in flows or sign-out ordering
*/

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use bitski_provider::{AccessTokenProvider, ProviderError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::engine_manager::ProviderEngineManager;
use crate::error::{Result, SdkError};
use crate::session::{AuthenticationStatus, SessionManager, SignInMethod, TokenStore, User};

/// Callback run once per sign-out
pub type SignOutHandler = Arc<dyn Fn() + Send + Sync>;

/// Drives the session manager and stops engines on sign-out
pub struct AuthSessionController {
    session: Arc<dyn SessionManager>,
    engines: Arc<ProviderEngineManager>,
    store: Arc<dyn TokenStore>,
    refresh_token_key: String,
    sign_out_handlers: Mutex<Vec<SignOutHandler>>,
    status: Arc<watch::Sender<AuthenticationStatus>>,
}

impl AuthSessionController {
    pub fn new(
        session: Arc<dyn SessionManager>,
        engines: Arc<ProviderEngineManager>,
        store: Arc<dyn TokenStore>,
        refresh_token_key: impl Into<String>,
    ) -> Self {
        let (status, _) = watch::channel(session.auth_status());
        Self {
            session,
            engines,
            store,
            refresh_token_key: refresh_token_key.into(),
            sign_out_handlers: Mutex::new(Vec::new()),
            status: Arc::new(status),
        }
    }

    pub fn refresh_token_key(&self) -> &str {
        &self.refresh_token_key
    }

    /// Sign in silently when possible, interactively otherwise
    pub async fn start(&self) -> Result<User> {
        self.track(self.session.sign_in_or_connect()).await
    }

    /// Interactive popup sign-in
    pub async fn sign_in(&self) -> Result<User> {
        self.track(self.session.sign_in(SignInMethod::Popup)).await
    }

    /// Start a redirect sign-in without waiting for it.
    ///
    /// The outcome is observed through [`Self::redirect_callback`].
    pub fn sign_in_redirect(&self) {
        if tokio::runtime::Handle::try_current().is_err() {
            warn!("sign_in_redirect called without Tokio runtime; ignored");
            return;
        }

        self.status.send_replace(AuthenticationStatus::Connecting);
        let session = self.session.clone();
        let status = self.status.clone();
        tokio::spawn(async move {
            if let Err(err) = session.sign_in(SignInMethod::Redirect).await {
                warn!(error = %err, "redirect sign-in failed");
                status.send_replace(session.auth_status());
            }
        });
    }

    /// Finish a redirect sign-in
    pub async fn redirect_callback(&self) -> Result<User> {
        self.track(self.session.redirect_callback()).await
    }

    /// Silent reauthentication from the persisted refresh token
    pub async fn connect(&self) -> Result<User> {
        self.track(async {
            let refresh_token = self
                .store
                .get(&self.refresh_token_key)
                .await?
                .ok_or_else(|| SdkError::NoRefreshToken {
                    key: self.refresh_token_key.clone(),
                })?;
            self.session.refresh_access_token(&refresh_token).await?;
            self.session.load_user().await
        })
        .await
    }

    pub async fn get_user(&self) -> Result<User> {
        self.session.get_user().await
    }

    pub fn get_auth_status(&self) -> AuthenticationStatus {
        self.session.auth_status()
    }

    /// Status published at each sign-in, connect and sign-out step
    pub fn subscribe_auth_status(&self) -> watch::Receiver<AuthenticationStatus> {
        self.status.subscribe()
    }

    /// End the session, stop every engine, then run sign-out handlers in
    /// registration order.
    ///
    /// If the session manager refuses, engines and handlers are left alone.
    pub async fn sign_out(&self) -> Result<()> {
        self.session.request_sign_out().await?;
        self.engines.stop_all();

        let handlers = self
            .sign_out_handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for handler in &handlers {
            handler();
        }

        self.status.send_replace(AuthenticationStatus::NotConnected);
        info!(handlers = handlers.len(), "signed out");
        Ok(())
    }

    pub fn add_sign_out_handler(&self, handler: SignOutHandler) {
        self.sign_out_handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handler);
    }

    /// Remove the first registration of `handler`; no-op when absent
    pub fn remove_sign_out_handler(&self, handler: &SignOutHandler) {
        let mut handlers = self
            .sign_out_handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(index) = handlers
            .iter()
            .position(|registered| std::ptr::addr_eq(Arc::as_ptr(registered), Arc::as_ptr(handler)))
        {
            handlers.remove(index);
        }
    }

    pub fn sign_out_handler_count(&self) -> usize {
        self.sign_out_handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    async fn track<F>(&self, flow: F) -> Result<User>
    where
        F: Future<Output = Result<User>>,
    {
        self.status.send_replace(AuthenticationStatus::Connecting);
        let result = flow.await;
        let status = self.session.auth_status();
        self.status.send_replace(status);
        match &result {
            Ok(user) => debug!(user = %user.id, status = %status, "session established"),
            Err(err) => debug!(error = %err, status = %status, "session flow failed"),
        }
        result
    }
}

impl std::fmt::Debug for AuthSessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSessionController")
            .field("refresh_token_key", &self.refresh_token_key)
            .field("sign_out_handlers", &self.sign_out_handler_count())
            .finish()
    }
}

/// Access tokens for the transport, served by the session manager
pub struct SessionTokenSource {
    session: Arc<dyn SessionManager>,
}

impl SessionTokenSource {
    pub fn new(session: Arc<dyn SessionManager>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl AccessTokenProvider for SessionTokenSource {
    async fn get_access_token(&self) -> bitski_provider::Result<String> {
        self.session
            .get_access_token()
            .await
            .map_err(|err| ProviderError::TokenUnavailable {
                message: err.to_string(),
            })
    }

    async fn invalidate_token(&self) -> bitski_provider::Result<()> {
        self.session
            .invalidate_token()
            .await
            .map_err(|err| ProviderError::TokenUnavailable {
                message: err.to_string(),
            })
    }
}
