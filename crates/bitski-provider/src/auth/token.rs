/*
[INPUT]:  Session state owned by the embedding application
[OUTPUT]: Bearer tokens and token invalidation
[POS]:    Auth layer - token source abstraction used by the transport
[UPDATE]: When the token source contract changes
*/

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::http::{ProviderError, Result};

/// Supplies bearer tokens to the transport.
///
/// The trait is async because real sources refresh over the network or read
/// from storage.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Current access token; fails when there is no session
    async fn get_access_token(&self) -> Result<String>;

    /// Mark the current token unusable so the next fetch sees fresh state
    async fn invalidate_token(&self) -> Result<()>;
}

/// Token source holding a single pre-issued token
#[derive(Debug, Default)]
pub struct StaticTokenProvider {
    token: RwLock<Option<String>>,
}

impl StaticTokenProvider {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token),
        }
    }

    pub fn set_token(&self, token: impl Into<String>) {
        let mut guard = self.token.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(token.into());
    }

    pub fn has_token(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn get_access_token(&self) -> Result<String> {
        let guard = self.token.read().unwrap_or_else(PoisonError::into_inner);
        guard.clone().ok_or_else(|| ProviderError::TokenUnavailable {
            message: "Not signed in".to_string(),
        })
    }

    async fn invalidate_token(&self) -> Result<()> {
        let mut guard = self.token.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
        Ok(())
    }
}
