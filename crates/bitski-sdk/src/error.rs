/*
[INPUT]:  Error sources (provider, session manager, storage, config, IO)
[OUTPUT]: Structured SDK error type
[POS]:    Error handling layer - unified error type for the SDK crate
[UPDATE]: When adding new error sources or improving error messages
*/

use bitski_provider::ProviderError;
use thiserror::Error;

/// Main error type for the Bitski SDK
#[derive(Error, Debug)]
pub enum SdkError {
    /// Provider, network or transport failure
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Session manager failure (popup closed, refresh rejected, ...)
    #[error("Session error: {0}")]
    Session(String),

    /// Operation needs a signed-in user
    #[error("Not signed in")]
    NotSignedIn,

    /// Silent reauthentication without a persisted refresh token
    #[error("No refresh token stored under '{key}'")]
    NoRefreshToken { key: String },

    /// Refresh-token storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SdkError {
    /// Whether the failure came from the session rather than a provider call
    pub fn is_session_error(&self) -> bool {
        matches!(
            self,
            SdkError::Session(_) | SdkError::NotSignedIn | SdkError::NoRefreshToken { .. }
        )
    }
}

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;
