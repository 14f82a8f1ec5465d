/*
[INPUT]:  Error sources (network lookup, token source, HTTP exchange, JSON-RPC body)
[OUTPUT]: Structured error types with retry and authorization hints
[POS]:    Error handling layer - unified error types for the provider crate
[UPDATE]: When adding new error sources or changing failure classification
*/

use thiserror::Error;

/// Main error type for the provider crate
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Network name is not in the registry
    #[error("Unsupported network: {name}")]
    UnsupportedNetwork { name: String },

    /// A URL was passed where a network name was expected
    #[error(
        "Unsupported network name '{name}'. It looks like a URL; pass a custom `network` config instead of a network name"
    )]
    UnsupportedNetworkUrl { name: String },

    /// The token source could not produce an access token
    #[error("Access token unavailable: {message}")]
    TokenUnavailable { message: String },

    /// The endpoint answered with a JSON-RPC (or HTTP 4xx) error
    #[error("JSON-RPC error{}: {message}", code_suffix(.code))]
    UpstreamApplication {
        code: Option<i64>,
        message: String,
        authorization: bool,
    },

    /// Network-level failure talking to the endpoint
    #[error("Transport error: {0}")]
    TransientTransport(String),

    /// Endpoint returned a body that is not a JSON-RPC response
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Every attempt failed with a retryable error
    #[error("All retries exhausted after {attempts} attempts: {last_error}")]
    RetryExhausted { attempts: u32, last_error: String },

    /// No pipeline stage produced a result
    #[error("No stage handled method {method}")]
    MethodNotHandled { method: String },

    /// Header name or value rejected by the HTTP layer
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl ProviderError {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::TransientTransport(_) | ProviderError::InvalidResponse(_)
        )
    }

    /// Check if error indicates an authorization failure at the endpoint
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            ProviderError::UpstreamApplication {
                authorization: true,
                ..
            }
        )
    }

    /// Check if the error came from a network registry lookup
    pub fn is_unsupported_network(&self) -> bool {
        matches!(
            self,
            ProviderError::UnsupportedNetwork { .. } | ProviderError::UnsupportedNetworkUrl { .. }
        )
    }

    /// Wrap a token source failure, keeping an existing `TokenUnavailable` as is
    pub fn token_unavailable(err: ProviderError) -> Self {
        match err {
            err @ ProviderError::TokenUnavailable { .. } => err,
            other => ProviderError::TokenUnavailable {
                message: other.to_string(),
            },
        }
    }
}

fn code_suffix(code: &Option<i64>) -> String {
    code.map(|c| format!(" (code {c})")).unwrap_or_default()
}

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        assert!(ProviderError::TransientTransport("ECONNRESET".to_string()).is_retryable());
        assert!(ProviderError::InvalidResponse("not json".to_string()).is_retryable());

        let upstream = ProviderError::UpstreamApplication {
            code: None,
            message: "Not Authorized".to_string(),
            authorization: true,
        };
        assert!(!upstream.is_retryable());
        assert!(upstream.is_auth_error());

        let exhausted = ProviderError::RetryExhausted {
            attempts: 5,
            last_error: "boom".to_string(),
        };
        assert!(!exhausted.is_retryable());
    }

    #[test]
    fn test_unsupported_network_messages() {
        let plain = ProviderError::UnsupportedNetwork {
            name: "ropstem".to_string(),
        };
        assert!(plain.to_string().starts_with("Unsupported network"));
        assert!(plain.is_unsupported_network());

        let url = ProviderError::UnsupportedNetworkUrl {
            name: "http://localhost:7545".to_string(),
        };
        assert!(url.to_string().contains("Unsupported network name"));
        assert!(url.to_string().contains("custom `network` config"));
    }

    #[test]
    fn test_token_unavailable_wrapping() {
        let wrapped = ProviderError::token_unavailable(ProviderError::Config("Not logged in".into()));
        assert!(matches!(wrapped, ProviderError::TokenUnavailable { .. }));
        assert!(wrapped.to_string().contains("Not logged in"));

        let kept = ProviderError::token_unavailable(ProviderError::TokenUnavailable {
            message: "Not logged in".to_string(),
        });
        assert_eq!(kept.to_string(), "Access token unavailable: Not logged in");
    }

    #[test]
    fn test_upstream_display_with_code() {
        let err = ProviderError::UpstreamApplication {
            code: Some(-32000),
            message: "execution reverted".to_string(),
            authorization: false,
        };
        assert_eq!(err.to_string(), "JSON-RPC error (code -32000): execution reverted");
    }
}
