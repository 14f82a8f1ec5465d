/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for bitski-provider tests

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bitski_provider::{
    AccessTokenProvider, AuthenticatedTransport, ProviderError, RetryPolicy, TransportConfig,
};
use wiremock::MockServer;

pub const TEST_CLIENT_ID: &str = "test-client-id";
pub const TEST_ACCESS_TOKEN: &str = "test-access-token";

/// Token source that counts calls and logs out on invalidation
#[derive(Debug)]
pub struct MockTokenProvider {
    pub logged_in: AtomicBool,
    pub fetches: AtomicUsize,
    pub invalidations: AtomicUsize,
}

impl MockTokenProvider {
    pub fn new(logged_in: bool) -> Arc<Self> {
        Arc::new(Self {
            logged_in: AtomicBool::new(logged_in),
            fetches: AtomicUsize::new(0),
            invalidations: AtomicUsize::new(0),
        })
    }

    #[allow(dead_code)]
    pub fn invalidation_count(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }

    #[allow(dead_code)]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccessTokenProvider for MockTokenProvider {
    async fn get_access_token(&self) -> bitski_provider::Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.logged_in.load(Ordering::SeqCst) {
            Ok(TEST_ACCESS_TOKEN.to_string())
        } else {
            Err(ProviderError::TokenUnavailable {
                message: "Not logged in".to_string(),
            })
        }
    }

    async fn invalidate_token(&self) -> bitski_provider::Result<()> {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        self.logged_in.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

pub fn rpc_url(server: &MockServer) -> String {
    format!("{}/v1/web3/kovan", server.uri())
}

/// Registry-style transport config with no retry delays
pub fn test_config(rpc_url: &str) -> TransportConfig {
    TransportConfig::new(rpc_url)
        .with_client_id(TEST_CLIENT_ID)
        .with_retry(RetryPolicy::immediate())
}

pub fn create_transport(
    config: TransportConfig,
    tokens: Arc<MockTokenProvider>,
) -> AuthenticatedTransport {
    AuthenticatedTransport::new(config, tokens).expect("transport init")
}

/// Wait until `condition` holds or a second elapses
#[allow(dead_code)]
pub async fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
