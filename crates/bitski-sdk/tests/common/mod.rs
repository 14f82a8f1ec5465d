/*
[INPUT]:  Test configuration and mock session requirements
[OUTPUT]: Shared test utilities, mock session manager, SDK fixtures
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for bitski-sdk tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bitski_sdk::bitski_provider::RetryPolicy;
use bitski_sdk::{
    AuthenticationStatus, Bitski, BitskiOptions, MemoryStore, Result, SdkError, SessionManager,
    SignInMethod, User,
};
use wiremock::MockServer;

pub const TEST_CLIENT_ID: &str = "test-client-id";
pub const TEST_ACCESS_TOKEN: &str = "test-access-token";
pub const TEST_REFRESH_TOKEN: &str = "test-refresh-token";

/// Shared, ordered record of observable events
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

#[allow(dead_code)]
pub fn entries(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Session manager double that records every call
pub struct MockSessionManager {
    pub log: CallLog,
    pub signed_in: AtomicBool,
    pub fail_sign_out: AtomicBool,
    pub fail_redirect: AtomicBool,
    pub invalidations: AtomicUsize,
    pub refreshed_with: Mutex<Option<String>>,
}

impl MockSessionManager {
    pub fn new(log: CallLog) -> Arc<Self> {
        Arc::new(Self {
            log,
            signed_in: AtomicBool::new(false),
            fail_sign_out: AtomicBool::new(false),
            fail_redirect: AtomicBool::new(false),
            invalidations: AtomicUsize::new(0),
            refreshed_with: Mutex::new(None),
        })
    }

    pub fn signed_in(log: CallLog) -> Arc<Self> {
        let session = Self::new(log);
        session.signed_in.store(true, Ordering::SeqCst);
        session
    }

    fn record(&self, call: &str) {
        self.log.lock().unwrap().push(call.to_string());
    }

    fn establish(&self) -> User {
        self.signed_in.store(true, Ordering::SeqCst);
        test_user()
    }
}

pub fn test_user() -> User {
    User::new("test-user", vec!["0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf".to_string()])
}

#[async_trait]
impl SessionManager for MockSessionManager {
    async fn sign_in_or_connect(&self) -> Result<User> {
        self.record("sign_in_or_connect");
        Ok(self.establish())
    }

    async fn sign_in(&self, method: SignInMethod) -> Result<User> {
        match method {
            SignInMethod::Popup => {
                self.record("sign_in:popup");
                Ok(self.establish())
            }
            SignInMethod::Redirect => {
                self.record("sign_in:redirect");
                if self.fail_redirect.load(Ordering::SeqCst) {
                    return Err(SdkError::Session("redirect blocked".to_string()));
                }
                // navigation never resolves on this page
                std::future::pending::<()>().await;
                Err(SdkError::Session("redirect did not navigate".to_string()))
            }
        }
    }

    async fn refresh_access_token(&self, refresh_token: &str) -> Result<()> {
        self.record("refresh_access_token");
        *self.refreshed_with.lock().unwrap() = Some(refresh_token.to_string());
        self.signed_in.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn load_user(&self) -> Result<User> {
        self.record("load_user");
        if self.signed_in.load(Ordering::SeqCst) {
            Ok(test_user())
        } else {
            Err(SdkError::NotSignedIn)
        }
    }

    async fn get_user(&self) -> Result<User> {
        self.record("get_user");
        if self.signed_in.load(Ordering::SeqCst) {
            Ok(test_user())
        } else {
            Err(SdkError::NotSignedIn)
        }
    }

    async fn redirect_callback(&self) -> Result<User> {
        self.record("redirect_callback");
        Ok(self.establish())
    }

    async fn request_sign_out(&self) -> Result<()> {
        self.record("request_sign_out");
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(SdkError::Session("sign out rejected".to_string()));
        }
        self.signed_in.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn auth_status(&self) -> AuthenticationStatus {
        if self.signed_in.load(Ordering::SeqCst) {
            AuthenticationStatus::Connected
        } else {
            AuthenticationStatus::NotConnected
        }
    }

    async fn get_access_token(&self) -> Result<String> {
        if self.signed_in.load(Ordering::SeqCst) {
            Ok(TEST_ACCESS_TOKEN.to_string())
        } else {
            Err(SdkError::NotSignedIn)
        }
    }

    async fn invalidate_token(&self) -> Result<()> {
        self.record("invalidate_token");
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Setup a mock HTTP server for testing
#[allow(dead_code)]
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

pub fn test_options() -> BitskiOptions {
    BitskiOptions::default()
        .with_store(Arc::new(MemoryStore::new()))
        .with_retry(RetryPolicy::immediate())
}

/// SDK pointed at a mock server's `/v1` API root
#[allow(dead_code)]
pub fn sdk_for_server(server: &MockServer, session: Arc<MockSessionManager>) -> Bitski {
    Bitski::new(
        TEST_CLIENT_ID,
        session,
        test_options().with_api_base_url(format!("{}/v1", server.uri())),
    )
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
