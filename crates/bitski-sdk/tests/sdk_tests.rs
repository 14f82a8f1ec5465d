/*
[INPUT]:  SDK instances over a mock JSON-RPC API and mock session
[OUTPUT]: Test results for provider caching, auth headers, error isolation
[POS]:    Integration tests - SDK surface end to end
[UPDATE]: When provider wiring or SDK construction changes
*/

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use bitski_sdk::bitski_provider::{Network, NetworkKey, ProviderError};
use bitski_sdk::{Bitski, ProviderOptions, SdkConfig, SdkError};
use common::{
    MockSessionManager, TEST_CLIENT_ID, new_log, sdk_for_server, setup_mock_server, test_options,
    wait_until,
};
use serde_json::json;
use tokio_test::assert_ok;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_default_provider_is_mainnet_with_client_id() {
    let bitski = Bitski::new(TEST_CLIENT_ID, MockSessionManager::new(new_log()), test_options());

    let engine = assert_ok!(bitski.get_provider(None::<&str>));
    assert_eq!(engine.network().name.as_deref(), Some("mainnet"));
    assert_eq!(engine.network().chain_id, 1);
    assert_eq!(engine.rpc_headers()["X-API-KEY"], TEST_CLIENT_ID);

    let default = assert_ok!(bitski.get_default_provider());
    assert!(Arc::ptr_eq(&engine, &default));
}

#[tokio::test]
async fn test_kovan_twice_caches_one_engine() {
    let bitski = Bitski::new(TEST_CLIENT_ID, MockSessionManager::new(new_log()), test_options());

    let first = assert_ok!(bitski.get_provider("kovan"));
    let second = assert_ok!(bitski.get_provider("kovan"));
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(bitski.engines().len(), 1);
    assert_eq!(bitski.engines().keys(), vec![NetworkKey::Named("kovan".to_string())]);
}

#[tokio::test]
async fn test_instances_do_not_share_engines() {
    let a = Bitski::new(TEST_CLIENT_ID, MockSessionManager::new(new_log()), test_options());
    let b = Bitski::new(TEST_CLIENT_ID, MockSessionManager::new(new_log()), test_options());

    let from_a = assert_ok!(a.get_provider("kovan"));
    let from_b = assert_ok!(b.get_provider("kovan"));
    assert!(!Arc::ptr_eq(&from_a, &from_b));
}

#[tokio::test]
async fn test_custom_network_config() {
    let bitski = Bitski::new(TEST_CLIENT_ID, MockSessionManager::new(new_log()), test_options());

    let engine = assert_ok!(bitski.get_provider(
        ProviderOptions::custom(Network::custom("http://localhost:7545", 5777))
            .with_header("X-FOO-FEATURE", "ENABLED")
    ));
    assert_eq!(engine.network().rpc_url, "http://localhost:7545");
    assert!(engine.rpc_headers().get("X-API-KEY").is_none());
    assert_eq!(engine.rpc_headers()["X-FOO-FEATURE"], "ENABLED");

    let other = assert_ok!(bitski.get_provider(Network::custom("http://localhost:7545", 5778)));
    assert!(!Arc::ptr_eq(&engine, &other));
}

#[tokio::test]
async fn test_unsupported_network_names() {
    let bitski = Bitski::new(TEST_CLIENT_ID, MockSessionManager::new(new_log()), test_options());

    let err = bitski.get_provider("notanetwork").unwrap_err();
    assert!(err.to_string().starts_with("Unsupported network"));

    let err = bitski.get_provider("https://mainnet.infura.io").unwrap_err();
    assert!(matches!(
        err,
        SdkError::Provider(ProviderError::UnsupportedNetworkUrl { .. })
    ));
    assert!(bitski.engines().is_empty());
}

#[tokio::test]
async fn test_authenticated_call_uses_session_token() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/v1/web3/kovan"))
        .and(header("authorization", "Bearer test-access-token"))
        .and(header("x-api-key", TEST_CLIENT_ID))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 0, "result": ["0xabc"]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let bitski = sdk_for_server(&server, MockSessionManager::signed_in(new_log()));
    let engine = assert_ok!(bitski.get_provider("kovan"));

    let accounts = assert_ok!(engine.request("eth_accounts", json!([])).await);
    assert_eq!(accounts, json!(["0xabc"]));
}

#[tokio::test]
async fn test_auth_method_without_session_fails_before_http() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": []})))
        .expect(0)
        .mount(&server)
        .await;

    let bitski = sdk_for_server(&server, MockSessionManager::new(new_log()));
    let engine = assert_ok!(bitski.get_provider("kovan"));

    let err = engine.request("eth_accounts", json!([])).await.unwrap_err();
    assert!(matches!(err, ProviderError::TokenUnavailable { .. }));
    assert!(err.to_string().contains("Not signed in"));
}

#[tokio::test]
async fn test_auth_error_invalidates_without_stopping_engine() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"error": {"code": -32000, "message": "Not Authorized"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = MockSessionManager::signed_in(new_log());
    let bitski = sdk_for_server(&server, session.clone());
    let engine = assert_ok!(bitski.get_provider("kovan"));
    let mut errors = engine.subscribe_errors();

    let err = engine
        .request("eth_sendTransaction", json!([{}]))
        .await
        .unwrap_err();
    assert!(err.is_auth_error());

    let event = errors.recv().await.unwrap();
    assert!(event.authorization);
    assert!(wait_until(|| session.invalidations.load(Ordering::SeqCst) == 1).await);
    assert!(engine.is_running());
    assert_eq!(bitski.engines().len(), 1);
}

#[tokio::test]
async fn test_from_config_uses_file_store() {
    let dir = std::env::temp_dir().join(format!("bitski-sdk-test-{}", uuid::Uuid::new_v4()));
    let mut config = SdkConfig::new(TEST_CLIENT_ID);
    config.storage_dir = Some(dir.clone());
    config.storage_namespace = "acme".to_string();

    let bitski = assert_ok!(Bitski::from_config(&config, MockSessionManager::new(new_log())));
    assert_eq!(bitski.client_id(), TEST_CLIENT_ID);
    assert_eq!(
        bitski.auth().refresh_token_key(),
        "acme.refresh_token.test-client-id"
    );

    let err = bitski.connect().await.unwrap_err();
    assert!(matches!(err, SdkError::NoRefreshToken { .. }));
    assert!(!dir.exists());
}
