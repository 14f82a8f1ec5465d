/*
[INPUT]:  JSON-RPC call, token source, header configuration, retry policy
[OUTPUT]: Call result, or a classified ProviderError
[POS]:    HTTP layer - authenticated fetch stage at the end of every pipeline
[UPDATE]: When changing header composition, retry, or failure classification
*/

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::{AccessTokenProvider, AuthPolicy};
use crate::engine::{Stage, StageOutcome};
use crate::http::{ClientConfig, ProviderError, Result, RetryPolicy};
use crate::types::{JsonRpcErrorObject, JsonRpcRequest, JsonRpcResponse};

/// Header carrying the SDK client id on registry networks
pub const CLIENT_ID_HEADER: &str = "X-API-KEY";

/// Lowercased fragments that mark an upstream error as an authorization failure
const AUTHORIZATION_MARKERS: &[&str] = &[
    "not authorized",
    "unauthorized",
    "not signed in",
    "invalid token",
    "token expired",
];

const BODY_PREVIEW_BYTES: usize = 256;

/// Transport configuration
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub rpc_url: String,
    /// Headers owned by the SDK (client id); empty for custom endpoints
    pub client_headers: BTreeMap<String, String>,
    /// Caller-supplied headers, applied last
    pub additional_headers: BTreeMap<String, String>,
    /// Header used to forward a call's origin, if any
    pub origin_header_key: Option<String>,
    pub auth_policy: AuthPolicy,
    pub retry: RetryPolicy,
    pub client: ClientConfig,
}

impl TransportConfig {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            client_headers: BTreeMap::new(),
            additional_headers: BTreeMap::new(),
            origin_header_key: None,
            auth_policy: AuthPolicy::default(),
            retry: RetryPolicy::default(),
            client: ClientConfig::default(),
        }
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_headers
            .insert(CLIENT_ID_HEADER.to_string(), client_id.into());
        self
    }

    pub fn with_additional_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.additional_headers.extend(headers);
        self
    }

    pub fn with_origin_header_key(mut self, key: impl Into<String>) -> Self {
        self.origin_header_key = Some(key.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_auth_policy(mut self, auth_policy: AuthPolicy) -> Self {
        self.auth_policy = auth_policy;
        self
    }
}

/// Authenticated fetch to one JSON-RPC endpoint
pub struct AuthenticatedTransport {
    http: Client,
    rpc_url: Url,
    client_headers: HeaderMap,
    additional_headers: HeaderMap,
    origin_header_key: Option<HeaderName>,
    auth_policy: AuthPolicy,
    retry: RetryPolicy,
    token_provider: Arc<dyn AccessTokenProvider>,
}

impl AuthenticatedTransport {
    pub fn new(config: TransportConfig, token_provider: Arc<dyn AccessTokenProvider>) -> Result<Self> {
        let origin_header_key = config
            .origin_header_key
            .as_deref()
            .map(parse_header_name)
            .transpose()?;

        Ok(Self {
            http: config.client.build_client()?,
            rpc_url: Url::parse(&config.rpc_url)?,
            client_headers: to_header_map(&config.client_headers)?,
            additional_headers: to_header_map(&config.additional_headers)?,
            origin_header_key,
            auth_policy: config.auth_policy,
            retry: config.retry,
            token_provider,
        })
    }

    pub fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }

    pub fn auth_policy(&self) -> &AuthPolicy {
        &self.auth_policy
    }

    /// Send one call, retrying transient failures
    pub async fn send_request(&self, request: &JsonRpcRequest) -> Result<Value> {
        let token = if self.auth_policy.requires_auth(&request.method) {
            let token = self
                .token_provider
                .get_access_token()
                .await
                .map_err(ProviderError::token_unavailable)?;
            Some(token)
        } else {
            None
        };

        let token = token.as_deref();
        let origin = request.origin.as_deref();
        let result = self
            .retry
            .run(&request.method, |_| async move {
                let headers = self.request_headers(token, origin)?;
                self.exchange(headers, request).await
            })
            .await;

        if let Err(err) = &result {
            if err.is_auth_error() {
                self.spawn_invalidate(&request.method);
            }
        }
        result
    }

    /// Headers for one exchange: client headers, bearer token, origin, then
    /// additional headers, which win ties
    pub fn request_headers(&self, token: Option<&str>, origin: Option<&str>) -> Result<HeaderMap> {
        let mut headers = self.client_headers.clone();

        if let Some(token) = token {
            headers.insert(AUTHORIZATION, parse_header_value(&format!("Bearer {token}"))?);
        }

        if let (Some(key), Some(origin)) = (&self.origin_header_key, origin) {
            headers.insert(key.clone(), parse_header_value(origin)?);
        }

        for (name, value) in &self.additional_headers {
            headers.insert(name.clone(), value.clone());
        }

        Ok(headers)
    }

    async fn exchange(&self, headers: HeaderMap, request: &JsonRpcRequest) -> Result<Value> {
        let response = self
            .http
            .post(self.rpc_url.clone())
            .headers(headers)
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::TransientTransport(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ProviderError::TransientTransport(e.to_string()))?;

        classify_response(status, &body)
    }

    fn spawn_invalidate(&self, method: &str) {
        let token_provider = self.token_provider.clone();
        let method = method.to_string();
        tokio::spawn(async move {
            debug!(method = %method, "authorization failure, invalidating access token");
            if let Err(err) = token_provider.invalidate_token().await {
                warn!(method = %method, error = %err, "failed to invalidate access token");
            }
        });
    }
}

impl std::fmt::Debug for AuthenticatedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedTransport")
            .field("rpc_url", &self.rpc_url.as_str())
            .field("client_headers", &self.client_headers.keys().collect::<Vec<_>>())
            .field("additional_headers", &self.additional_headers.keys().collect::<Vec<_>>())
            .field("retry", &self.retry)
            .finish()
    }
}

#[async_trait]
impl Stage for AuthenticatedTransport {
    async fn handle(&self, request: &JsonRpcRequest) -> StageOutcome {
        StageOutcome::Complete(self.send_request(request).await)
    }
}

/// Map an HTTP status and body onto a result or a classified error
pub(crate) fn classify_response(status: StatusCode, body: &[u8]) -> Result<Value> {
    let parsed = serde_json::from_slice::<JsonRpcResponse>(body).ok();

    if let Some(error) = parsed.as_ref().and_then(|response| response.error.as_ref()) {
        return Err(upstream_error(status, error));
    }

    if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
    {
        return Err(ProviderError::TransientTransport(format!(
            "HTTP {status}: {}",
            body_preview(body)
        )));
    }

    if status.is_client_error() {
        return Err(ProviderError::UpstreamApplication {
            code: Some(i64::from(status.as_u16())),
            message: status
                .canonical_reason()
                .unwrap_or("Client error")
                .to_string(),
            authorization: is_auth_status(status),
        });
    }

    match parsed {
        Some(response) => Ok(response.result.unwrap_or(Value::Null)),
        None => Err(ProviderError::InvalidResponse(body_preview(body))),
    }
}

fn upstream_error(status: StatusCode, error: &JsonRpcErrorObject) -> ProviderError {
    let message = error.message.to_ascii_lowercase();
    let authorization = is_auth_status(status)
        || matches!(error.code, Some(401) | Some(403))
        || AUTHORIZATION_MARKERS
            .iter()
            .any(|marker| message.contains(marker));

    ProviderError::UpstreamApplication {
        code: error.code,
        message: error.message.clone(),
        authorization,
    }
}

fn is_auth_status(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

fn body_preview(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() <= BODY_PREVIEW_BYTES {
        return text.into_owned();
    }
    let mut end = BODY_PREVIEW_BYTES;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

fn parse_header_name(name: &str) -> Result<HeaderName> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| ProviderError::InvalidHeader(format!("{name}: {e}")))
}

fn parse_header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| ProviderError::InvalidHeader(e.to_string()))
}

fn to_header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        map.insert(parse_header_name(name)?, parse_header_value(value)?);
    }
    Ok(map)
}
