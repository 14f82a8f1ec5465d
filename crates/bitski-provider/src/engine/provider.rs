/*
[INPUT]:  Network, composed stages, engine settings
[OUTPUT]: ProviderEngine handle (send, start/stop, error + block subscriptions)
[POS]:    Engine layer - the per-network provider handed to applications
[UPDATE]: When changing engine lifecycle or exposed settings
*/

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{broadcast, watch};

use crate::engine::{BlockTracker, DEFAULT_POLLING_INTERVAL, Pipeline, Stage};
use crate::http::{ProviderError, Result};
use crate::network::Network;
use crate::types::JsonRpcRequest;

/// Error raised by a pipeline, as seen by error subscribers.
///
/// Subscribers only observe: nothing in the engine stops or restarts in
/// response to an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineErrorEvent {
    pub method: String,
    pub message: String,
    pub authorization: bool,
}

impl EngineErrorEvent {
    pub fn new(method: &str, err: &ProviderError) -> Self {
        Self {
            method: method.to_string(),
            message: err.to_string(),
            authorization: err.is_auth_error(),
        }
    }
}

/// Builder that fixes the stage list of an engine
pub struct ProviderEngineBuilder {
    network: Network,
    stages: Vec<Arc<dyn Stage>>,
    polling_interval: Duration,
    rpc_headers: BTreeMap<String, String>,
    web_base_url: Option<String>,
}

impl ProviderEngineBuilder {
    pub fn stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn polling_interval(mut self, polling_interval: Duration) -> Self {
        self.polling_interval = polling_interval;
        self
    }

    /// Headers the engine's transport sends; kept for inspection
    pub fn rpc_headers(mut self, rpc_headers: BTreeMap<String, String>) -> Self {
        self.rpc_headers = rpc_headers;
        self
    }

    pub fn web_base_url(mut self, web_base_url: Option<String>) -> Self {
        self.web_base_url = web_base_url;
        self
    }

    pub fn build(self) -> ProviderEngine {
        let pipeline = Arc::new(Pipeline::new(self.stages));
        let block_tracker = BlockTracker::new(pipeline.clone(), self.polling_interval);
        ProviderEngine {
            network: self.network,
            rpc_headers: self.rpc_headers,
            web_base_url: self.web_base_url,
            pipeline,
            block_tracker,
        }
    }
}

/// Request pipeline plus block tracker for one network
#[derive(Debug)]
pub struct ProviderEngine {
    network: Network,
    rpc_headers: BTreeMap<String, String>,
    web_base_url: Option<String>,
    pipeline: Arc<Pipeline>,
    block_tracker: BlockTracker,
}

impl ProviderEngine {
    pub fn builder(network: Network) -> ProviderEngineBuilder {
        ProviderEngineBuilder {
            network,
            stages: Vec::new(),
            polling_interval: DEFAULT_POLLING_INTERVAL,
            rpc_headers: BTreeMap::new(),
            web_base_url: None,
        }
    }

    /// Send a prepared call through the pipeline
    pub async fn send(&self, request: &JsonRpcRequest) -> Result<Value> {
        self.pipeline.dispatch(request).await
    }

    /// Send `method` with a fresh request id
    pub async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let request = JsonRpcRequest::new(self.pipeline.next_id(), method, params);
        self.send(&request).await
    }

    pub fn start(&self) {
        self.block_tracker.start();
    }

    pub fn stop(&self) {
        self.block_tracker.stop();
    }

    pub fn is_running(&self) -> bool {
        self.block_tracker.is_running()
    }

    pub fn subscribe_errors(&self) -> broadcast::Receiver<EngineErrorEvent> {
        self.pipeline.subscribe_errors()
    }

    pub fn subscribe_blocks(&self) -> watch::Receiver<Option<u64>> {
        self.block_tracker.subscribe()
    }

    pub fn latest_block(&self) -> Option<u64> {
        self.block_tracker.latest_block()
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn rpc_headers(&self) -> &BTreeMap<String, String> {
        &self.rpc_headers
    }

    pub fn polling_interval(&self) -> Duration {
        self.block_tracker.polling_interval()
    }

    pub fn web_base_url(&self) -> Option<&str> {
        self.web_base_url.as_deref()
    }

    pub fn stage_count(&self) -> usize {
        self.pipeline.len()
    }
}
