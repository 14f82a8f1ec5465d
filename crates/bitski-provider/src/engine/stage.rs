/*
[INPUT]:  JSON-RPC call
[OUTPUT]: Pass-through or a completed result/error
[POS]:    Engine layer - ordered stage composition
[UPDATE]: When changing how stages short-circuit or report errors
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use crate::engine::EngineErrorEvent;
use crate::http::{ProviderError, Result};
use crate::types::JsonRpcRequest;

const ERROR_CHANNEL_CAPACITY: usize = 64;

/// What a stage did with a call
#[derive(Debug)]
pub enum StageOutcome {
    /// Hand the call to the next stage
    Next,
    /// Stop here with this result
    Complete(Result<Value>),
}

/// One request-processing step in a pipeline
#[async_trait]
pub trait Stage: Send + Sync {
    async fn handle(&self, request: &JsonRpcRequest) -> StageOutcome;
}

/// Stages fixed at construction plus the error event channel
pub struct Pipeline {
    stages: Vec<Arc<dyn Stage>>,
    errors: broadcast::Sender<EngineErrorEvent>,
    next_id: AtomicU64,
}

impl Pipeline {
    pub fn new(stages: Vec<Arc<dyn Stage>>) -> Self {
        let (errors, _rx) = broadcast::channel(ERROR_CHANNEL_CAPACITY);
        Self {
            stages,
            errors,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn subscribe_errors(&self) -> broadcast::Receiver<EngineErrorEvent> {
        self.errors.subscribe()
    }

    /// Run the call through each stage until one completes it.
    ///
    /// Failures go back to the caller and are also broadcast to error
    /// subscribers.
    pub async fn dispatch(&self, request: &JsonRpcRequest) -> Result<Value> {
        for stage in &self.stages {
            if let StageOutcome::Complete(result) = stage.handle(request).await {
                return self.report(request, result);
            }
        }
        self.report(
            request,
            Err(ProviderError::MethodNotHandled {
                method: request.method.clone(),
            }),
        )
    }

    fn report(&self, request: &JsonRpcRequest, result: Result<Value>) -> Result<Value> {
        if let Err(err) = &result {
            let event = EngineErrorEvent::new(&request.method, err);
            if self.errors.send(event).is_err() {
                debug!(method = %request.method, "no error subscribers");
            }
        }
        result
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages.len())
            .finish()
    }
}
