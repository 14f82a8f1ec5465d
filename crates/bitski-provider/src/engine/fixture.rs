/*
[INPUT]:  Network config
[OUTPUT]: Locally answered results for static methods
[POS]:    Engine layer - first stage of every pipeline
[UPDATE]: When adding locally answered methods
*/

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::engine::{Stage, StageOutcome};
use crate::network::Network;
use crate::types::JsonRpcRequest;

/// Answers fixed methods without touching the network
#[derive(Debug, Clone, Default)]
pub struct FixtureStage {
    fixtures: HashMap<String, Value>,
}

impl FixtureStage {
    pub fn new(fixtures: HashMap<String, Value>) -> Self {
        Self { fixtures }
    }

    pub fn for_network(network: &Network) -> Self {
        let mut fixtures = HashMap::new();
        fixtures.insert(
            "web3_clientVersion".to_string(),
            json!(format!("Bitski/{}", env!("CARGO_PKG_VERSION"))),
        );
        fixtures.insert("net_listening".to_string(), json!(true));
        fixtures.insert("eth_chainId".to_string(), json!(format!("0x{:x}", network.chain_id)));
        fixtures.insert("net_version".to_string(), json!(network.chain_id.to_string()));
        Self { fixtures }
    }

    pub fn with_fixture(mut self, method: impl Into<String>, value: Value) -> Self {
        self.fixtures.insert(method.into(), value);
        self
    }
}

#[async_trait]
impl Stage for FixtureStage {
    async fn handle(&self, request: &JsonRpcRequest) -> StageOutcome {
        match self.fixtures.get(&request.method) {
            Some(value) => StageOutcome::Complete(Ok(value.clone())),
            None => StageOutcome::Next,
        }
    }
}
