/*
[INPUT]:  JSON-RPC calls from the embedding application
[OUTPUT]: Results from the first stage that completes the call, error events, block numbers
[POS]:    Engine layer - per-network request pipeline
[UPDATE]: When adding stages or changing pipeline lifecycle
*/

pub mod block_tracker;
pub mod fixture;
pub mod provider;
pub mod stage;

pub use block_tracker::{BlockTracker, DEFAULT_POLLING_INTERVAL};
pub use fixture::FixtureStage;
pub use provider::{EngineErrorEvent, ProviderEngine, ProviderEngineBuilder};
pub use stage::{Pipeline, Stage, StageOutcome};
