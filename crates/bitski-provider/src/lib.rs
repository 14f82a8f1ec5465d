/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public provider crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod engine;
pub mod http;
pub mod network;
pub mod types;

// Re-export commonly used types from auth
pub use auth::{AccessTokenProvider, AuthPolicy, StaticTokenProvider};

// Re-export commonly used types from engine
pub use engine::{
    BlockTracker,
    DEFAULT_POLLING_INTERVAL,
    EngineErrorEvent,
    FixtureStage,
    Pipeline,
    ProviderEngine,
    Stage,
    StageOutcome,
};

// Re-export commonly used types from http
pub use http::{
    AuthenticatedTransport,
    CLIENT_ID_HEADER,
    ClientConfig,
    ProviderError,
    Result,
    RetryPolicy,
    TransportConfig,
};

// Re-export network registry
pub use network::{DEFAULT_API_BASE_URL, Network, NetworkKey, NetworkRegistry};

// Re-export all types
pub use types::*;
