/*
[INPUT]:  Endpoint URL, headers, token source, retry policy
[OUTPUT]: JSON-RPC results over authenticated HTTP
[POS]:    HTTP layer - transport to JSON-RPC endpoints
[UPDATE]: When changing header composition, retry, or failure classification
*/

pub mod client;
pub mod error;
pub mod retry;
pub mod transport;

pub use error::{ProviderError, Result};
pub use retry::{DEFAULT_RETRY_DELAYS_MS, MAX_ATTEMPTS, RetryPolicy};

pub use client::ClientConfig;
pub use transport::{AuthenticatedTransport, CLIENT_ID_HEADER, TransportConfig};
