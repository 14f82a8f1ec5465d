/*
[INPUT]:  Network names or ad-hoc endpoint configs
[OUTPUT]: Resolved Network values and canonical cache keys
[POS]:    Network layer - well-known network table
[UPDATE]: When adding networks or changing endpoint templates
*/

pub mod registry;

pub use registry::{DEFAULT_API_BASE_URL, Network, NetworkKey, NetworkRegistry};
