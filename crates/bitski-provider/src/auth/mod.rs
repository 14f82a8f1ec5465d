/*
[INPUT]:  JSON-RPC method names and session token sources
[OUTPUT]: Auth requirement decisions and bearer tokens
[POS]:    Auth layer - decides when requests carry credentials
[UPDATE]: When the policy table or token source contract changes
*/

pub mod policy;
pub mod token;

pub use policy::{AuthPolicy, DEFAULT_AUTHENTICATED_METHODS};
pub use token::{AccessTokenProvider, StaticTokenProvider};
