/*
[INPUT]:  JSON-RPC 2.0 wire format
[OUTPUT]: Typed request/response structs with serialization support
[POS]:    Data layer - type definitions for endpoint communication
[UPDATE]: When the envelope shape or error object changes
*/

pub mod jsonrpc;

pub use jsonrpc::*;
