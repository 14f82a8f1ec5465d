/*
[INPUT]:  Public API exports for bitski-sdk crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod config;
pub mod connect_button;
pub mod engine_manager;
pub mod error;
pub mod sdk;
pub mod session;

// Re-export main types for convenience
pub use config::SdkConfig;
pub use connect_button::{ConnectButton, ConnectButtonOptions, ConnectButtonSize, ConnectCallback};
pub use engine_manager::{EngineManagerConfig, ProviderEngineManager, ProviderIdentifier, ProviderOptions};
pub use error::{Result, SdkError};
pub use sdk::{Bitski, BitskiOptions};
pub use session::{
    AuthSessionController, AuthenticationStatus, FileStore, MemoryStore, SessionManager,
    SessionTokenSource, SignInMethod, SignOutHandler, TokenStore, User,
};

pub use bitski_provider;
