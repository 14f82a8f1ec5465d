/*
[INPUT]:  Session manager, refresh-token storage, provider engine manager
[OUTPUT]: Session controller and its collaborator traits
[POS]:    Session layer - module wiring
[UPDATE]: When adding session components
*/

pub mod controller;
pub mod manager;
pub mod store;

pub use controller::{AuthSessionController, SessionTokenSource, SignOutHandler};
pub use manager::{AuthenticationStatus, SessionManager, SignInMethod, User};
pub use store::{DEFAULT_STORAGE_NAMESPACE, FileStore, MemoryStore, TokenStore, refresh_token_key};
