/*
[INPUT]:  JSON-RPC method name
[OUTPUT]: Whether the method must carry a bearer token
[POS]:    Auth layer - authentication requirement table
[UPDATE]: When account-revealing or signing methods are added
*/

use std::collections::HashSet;

/// Methods that reveal accounts or sign on the user's behalf
pub const DEFAULT_AUTHENTICATED_METHODS: &[&str] = &[
    "eth_accounts",
    "eth_requestAccounts",
    "eth_coinbase",
    "eth_sign",
    "eth_signTransaction",
    "eth_sendTransaction",
    "eth_signTypedData",
    "eth_signTypedData_v3",
    "eth_signTypedData_v4",
    "personal_sign",
];

/// Set of method names that require a bearer token.
///
/// Membership is the only input: session state never downgrades a
/// protected method to an anonymous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthPolicy {
    methods: HashSet<String>,
}

impl AuthPolicy {
    pub fn new<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            methods: methods.into_iter().map(Into::into).collect(),
        }
    }

    pub fn requires_auth(&self, method: &str) -> bool {
        self.methods.contains(method)
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.methods.insert(method.into());
        self
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_AUTHENTICATED_METHODS.iter().copied())
    }
}
