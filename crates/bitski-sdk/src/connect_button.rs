/*
[INPUT]:  Host element id, button options, optional completion callback
[OUTPUT]: Headless connect button that triggers sign-in on click
[POS]:    UI model - connect button without a rendering backend
[UPDATE]: When button options or click behavior change
*/

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SdkError};
use crate::session::{AuthSessionController, SignInMethod, User};

/// Receives the outcome of a popup sign-in started by a click.
///
/// Redirect clicks never call it; the redirect outcome arrives through
/// `redirect_callback` after the user returns.
pub type ConnectCallback = Arc<dyn Fn(std::result::Result<&User, &SdkError>) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectButtonSize {
    Small,
    #[default]
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectButtonOptions {
    #[serde(default)]
    pub method: SignInMethod,
    #[serde(default)]
    pub size: ConnectButtonSize,
}

pub struct ConnectButton {
    host: Option<String>,
    options: ConnectButtonOptions,
    callback: Option<ConnectCallback>,
    auth: Arc<AuthSessionController>,
}

impl ConnectButton {
    pub fn new(
        auth: Arc<AuthSessionController>,
        host: Option<String>,
        options: ConnectButtonOptions,
        callback: Option<ConnectCallback>,
    ) -> Self {
        Self {
            host,
            options,
            callback,
            auth,
        }
    }

    pub fn with_options(mut self, options: ConnectButtonOptions) -> Self {
        self.options = options;
        self
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn options(&self) -> ConnectButtonOptions {
        self.options
    }

    /// Popup: sign in and report the outcome to the callback.
    /// Redirect: start navigation and return `None` without calling the
    /// callback.
    pub async fn click(&self) -> Result<Option<User>> {
        match self.options.method {
            SignInMethod::Popup => {
                let result = self.auth.sign_in().await;
                if let Some(callback) = &self.callback {
                    callback(result.as_ref());
                }
                result.map(Some)
            }
            SignInMethod::Redirect => {
                self.auth.sign_in_redirect();
                Ok(None)
            }
        }
    }
}

impl std::fmt::Debug for ConnectButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectButton")
            .field("host", &self.host)
            .field("options", &self.options)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}
