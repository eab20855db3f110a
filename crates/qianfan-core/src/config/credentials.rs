//! Long-lived credentials

use serde::{Deserialize, Serialize};
use std::fmt;

/// Credentials available to the client
///
/// Which ones are set decides the authentication strategy, see
/// [`Credentials::auth_mode`].
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// IAM access key, used for request signing and the service catalog
    pub access_key: Option<String>,
    #[serde(skip_serializing)]
    pub secret_key: Option<String>,
    /// Application API key for the OAuth exchange
    pub api_key: Option<String>,
    #[serde(skip_serializing)]
    pub app_secret_key: Option<String>,
    /// Pre-issued OAuth access token, sent as a query parameter
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    /// Pre-issued bearer token, sent in the `Authorization` header
    #[serde(skip_serializing)]
    pub bearer_token: Option<String>,
    /// Exchange IAM keys for a bearer token instead of signing each request
    #[serde(default)]
    pub use_bearer_token: bool,
}

/// Authentication strategy derived from the available credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    StaticBearer,
    StaticAccessToken,
    IamSignature,
    IamBearer,
    OAuth,
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl Credentials {
    /// IAM key pair for request signing
    pub fn iam(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: Some(access_key.into()),
            secret_key: Some(secret_key.into()),
            ..Default::default()
        }
    }

    /// Application key pair for the OAuth exchange
    pub fn oauth(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            app_secret_key: Some(secret_key.into()),
            ..Default::default()
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            bearer_token: Some(token.into()),
            ..Default::default()
        }
    }

    pub fn access_token(token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
            ..Default::default()
        }
    }

    pub fn with_bearer_exchange(mut self, enabled: bool) -> Self {
        self.use_bearer_token = enabled;
        self
    }

    pub fn has_iam_keys(&self) -> bool {
        present(&self.access_key) && present(&self.secret_key)
    }

    pub fn has_oauth_keys(&self) -> bool {
        present(&self.api_key) && present(&self.app_secret_key)
    }

    /// Pick the strategy; pre-issued tokens win over key pairs and IAM keys
    /// win over application keys. `None` when nothing usable is set.
    pub fn auth_mode(&self) -> Option<AuthMode> {
        if present(&self.bearer_token) {
            Some(AuthMode::StaticBearer)
        } else if present(&self.access_token) {
            Some(AuthMode::StaticAccessToken)
        } else if self.has_iam_keys() {
            Some(if self.use_bearer_token {
                AuthMode::IamBearer
            } else {
                AuthMode::IamSignature
            })
        } else if self.has_oauth_keys() {
            Some(AuthMode::OAuth)
        } else {
            None
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &redact(&self.secret_key))
            .field("api_key", &self.api_key)
            .field("app_secret_key", &redact(&self.app_secret_key))
            .field("access_token", &redact(&self.access_token))
            .field("bearer_token", &redact(&self.bearer_token))
            .field("use_bearer_token", &self.use_bearer_token)
            .finish()
    }
}
