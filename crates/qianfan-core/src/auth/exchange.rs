//! Credential exchanges producing access tokens

use super::bce::BceSigner;
use super::token::IssuedToken;
use crate::error::{QianfanError, QianfanResult};
use crate::transport::PreparedRequest;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

/// Turns long-lived credentials into a short-lived access token
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange(&self) -> QianfanResult<IssuedToken>;

    /// Name used in logs
    fn name(&self) -> &'static str;
}

/// Map an HTTP failure of an exchange call onto an auth error
fn exchange_failure(status: u16, message: String) -> QianfanError {
    if status >= 500 || status == 429 {
        QianfanError::auth_transient(format!("token exchange failed (HTTP {}): {}", status, message))
    } else {
        QianfanError::auth(format!("token exchange rejected (HTTP {}): {}", status, message))
    }
}

fn network_failure(error: reqwest::Error) -> QianfanError {
    warn!(error = %error, "token exchange request failed");
    QianfanError::auth_transient(format!("token exchange request failed: {}", error))
}

#[derive(Debug, Deserialize)]
struct OAuthResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    error: Option<String>,
    error_description: Option<String>,
}

/// OAuth `client_credentials` exchange using an application key pair
#[derive(Debug, Clone)]
pub struct OAuthExchange {
    client: reqwest::Client,
    url: String,
    api_key: String,
    secret_key: String,
}

impl OAuthExchange {
    pub fn new(
        client: reqwest::Client,
        url: impl Into<String>,
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> QianfanResult<Self> {
        let api_key = api_key.into();
        let secret_key = secret_key.into();
        if api_key.is_empty() || secret_key.is_empty() {
            return Err(QianfanError::validation(
                "both API key and secret key are required for OAuth",
            ));
        }
        Ok(Self {
            client,
            url: url.into(),
            api_key,
            secret_key,
        })
    }
}

#[async_trait]
impl TokenExchange for OAuthExchange {
    async fn exchange(&self) -> QianfanResult<IssuedToken> {
        let request = PreparedRequest::post(&self.url)?
            .with_query("grant_type", "client_credentials")
            .with_query("client_id", &self.api_key)
            .with_query("client_secret", &self.secret_key);

        let response = request
            .to_reqwest(&self.client)?
            .send()
            .await
            .map_err(network_failure)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(network_failure)?;

        let body: OAuthResponse = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(_) if status >= 400 => return Err(exchange_failure(status, text)),
            Err(e) => {
                return Err(QianfanError::auth(format!(
                    "unexpected OAuth response: {}",
                    e
                )));
            }
        };

        if let Some(error) = body.error {
            let description = body.error_description.unwrap_or_default();
            return Err(if status >= 500 {
                exchange_failure(status, format!("{}: {}", error, description))
            } else {
                QianfanError::auth(format!("{}: {}", error, description))
            });
        }
        if status >= 400 {
            return Err(exchange_failure(status, text));
        }

        let value = body
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| QianfanError::auth("OAuth response carries no access_token"))?;
        Ok(IssuedToken {
            value,
            expires_in: Duration::from_secs(body.expires_in.unwrap_or(0)),
        })
    }

    fn name(&self) -> &'static str {
        "oauth"
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BearerTokenResponse {
    token: Option<String>,
    expire_time: Option<String>,
    message: Option<String>,
}

/// IAM bearer token issuance, signed with `bce-auth-v1`
#[derive(Debug, Clone)]
pub struct IamBearerExchange {
    client: reqwest::Client,
    iam_base_url: String,
    signer: BceSigner,
    expire_in_secs: u64,
}

impl IamBearerExchange {
    pub fn new(
        client: reqwest::Client,
        iam_base_url: impl Into<String>,
        signer: BceSigner,
        expire_in_secs: u64,
    ) -> Self {
        Self {
            client,
            iam_base_url: iam_base_url.into(),
            signer,
            expire_in_secs,
        }
    }
}

#[async_trait]
impl TokenExchange for IamBearerExchange {
    async fn exchange(&self) -> QianfanResult<IssuedToken> {
        let url = format!(
            "{}/v1/BCE-BEARER/token",
            self.iam_base_url.trim_end_matches('/')
        );
        let mut request = PreparedRequest::get(url)?
            .with_query("expireInSeconds", self.expire_in_secs.to_string());
        self.signer.sign(&mut request)?;

        let response = request
            .to_reqwest(&self.client)?
            .send()
            .await
            .map_err(network_failure)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(network_failure)?;
        let body: Option<BearerTokenResponse> = serde_json::from_str(&text).ok();

        if status >= 400 {
            let message = body.and_then(|b| b.message).unwrap_or(text);
            return Err(exchange_failure(status, message));
        }
        let body = body.ok_or_else(|| QianfanError::auth("unexpected IAM token response"))?;

        let value = body
            .token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| QianfanError::auth("IAM response carries no token"))?;

        let expires_in = body
            .expire_time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .and_then(|t| (t.with_timezone(&Utc) - Utc::now()).to_std().ok())
            .unwrap_or(Duration::from_secs(self.expire_in_secs));

        Ok(IssuedToken { value, expires_in })
    }

    fn name(&self) -> &'static str {
        "iam-bearer"
    }
}
