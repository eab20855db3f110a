//! Request signing strategies

use super::bce::BceSigner;
use super::token::TokenCache;
use crate::error::{QianfanError, QianfanResult};
use crate::transport::PreparedRequest;
use std::sync::Arc;
use tracing::debug;

/// Query parameter carrying an OAuth access token
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

/// Where a bearer token is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPlacement {
    /// `Authorization: Bearer <token>`
    Header,
    /// `?access_token=<token>`
    Query,
}

/// Where a bearer token comes from
#[derive(Debug, Clone)]
pub enum TokenSource {
    /// Issued ahead of time, never refreshed
    Static(String),
    /// Obtained and refreshed through a [`TokenCache`]
    Cached(Arc<TokenCache>),
}

impl TokenSource {
    async fn token(&self) -> QianfanResult<String> {
        match self {
            Self::Static(token) if token.trim().is_empty() => Err(
                QianfanError::validation_field("access token is empty", "access_token"),
            ),
            Self::Static(token) => Ok(token.clone()),
            Self::Cached(cache) => cache.get_token().await,
        }
    }
}

/// Authentication strategy, selected once when the client is built
#[derive(Debug, Clone)]
pub enum Signer {
    /// Per-request `bce-auth-v1` signature
    Hmac(BceSigner),
    Bearer {
        source: TokenSource,
        placement: TokenPlacement,
    },
}

impl Signer {
    /// Attach credentials to the request
    ///
    /// Fails before anything is sent when credentials are missing or the
    /// URL is malformed.
    pub async fn sign(&self, request: &mut PreparedRequest) -> QianfanResult<()> {
        match self {
            Self::Hmac(signer) => signer.sign(request),
            Self::Bearer { source, placement } => {
                // Validates the URL the same way signing does
                request.host()?;
                let token = source.token().await?;
                match placement {
                    TokenPlacement::Header => {
                        request.set_header("Authorization", format!("Bearer {}", token));
                    }
                    TokenPlacement::Query => request.set_query(ACCESS_TOKEN_PARAM, token),
                }
                Ok(())
            }
        }
    }

    /// Drop a cached token after the service rejected it
    ///
    /// Returns whether a new token will be fetched on the next call.
    pub fn invalidate_token(&self) -> bool {
        match self {
            Self::Bearer {
                source: TokenSource::Cached(cache),
                ..
            } => cache.invalidate(),
            _ => {
                debug!("no refreshable token to invalidate");
                false
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Hmac(_) => "bce-auth-v1",
            Self::Bearer {
                source: TokenSource::Static(_),
                ..
            } => "static-token",
            Self::Bearer {
                source: TokenSource::Cached(_),
                ..
            } => "cached-token",
        }
    }
}
