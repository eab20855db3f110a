//! Authentication for outbound requests
//!
//! Provides:
//! - `bce-auth-v1` request signing with an access key / secret key pair
//! - Bearer tokens, either pre-issued or exchanged and cached
//! - OAuth `client_credentials` and IAM bearer token exchanges

mod bce;
pub mod canonical;
mod exchange;
mod signer;
mod token;

#[cfg(test)]
mod tests;

pub use bce::{AUTH_VERSION, BceSigner, Clock, DATE_HEADER, format_timestamp, system_clock};
pub use exchange::{IamBearerExchange, OAuthExchange, TokenExchange};
pub use signer::{ACCESS_TOKEN_PARAM, Signer, TokenPlacement, TokenSource};
pub use token::{DEFAULT_SAFETY_OFFSET, IssuedToken, Token, TokenCache};
