//! Error types for the Qianfan request core
//!
//! Every layer (signer, token cache, resolver, rate limiter, transport) reports
//! failures through [`QianfanError`]. Only the retry policy decides whether a
//! failure is retried; the variants carry enough detail to tell a
//! configuration problem from a non-retryable API error from exhausted retries.

pub mod codes;
mod constructors;
mod conversions;
mod types;

#[cfg(test)]
mod tests;

pub use types::{QianfanError, QianfanResult};
