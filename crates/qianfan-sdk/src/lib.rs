//! Qianfan SDK
//!
//! This crate assembles the request core into [`QianfanClient`], the entry
//! point used by request builders: give it a capability, a model and a JSON
//! body, and it resolves the endpoint, waits for rate-limit quota, signs the
//! request and retries transient failures.
//!
//! # Example
//!
//! ```no_run
//! use qianfan_sdk::{Capability, QianfanClient};
//! use serde_json::json;
//!
//! # async fn example() -> qianfan_sdk::QianfanResult<()> {
//! let client = QianfanClient::from_env()?;
//! let response = client
//!     .request(
//!         Capability::Chat,
//!         Some("ERNIE-4.0-8K"),
//!         None,
//!         json!({"messages": [{"role": "user", "content": "hi"}]}),
//!     )
//!     .await?;
//! println!("{}", response.body["result"]);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod logging;

pub use client::{QianfanClient, QianfanClientBuilder};
pub use logging::{init_json_tracing, init_tracing};

// Re-export commonly used types from core
pub use qianfan_core::{
    auth::{Signer, TokenPlacement},
    config::{ClientConfig, Credentials},
    endpoint::Capability,
    error::{QianfanError, QianfanResult},
    recovery::{RateLimitConfig, RetryConfig},
    transport::{EventStream, Method, PreparedRequest, QfResponse, StreamEvent},
};
