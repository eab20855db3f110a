//! Configuration management
//!
//! Settings come from code (`ClientConfig::new(..).with_*`) or from
//! `QIANFAN_*` environment variables, optionally through a `.env` file.

mod client_config;
mod credentials;
mod env_loader;

pub use client_config::{
    ClientConfig, DEFAULT_BASE_URL, DEFAULT_CONSOLE_BASE_URL, DEFAULT_IAM_BASE_URL,
    DEFAULT_OAUTH_URL,
};
pub use credentials::{AuthMode, Credentials};
pub use env_loader::{ENV_PREFIX, load_from_env, load_from_lookup};
