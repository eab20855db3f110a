//! Qianfan client
//!
//! Facade over the workspace crates: [`qianfan_sdk`] for the client and
//! [`qianfan_core`] for the individual building blocks.

pub use qianfan_core;
pub use qianfan_sdk::*;
