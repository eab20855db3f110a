//! Endpoint resolution for model APIs

mod capability;
mod catalog;
mod resolver;
pub mod static_table;


pub use capability::Capability;
pub use catalog::{ConsoleServiceCatalog, MODEL_API_SEGMENT, ServiceCatalog, suffix_from_url};
pub use resolver::{
    DEFAULT_ENDPOINT_TTL, DEFAULT_REFRESH_COOLDOWN, DEFAULT_REFRESH_WAIT, EndpointResolver,
    MODEL_API_PREFIX,
};
