//! Courier Core - service discovery and request encoding primitives
//!
//! Provides the [`AddressResolver`] seam used to look up service addresses,
//! the [`ConfigRegistry`] that announces when a resolver becomes available,
//! and [`to_query_string`] for encoding flat records as URL query strings.

pub mod config;
pub mod error;
pub mod query;
pub mod resolver;

// Re-exports for convenience
pub use config::ConfigRegistry;
pub use error::{Error, Result};
pub use query::to_query_string;
pub use resolver::{AddressResolver, EnvResolver, StaticResolver};
