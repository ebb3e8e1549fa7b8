//! Courier REST - HTTP client for services found through discovery
//!
//! A [`RestClient`] is bound to a logical resource name. Its base URL is
//! looked up once through an [`AddressResolver`](courier_core::AddressResolver),
//! after which the verb methods send requests, optionally adjusted by
//! [`RequestModifier`]s, and hand back the raw `reqwest::Response`.
//!
//! # Example
//!
//! ```no_run
//! use courier_core::ConfigRegistry;
//! use courier_rest::{query_parameters, RestClient};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Search { name: String }
//!
//! #[derive(Serialize)]
//! struct NewUser { name: String }
//!
//! # async fn example() -> courier_rest::Result<()> {
//! // Addresses come from COURIER_SERVICE_USERS_REST
//! let registry = ConfigRegistry::from_env();
//! let client = RestClient::with_auto_init("users", &registry);
//!
//! let url = client.resolve_url("/api/v1/users");
//! let found = client
//!     .get(&url, [query_parameters(Search { name: "john".into() })])
//!     .await?;
//!
//! let created = client
//!     .post(&url, &NewUser { name: "jane".into() }, [])
//!     .await?;
//! # let _ = (found, created);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod modifier;

// Re-exports for convenience
pub use client::{RestClient, SERVICE_TYPE};
pub use error::{Error, Result};
pub use modifier::{
    bearer_auth, header, modifier, query_parameters, try_query_parameters, RequestModifier,
};
