use std::collections::HashMap;
use std::env;

use crate::error::{Error, Result};

/// Maps a logical resource name and port type to a network address
///
/// Implemented by service-discovery providers. Closures with the matching
/// signature implement it too, which keeps test doubles short.
pub trait AddressResolver: Send + Sync {
    /// Resolve the address of `resource_name` for the given `port_type`
    fn service_address(&self, resource_name: &str, port_type: &str) -> Result<String>;
}

impl<F> AddressResolver for F
where
    F: Fn(&str, &str) -> Result<String> + Send + Sync,
{
    fn service_address(&self, resource_name: &str, port_type: &str) -> Result<String> {
        self(resource_name, port_type)
    }
}

/// In-memory resolver backed by a fixed address table
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    addresses: HashMap<(String, String), String>,
}

impl StaticResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the address of a resource for a port type
    pub fn with_address(
        mut self,
        resource_name: impl Into<String>,
        port_type: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        self.addresses
            .insert((resource_name.into(), port_type.into()), address.into());
        self
    }
}

impl AddressResolver for StaticResolver {
    fn service_address(&self, resource_name: &str, port_type: &str) -> Result<String> {
        self.addresses
            .get(&(resource_name.to_string(), port_type.to_string()))
            .cloned()
            .ok_or_else(|| Error::resolve(resource_name, port_type, "no address registered"))
    }
}

/// Resolver reading addresses from environment variables
///
/// The variable for a resource is `<PREFIX>_<RESOURCE>_<PORTTYPE>`, with the
/// resource and port type uppercased and every non-alphanumeric character
/// replaced by `_`. For example `user-service` on port type `rest` reads
/// `COURIER_SERVICE_USER_SERVICE_REST`.
#[derive(Debug, Clone)]
pub struct EnvResolver {
    prefix: String,
}

impl EnvResolver {
    pub const DEFAULT_PREFIX: &'static str = "COURIER_SERVICE";

    pub fn new() -> Self {
        Self::with_prefix(Self::DEFAULT_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Name of the variable consulted for a resource and port type
    pub fn variable_name(&self, resource_name: &str, port_type: &str) -> String {
        format!(
            "{}_{}_{}",
            self.prefix,
            env_segment(resource_name),
            env_segment(port_type)
        )
    }
}

impl Default for EnvResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressResolver for EnvResolver {
    fn service_address(&self, resource_name: &str, port_type: &str) -> Result<String> {
        let name = self.variable_name(resource_name, port_type);
        match env::var(&name) {
            Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
            Ok(_) => Err(Error::resolve(
                resource_name,
                port_type,
                format!("{} is empty", name),
            )),
            Err(e) => Err(Error::resolve(
                resource_name,
                port_type,
                format!("{}: {}", name, e),
            )),
        }
    }
}

fn env_segment(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn closure_resolver_receives_resource_and_port_type() {
        let resolver = |resource: &str, port_type: &str| -> Result<String> {
            Ok(format!("http://{}/{}", resource, port_type))
        };

        let address = resolver.service_address("users", "rest").unwrap();
        assert_eq!(address, "http://users/rest");
    }

    #[test]
    fn static_resolver_returns_registered_address() {
        let resolver = StaticResolver::new()
            .with_address("users", "rest", "http://localhost:8080")
            .with_address("users", "grpc", "http://localhost:9090");

        assert_eq!(
            resolver.service_address("users", "rest").unwrap(),
            "http://localhost:8080"
        );
        assert_eq!(
            resolver.service_address("users", "grpc").unwrap(),
            "http://localhost:9090"
        );
    }

    #[test]
    fn static_resolver_rejects_unknown_resource() {
        let resolver = StaticResolver::new();

        match resolver.service_address("orders", "rest") {
            Err(Error::Resolve {
                resource,
                port_type,
                ..
            }) => {
                assert_eq!(resource, "orders");
                assert_eq!(port_type, "rest");
            }
            other => panic!("Expected Resolve error, got {:?}", other),
        }
    }

    #[test]
    fn env_variable_name_is_normalized() {
        let resolver = EnvResolver::new();
        assert_eq!(
            resolver.variable_name("user-service", "rest"),
            "COURIER_SERVICE_USER_SERVICE_REST"
        );

        let resolver = EnvResolver::with_prefix("APP");
        assert_eq!(resolver.variable_name("a.b", "rest"), "APP_A_B_REST");
    }

    #[test]
    #[serial]
    fn env_resolver_reads_variable() {
        env::set_var("COURIER_SERVICE_INVENTORY_REST", " http://inventory:8080/ ");

        let address = EnvResolver::new()
            .service_address("inventory", "rest")
            .unwrap();
        assert_eq!(address, "http://inventory:8080/");

        env::remove_var("COURIER_SERVICE_INVENTORY_REST");
    }

    #[test]
    #[serial]
    fn env_resolver_fails_for_missing_or_blank_variable() {
        env::remove_var("COURIER_SERVICE_BILLING_REST");
        assert!(EnvResolver::new().service_address("billing", "rest").is_err());

        env::set_var("COURIER_SERVICE_BILLING_REST", "   ");
        assert!(EnvResolver::new().service_address("billing", "rest").is_err());

        env::remove_var("COURIER_SERVICE_BILLING_REST");
    }
}
