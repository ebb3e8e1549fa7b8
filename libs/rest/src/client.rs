use std::fmt::{self, Display};
use std::sync::{Arc, Weak};

use courier_core::{AddressResolver, ConfigRegistry};
use parking_lot::RwLock;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Request, Response};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::modifier::RequestModifier;

/// Port type requested from the resolver
pub const SERVICE_TYPE: &str = "rest";

/// REST client bound to a logical service name
///
/// The base URL is resolved once, either explicitly with
/// [`RestClient::init_with`] or when a [`ConfigRegistry`] becomes ready.
/// Clones share the resolved state and the underlying HTTP transport.
///
/// ```no_run
/// use courier_core::StaticResolver;
/// use courier_rest::{bearer_auth, RestClient};
///
/// # async fn example() -> courier_rest::Result<()> {
/// let resolver = StaticResolver::new().with_address("users", "rest", "http://users:8080/");
/// let client = RestClient::new("users").init_with(&resolver);
///
/// let url = client.resolve_url(format_args!("/api/v1/users/{}", 42));
/// let response = client.get(&url, [bearer_auth("token")?]).await?;
/// println!("{}", response.status());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<Inner>,
    http: reqwest::Client,
}

struct Inner {
    resource_name: String,
    state: RwLock<State>,
}

enum State {
    Uninitialized,
    Ready { base_url: String },
}

impl Inner {
    /// Resolve and store the base URL; the write lock guards the transition
    fn initialize<R>(&self, resolver: &R) -> courier_core::Result<()>
    where
        R: AddressResolver + ?Sized,
    {
        let mut state = self.state.write();
        if let State::Ready { .. } = *state {
            return Err(courier_core::Error::AlreadyInitialized(
                self.resource_name.clone(),
            ));
        }

        let address = resolver.service_address(&self.resource_name, SERVICE_TYPE)?;
        let base_url = normalize_base_url(&address);

        info!(resource = %self.resource_name, base_url = %base_url, "REST client ready");
        *state = State::Ready { base_url };
        Ok(())
    }

    fn initialize_or_abort<R>(&self, resolver: &R)
    where
        R: AddressResolver + ?Sized,
    {
        if let Err(e) = self.initialize(resolver) {
            error!(resource = %self.resource_name, error = %e, "REST client initialization failed");
            panic!("{}", e);
        }
    }
}

impl RestClient {
    /// Create a client that is initialized explicitly with [`RestClient::init_with`]
    pub fn new(resource_name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                resource_name: resource_name.into(),
                state: RwLock::new(State::Uninitialized),
            }),
            http: reqwest::Client::new(),
        }
    }

    /// Create a client that initializes itself once `registry` is ready
    ///
    /// Never blocks. If the registry is already ready the client is
    /// initialized before this returns. Initialization failures inside the
    /// readiness callback panic, like [`RestClient::init_with`].
    pub fn with_auto_init(resource_name: impl Into<String>, registry: &ConfigRegistry) -> Self {
        let client = Self::new(resource_name);
        let inner: Weak<Inner> = Arc::downgrade(&client.inner);

        registry.on_ready(move |resolver| {
            if let Some(inner) = inner.upgrade() {
                inner.initialize_or_abort(resolver.as_ref());
            }
        });

        client
    }

    /// Use `http` as the transport instead of a fresh `reqwest::Client`
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Initialize the client from `resolver`
    ///
    /// # Panics
    ///
    /// Panics if the client is already initialized or the resolver fails;
    /// both mean the client was wired up incorrectly.
    pub fn init_with<R>(self, resolver: &R) -> Self
    where
        R: AddressResolver + ?Sized,
    {
        self.inner.initialize_or_abort(resolver);
        self
    }

    /// Initialize the client from `resolver`, returning failures instead of panicking
    pub fn try_init_with<R>(&self, resolver: &R) -> Result<()>
    where
        R: AddressResolver + ?Sized,
    {
        Ok(self.inner.initialize(resolver)?)
    }

    pub fn resource_name(&self) -> &str {
        &self.inner.resource_name
    }

    /// The resolved base URL, empty until the client is initialized
    pub fn base_url(&self) -> String {
        match &*self.inner.state.read() {
            State::Ready { base_url } => base_url.clone(),
            State::Uninitialized => String::new(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.inner.state.read(), State::Ready { .. })
    }

    /// Prefix `path` with the base URL
    ///
    /// Templates are written with `format_args!`:
    /// `client.resolve_url(format_args!("/users/{}", id))`. Nothing checks
    /// that the client is initialized; before that the path is returned as is.
    pub fn resolve_url(&self, path: impl Display) -> String {
        match &*self.inner.state.read() {
            State::Ready { base_url } => format!("{}{}", base_url, path),
            State::Uninitialized => path.to_string(),
        }
    }

    /// Send a GET request to `url`
    ///
    /// Only construction and transport failures are errors; the response is
    /// returned whatever its status code.
    pub async fn get(
        &self,
        url: &str,
        modifiers: impl IntoIterator<Item = RequestModifier>,
    ) -> Result<Response> {
        let request = self.build(Method::GET, url, None, modifiers)?;
        self.dispatch(request).await
    }

    /// Send a DELETE request to `url`
    pub async fn delete(
        &self,
        url: &str,
        modifiers: impl IntoIterator<Item = RequestModifier>,
    ) -> Result<Response> {
        let request = self.build(Method::DELETE, url, None, modifiers)?;
        self.dispatch(request).await
    }

    /// Send a POST request to `url` with `body` encoded as JSON
    pub async fn post<B>(
        &self,
        url: &str,
        body: &B,
        modifiers: impl IntoIterator<Item = RequestModifier>,
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(body)?;
        let request = self.build(Method::POST, url, Some(body), modifiers)?;
        self.dispatch(request).await
    }

    /// Send a PUT request to `url` with `body` encoded as JSON
    pub async fn put<B>(
        &self,
        url: &str,
        body: &B,
        modifiers: impl IntoIterator<Item = RequestModifier>,
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(body)?;
        let request = self.build(Method::PUT, url, Some(body), modifiers)?;
        self.dispatch(request).await
    }

    /// Send a PATCH request to `url` with `body` encoded as JSON
    pub async fn patch<B>(
        &self,
        url: &str,
        body: &B,
        modifiers: impl IntoIterator<Item = RequestModifier>,
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(body)?;
        let request = self.build(Method::PATCH, url, Some(body), modifiers)?;
        self.dispatch(request).await
    }

    fn build(
        &self,
        method: Method,
        url: &str,
        json_body: Option<Vec<u8>>,
        modifiers: impl IntoIterator<Item = RequestModifier>,
    ) -> Result<Request> {
        let mut builder = self.http.request(method, url);
        if let Some(body) = json_body {
            builder = builder
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body);
        }

        let mut request = builder.build()?;
        for modify in modifiers {
            modify(&mut request);
        }
        Ok(request)
    }

    async fn dispatch(&self, request: Request) -> Result<Response> {
        debug!(method = %request.method(), url = %request.url(), "dispatching request");
        Ok(self.http.execute(request).await?)
    }
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("resource_name", &self.inner.resource_name)
            .field("base_url", &self.base_url())
            .field("ready", &self.is_ready())
            .finish()
    }
}

/// Lowercase the address and drop one trailing slash
fn normalize_base_url(address: &str) -> String {
    let lowered = address.to_lowercase();
    match lowered.strip_suffix('/') {
        Some(trimmed) => trimmed.to_string(),
        None => lowered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_trailing_slash() {
        assert_eq!(normalize_base_url("HTTP://Example.com/"), "http://example.com");
        assert_eq!(normalize_base_url("http://example.com"), "http://example.com");
        assert_eq!(normalize_base_url("http://example.com//"), "http://example.com/");
        assert_eq!(normalize_base_url(""), "");
    }

    #[test]
    fn resolve_url_concatenates_base_and_path() {
        let client = RestClient::new("users");
        assert_eq!(client.resolve_url("/api/users"), "/api/users");

        let resolver = |_: &str, _: &str| -> courier_core::Result<String> {
            Ok("http://Users:8080/".to_string())
        };
        let client = client.init_with(&resolver);
        assert_eq!(
            client.resolve_url(format_args!("/api/users/{}/orders/{}", 7, "x")),
            "http://users:8080/api/users/7/orders/x"
        );
    }

    #[test]
    fn resolver_receives_rest_port_type() {
        let resolver = |resource: &str, port_type: &str| -> courier_core::Result<String> {
            assert_eq!(resource, "billing");
            assert_eq!(port_type, SERVICE_TYPE);
            Ok("http://billing".to_string())
        };

        let client = RestClient::new("billing").init_with(&resolver);
        assert_eq!(client.base_url(), "http://billing");
    }
}
