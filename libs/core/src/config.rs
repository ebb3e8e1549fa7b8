use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::resolver::{AddressResolver, EnvResolver};

type ReadyCallback = Box<dyn FnOnce(Arc<dyn AddressResolver>) + Send>;

/// Readiness notification for address resolvers
///
/// Clients register one-shot callbacks with [`ConfigRegistry::on_ready`];
/// they fire once a resolver is supplied through [`ConfigRegistry::mark_ready`].
/// Cloning the registry yields another handle to the same state.
#[derive(Clone, Default)]
pub struct ConfigRegistry {
    inner: Arc<Mutex<RegistryState>>,
}

#[derive(Default)]
struct RegistryState {
    resolver: Option<Arc<dyn AddressResolver>>,
    pending: Vec<ReadyCallback>,
}

impl ConfigRegistry {
    /// Create a registry that is not ready yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry that is already ready with the given resolver
    pub fn ready(resolver: impl AddressResolver + 'static) -> Self {
        let registry = Self::new();
        registry.mark_ready(Arc::new(resolver));
        registry
    }

    /// Create a registry already ready with an [`EnvResolver`]
    pub fn from_env() -> Self {
        Self::ready(EnvResolver::new())
    }

    /// Register a callback to run once a resolver is available
    ///
    /// Runs the callback immediately, on the calling thread, if the registry
    /// is already ready.
    pub fn on_ready<F>(&self, callback: F)
    where
        F: FnOnce(Arc<dyn AddressResolver>) + Send + 'static,
    {
        let resolver = {
            let mut state = self.inner.lock();
            match state.resolver.clone() {
                Some(resolver) => resolver,
                None => {
                    state.pending.push(Box::new(callback));
                    debug!(pending = state.pending.len(), "registered readiness callback");
                    return;
                }
            }
        };

        callback(resolver);
    }

    /// Supply the resolver and fire every pending callback in registration order
    ///
    /// Callbacks run outside the internal lock, so they may register further
    /// callbacks. Calling this again replaces the resolver handed to later
    /// registrations; callbacks that already fired are not run again.
    pub fn mark_ready(&self, resolver: Arc<dyn AddressResolver>) {
        let pending = {
            let mut state = self.inner.lock();
            state.resolver = Some(resolver.clone());
            std::mem::take(&mut state.pending)
        };

        debug!(callbacks = pending.len(), "configuration ready");
        for callback in pending {
            callback(resolver.clone());
        }
    }

    pub fn is_ready(&self) -> bool {
        self.inner.lock().resolver.is_some()
    }

    /// The current resolver, if the registry is ready
    pub fn resolver(&self) -> Option<Arc<dyn AddressResolver>> {
        self.inner.lock().resolver.clone()
    }
}

impl std::fmt::Debug for ConfigRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("ConfigRegistry")
            .field("ready", &state.resolver.is_some())
            .field("pending", &state.pending.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::resolver::StaticResolver;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn resolver() -> Arc<dyn AddressResolver> {
        Arc::new(StaticResolver::new().with_address("users", "rest", "http://users"))
    }

    #[test]
    fn callbacks_wait_until_ready() {
        let registry = ConfigRegistry::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        registry.on_ready(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!registry.is_ready());
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        registry.mark_ready(resolver());

        assert!(registry.is_ready());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn callbacks_fire_once_in_registration_order() {
        let registry = ConfigRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for id in 0..3 {
            let order = order.clone();
            registry.on_ready(move |_| order.lock().push(id));
        }

        registry.mark_ready(resolver());
        registry.mark_ready(resolver());

        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn late_registration_runs_immediately() {
        let registry = ConfigRegistry::ready(
            StaticResolver::new().with_address("users", "rest", "http://users"),
        );
        let address = Arc::new(Mutex::new(None));

        let slot = address.clone();
        registry.on_ready(move |resolver| {
            *slot.lock() = Some(resolver.service_address("users", "rest").unwrap());
        });

        assert_eq!(address.lock().as_deref(), Some("http://users"));
    }

    #[test]
    fn callback_receives_supplied_resolver() {
        let registry = ConfigRegistry::new();
        let seen = Arc::new(Mutex::new(String::new()));

        let slot = seen.clone();
        registry.on_ready(move |resolver| {
            *slot.lock() = resolver.service_address("billing", "rest").unwrap();
        });

        let custom = |resource: &str, port_type: &str| -> Result<String> {
            Ok(format!("http://{}:{}", resource, port_type))
        };
        registry.mark_ready(Arc::new(custom));

        assert_eq!(*seen.lock(), "http://billing:rest");
    }

    #[test]
    fn callbacks_may_register_more_callbacks() {
        let registry = ConfigRegistry::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let nested_registry = registry.clone();
        let counter = fired.clone();
        registry.on_ready(move |_| {
            let counter = counter.clone();
            nested_registry.on_ready(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        });

        registry.mark_ready(resolver());

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
