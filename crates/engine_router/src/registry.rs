//! Registry of engine spots
//!
//! Owns one client per descriptor and hands the orchestrator a ranked list of
//! usable clients. Ranking itself is delegated to [`crate::selector`].

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::RwLock;
use reqwest::Client;
use tracing::info;

use crate::backend::{EvalBackend, HttpBackend};
use crate::config::RouterConfig;
use crate::descriptor::BackendDescriptor;
use crate::health::BackendHealth;
use crate::selector;

struct Entry {
    descriptor: BackendDescriptor,
    client: Arc<dyn EvalBackend>,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    /// Registration order, for stable listings
    order: Vec<String>,
}

/// Set of registered backends keyed by descriptor id
pub struct BackendRegistry {
    inner: RwLock<Inner>,
    http: Client,
    config: RouterConfig,
}

impl BackendRegistry {
    pub fn new(config: RouterConfig) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            http: Client::new(),
            config,
        }
    }

    /// Build a registry and register every descriptor
    pub fn with_descriptors(
        config: RouterConfig,
        descriptors: impl IntoIterator<Item = BackendDescriptor>,
    ) -> Self {
        let registry = Self::new(config);
        for descriptor in descriptors {
            registry.register(descriptor);
        }
        registry
    }

    /// Upsert an HTTP spot keyed by `descriptor.id`
    pub fn register(&self, descriptor: BackendDescriptor) {
        let client = Arc::new(HttpBackend::new(
            descriptor.clone(),
            self.http.clone(),
            self.config.attempt_timeout,
            self.config.probe_timeout,
        ));
        self.register_backend(descriptor, client);
    }

    /// Upsert a backend with a custom client
    ///
    /// Replacing an existing id resets its health, since the client is new.
    pub fn register_backend(&self, descriptor: BackendDescriptor, client: Arc<dyn EvalBackend>) {
        let mut inner = self.inner.write();
        let id = descriptor.id.clone();
        let previous = inner.entries.insert(id.clone(), Entry { descriptor, client });
        if previous.is_some() {
            info!(backend = %id, "replacing registered spot");
        } else {
            info!(backend = %id, "registered spot");
            inner.order.push(id);
        }
    }

    /// Enable a backend; `false` if the id is unknown
    pub fn enable(&self, id: &str) -> bool {
        self.set_enabled(id, true)
    }

    /// Disable a backend; `false` if the id is unknown
    pub fn disable(&self, id: &str) -> bool {
        self.set_enabled(id, false)
    }

    fn set_enabled(&self, id: &str, enabled: bool) -> bool {
        let mut inner = self.inner.write();
        match inner.entries.get_mut(id) {
            Some(entry) => {
                if entry.descriptor.enabled != enabled {
                    info!(backend = %id, enabled, "spot toggled");
                }
                entry.descriptor.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn descriptor(&self, id: &str) -> Option<BackendDescriptor> {
        self.inner.read().entries.get(id).map(|e| e.descriptor.clone())
    }

    /// Current (descriptor, health) pair of every backend, in registration order
    pub fn snapshot(&self) -> Vec<(BackendDescriptor, BackendHealth)> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.entries.get(id))
            .map(|entry| (entry.descriptor.clone(), entry.client.health().snapshot()))
            .collect()
    }

    /// Ranked clients the orchestrator may try, best first
    pub fn usable_backends(&self) -> Vec<Arc<dyn EvalBackend>> {
        let pairs = self.snapshot();
        let ranked = selector::rank(&pairs);
        let inner = self.inner.read();
        ranked
            .iter()
            .filter_map(|descriptor| inner.entries.get(&descriptor.id))
            .map(|entry| Arc::clone(&entry.client))
            .collect()
    }

    /// Probe every registered backend concurrently
    ///
    /// Out-of-band monitoring only; the request path never calls this.
    pub async fn probe_all(&self) -> Vec<(String, bool)> {
        let clients: Vec<Arc<dyn EvalBackend>> = {
            let inner = self.inner.read();
            inner
                .order
                .iter()
                .filter_map(|id| inner.entries.get(id))
                .map(|entry| Arc::clone(&entry.client))
                .collect()
        };
        let results = join_all(clients.iter().map(|client| client.health_check())).await;
        clients
            .iter()
            .zip(results)
            .map(|(client, ok)| (client.id().to_string(), ok))
            .collect()
    }
}
