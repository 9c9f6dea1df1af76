use crate::provider::Service;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Registered services by name.
///
/// Services are published behind an `Arc`, so a lookup either sees the previous
/// service or the replacement, never a partially built one.
#[derive(Default)]
pub(crate) struct Registry {
    services: RwLock<HashMap<String, Arc<Service>>>,
}

impl Registry {
    /// Installs `service`, replacing any service previously registered under its name.
    pub(crate) fn insert(&self, service: Service) -> Option<Arc<Service>> {
        let name = service.name.clone();
        self.services.write().insert(name, Arc::new(service))
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<Arc<Service>> {
        self.services.read().get(name).cloned()
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.services.read().contains_key(name)
    }
}
