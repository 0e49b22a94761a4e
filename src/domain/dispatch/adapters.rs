use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::chain::BackendId;
use crate::domain::llm::BackendAdapter;
use crate::domain::DomainError;

/// Lookup table from backend id to its adapter. Populated once at startup
/// from the configured backends; the dispatcher only reads from it.
#[derive(Debug, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn BackendAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own backend name, replacing any
    /// previous registration for that name.
    pub fn register(&mut self, adapter: Arc<dyn BackendAdapter>) {
        self.adapters
            .insert(adapter.backend_name().to_string(), adapter);
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn BackendAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn get(&self, backend: &BackendId) -> Result<&Arc<dyn BackendAdapter>, DomainError> {
        self.adapters
            .get(backend.as_str())
            .ok_or_else(|| DomainError::unknown_backend(backend.as_str()))
    }

    pub fn contains(&self, backend: &BackendId) -> bool {
        self.adapters.contains_key(backend.as_str())
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.adapters.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
