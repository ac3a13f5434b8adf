//! Registry of configured provider adapters, keyed by provider id.

use gateway_core::LLMProvider;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;

/// A provider adapter plus the static metadata the dispatcher schedules on.
pub struct ProviderEntry {
    /// The adapter itself.
    pub provider: Arc<dyn LLMProvider>,
    /// Dispatch priority; lower-numbered providers are preferred when a
    /// model is served by more than one.
    pub priority: u32,
    /// Relative weight among same-priority providers.
    pub weight: u32,
}

/// Holds every configured provider adapter, indexed by id.
#[derive(Default)]
pub struct ProviderRegistry {
    entries: RwLock<HashMap<String, ProviderEntry>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider adapter.
    ///
    /// # Errors
    /// Returns an error if the registry lock is poisoned.
    pub fn register(
        &self,
        provider: Arc<dyn LLMProvider>,
        priority: u32,
        weight: u32,
    ) -> Result<(), String> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| "provider registry lock poisoned".to_string())?;
        entries.insert(
            provider.id().to_string(),
            ProviderEntry {
                provider,
                priority,
                weight,
            },
        );
        Ok(())
    }

    /// Fetch a provider adapter by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<dyn LLMProvider>> {
        self.entries
            .read()
            .ok()?
            .get(id)
            .map(|entry| Arc::clone(&entry.provider))
    }

    /// Number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether no providers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All registered provider ids.
    #[must_use]
    pub fn provider_ids(&self) -> Vec<String> {
        self.entries
            .read()
            .map(|e| e.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Find every provider serving the given model id.
    #[must_use]
    pub fn providers_for_model(&self, model: &str) -> Vec<Arc<dyn LLMProvider>> {
        let Ok(entries) = self.entries.read() else {
            return Vec::new();
        };
        let mut matches: Vec<&ProviderEntry> = entries
            .values()
            .filter(|entry| {
                entry
                    .provider
                    .models()
                    .iter()
                    .any(|m| m.id == model || m.alias.as_deref() == Some(model))
            })
            .collect();
        matches.sort_by_key(|entry| entry.priority);
        matches
            .into_iter()
            .map(|entry| Arc::clone(&entry.provider))
            .collect()
    }
}
