//! Generator registry -- a named collection of available image generators.
//!
//! The CLI resolves the configured backend name (e.g. `backend = "offline"`)
//! against this registry when it builds a session.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::offline::OfflineGenerator;
use super::trait_def::ImageGenerator;

/// A collection of registered [`ImageGenerator`] implementations, keyed by
/// name.
#[derive(Default)]
pub struct GeneratorRegistry {
    generators: HashMap<String, Arc<dyn ImageGenerator>>,
}

impl GeneratorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every generator that ships with this crate.
    ///
    /// `latency` is the simulated delay of the offline generator.
    pub fn builtin(latency: Duration) -> Self {
        let mut registry = Self::new();
        registry.register(OfflineGenerator::with_latency(latency));
        registry
    }

    /// Register a generator under [`ImageGenerator::name`], replacing and
    /// returning any generator already registered under that name.
    pub fn register(
        &mut self,
        generator: impl ImageGenerator + 'static,
    ) -> Option<Arc<dyn ImageGenerator>> {
        let name = generator.name().to_string();
        self.generators.insert(name, Arc::new(generator))
    }

    /// Look up a generator by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ImageGenerator>> {
        self.generators.get(name).cloned()
    }

    /// Names of all registered generators, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.generators.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("generators", &self.list())
            .finish()
    }
}
