//! Backend registry
//!
//! Maps a package-manager name to a factory building its `BackendConfig` for
//! a project directory. Built once per invocation and passed down; nothing is
//! discovered from the filesystem.

use super::{bower, composer, npm, BackendConfig};
use crate::error::{DepcacheError, DepcacheResult};
use std::path::Path;
use std::sync::Arc;

/// Builds a backend for a project directory
pub type BackendFactory = Arc<dyn Fn(&Path) -> DepcacheResult<BackendConfig> + Send + Sync>;

struct Entry {
    name: String,
    manifest: String,
    factory: BackendFactory,
}

/// Ordered name -> factory table
#[derive(Default)]
pub struct BackendRegistry {
    entries: Vec<Entry>,
}

impl BackendRegistry {
    /// Registry with npm, bower and composer
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        registry.register(npm::NAME, &npm::MANIFESTS.join(" | "), Arc::new(npm::config));
        registry.register(bower::NAME, bower::MANIFEST, Arc::new(bower::config));
        registry.register(composer::NAME, composer::MANIFEST, Arc::new(composer::config));
        registry
    }

    /// Add a backend, replacing any existing one with the same name
    pub fn register(&mut self, name: &str, manifest: &str, factory: BackendFactory) {
        let entry = Entry {
            name: name.to_string(),
            manifest: manifest.to_string(),
            factory,
        };
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Registered names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// `(name, manifest)` pairs in registration order
    pub fn describe(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .map(|e| (e.name.as_str(), e.manifest.as_str()))
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Build the named backend for `project_dir`
    pub fn create(&self, name: &str, project_dir: &Path) -> DepcacheResult<BackendConfig> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| DepcacheError::UnknownBackend(name.to_string()))?;
        (entry.factory)(project_dir)
    }
}
