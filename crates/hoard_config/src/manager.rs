//! # Loot Manager
//!
//! Owns the live registry. Readers take a snapshot (`Arc<Registry>`) and
//! keep using it for as long as they like; a reload builds a complete new
//! registry off to the side and swaps it in.
//!
//! ```text
//! hoard.toml ──> LootLoader ──> Registry ──swap──> RegistryHandle
//!                                                       │
//!                              readers: registry() ─────┘ (Arc snapshot)
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hoard_core::{LootEntry, Registry};
use parking_lot::RwLock;

use crate::error::ConfigResult;
use crate::loader::{LoadReport, LootLoader, RegistrySetup};
use crate::settings::LootConfig;

/// Shared, swappable reference to the current registry.
#[derive(Clone, Default)]
pub struct RegistryHandle {
    current: Arc<RwLock<Arc<Registry>>>,
}

impl RegistryHandle {
    /// Creates a handle pointing at `registry`.
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(registry))),
        }
    }

    /// Snapshot of the current registry.
    #[must_use]
    pub fn current(&self) -> Arc<Registry> {
        Arc::clone(&self.current.read())
    }

    /// Replaces the registry, returning the previous one.
    #[must_use]
    pub fn replace(&self, registry: Registry) -> Arc<Registry> {
        std::mem::replace(&mut *self.current.write(), Arc::new(registry))
    }
}

impl std::fmt::Debug for RegistryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RegistryHandle").field(&*self.current.read()).finish()
    }
}

/// Loads loot configuration from a main file and keeps it current.
pub struct LootManager {
    path: PathBuf,
    setup: Option<RegistrySetup>,
    config: RwLock<LootConfig>,
    handle: RegistryHandle,
}

impl LootManager {
    /// Creates a manager for the main file at `path`. Nothing is loaded yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            setup: None,
            config: RwLock::new(LootConfig::default()),
            handle: RegistryHandle::default(),
        }
    }

    /// Runs `setup` on every registry this manager builds, before loading.
    #[must_use]
    pub fn with_setup<F>(mut self, setup: F) -> Self
    where
        F: Fn(&mut Registry) + Send + Sync + 'static,
    {
        let setup: RegistrySetup = Arc::new(setup);
        self.setup = Some(setup);
        self
    }

    /// Path of the main configuration file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the configuration and publishes the resulting registry.
    ///
    /// # Errors
    ///
    /// Fails only if the main file cannot be read or parsed; in that case
    /// the current registry stays in place. Individual objects and tables
    /// that fail are listed in the report.
    pub fn load(&self) -> ConfigResult<LoadReport> {
        tracing::info!("loading loot configuration from {}", self.path.display());
        self.rebuild()
    }

    /// Rebuilds the registry from disk and swaps it in.
    ///
    /// Snapshots taken before the reload keep the old registry.
    ///
    /// # Errors
    ///
    /// Same as [`LootManager::load`].
    pub fn reload(&self) -> ConfigResult<LoadReport> {
        tracing::info!("reloading loot configuration from {}", self.path.display());
        self.rebuild()
    }

    fn rebuild(&self) -> ConfigResult<LoadReport> {
        let config = LootConfig::load(&self.path)?;
        let base_dir = self.path.parent().unwrap_or_else(|| Path::new("."));

        let mut loader = LootLoader::new(&config, base_dir);
        if let Some(setup) = &self.setup {
            loader = loader.with_setup(Arc::clone(setup));
        }
        let (registry, report) = loader.load();

        // Outstanding snapshots keep the old registry alive
        let _previous = self.handle.replace(registry);
        *self.config.write() = config;
        Ok(report)
    }

    /// Snapshot of the current registry.
    #[must_use]
    pub fn registry(&self) -> Arc<Registry> {
        self.handle.current()
    }

    /// Handle to the live registry, for sharing with other owners.
    #[must_use]
    pub fn handle(&self) -> RegistryHandle {
        self.handle.clone()
    }

    /// Main configuration as last loaded.
    #[must_use]
    pub fn config(&self) -> LootConfig {
        self.config.read().clone()
    }

    /// Named loot table entry from the current registry.
    ///
    /// `None` if no such table loaded.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<Arc<LootEntry>> {
        self.registry().table_entry(name).cloned()
    }
}

impl std::fmt::Debug for LootManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LootManager")
            .field("path", &self.path)
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}
