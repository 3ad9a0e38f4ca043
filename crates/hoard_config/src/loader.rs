//! # Batch Loader
//!
//! Builds a [`Registry`] from a [`LootConfig`] and its directories.
//!
//! ```text
//! reward types ──> rarities ──> loot objects ──> loot tables
//!                                   │                │
//!                              first pass       first pass
//!                                   │                │
//!                           retry quarantined  retry quarantined
//!                           until no progress  until no progress
//! ```
//!
//! Every item that fails with a configuration error is quarantined and
//! retried after the rest of its pass, so a table may reference another
//! table that sorts after it, and chains of such references resolve one
//! link per pass. Once a pass loads nothing new, the remaining items are
//! reported once and left out of the registry. Items are processed in
//! identifier order.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hoard_core::{EntryConfig, HoardResult, LootEntry, Registry};

use crate::error::{ConfigError, ConfigResult};
use crate::settings::LootConfig;

/// Extension of per-file objects and tables.
const FILE_EXTENSION: &str = "toml";

/// Hook applied to every freshly built registry before loading.
pub type RegistrySetup = Arc<dyn Fn(&mut Registry) + Send + Sync>;

/// One item that could not be loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadFailure {
    /// Identifier of the object or table (or the file path if unparsable).
    pub identifier: String,
    /// What went wrong.
    pub reason: String,
}

/// Outcome of a batch load.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Rarities registered.
    pub rarities_loaded: usize,
    /// Loot objects registered.
    pub objects_loaded: usize,
    /// Loot objects found.
    pub objects_total: usize,
    /// Loot tables registered.
    pub tables_loaded: usize,
    /// Loot tables found.
    pub tables_total: usize,
    /// Everything that failed, in failure order.
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    /// Returns `true` if every object and table loaded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, identifier: impl Into<String>, reason: &impl std::fmt::Display) {
        let failure = LoadFailure {
            identifier: identifier.into(),
            reason: reason.to_string(),
        };
        tracing::error!("failed to load {}: {}", failure.identifier, failure.reason);
        self.failures.push(failure);
    }
}

/// What a pass builds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Section {
    Objects,
    Tables,
}

impl Section {
    fn label(self) -> &'static str {
        match self {
            Self::Objects => "loot objects",
            Self::Tables => "loot tables",
        }
    }

    fn build(self, registry: &Registry, fragment: &EntryConfig) -> HoardResult<Arc<LootEntry>> {
        match self {
            Self::Objects => registry.create_entry(fragment),
            Self::Tables => registry.load_table(fragment),
        }
    }

    fn register(self, registry: &mut Registry, identifier: &str, entry: Arc<LootEntry>) -> bool {
        match self {
            Self::Objects => registry.register_object(identifier, entry),
            Self::Tables => registry.register_table(identifier, entry),
        }
    }
}

/// A parsed fragment waiting to be built.
struct Pending {
    identifier: String,
    fragment: EntryConfig,
}

/// Loads a configuration into a fresh registry.
pub struct LootLoader<'a> {
    config: &'a LootConfig,
    base_dir: PathBuf,
    setup: Option<RegistrySetup>,
}

impl<'a> LootLoader<'a> {
    /// Creates a loader; relative directories resolve against `base_dir`.
    #[must_use]
    pub fn new(config: &'a LootConfig, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            base_dir: base_dir.into(),
            setup: None,
        }
    }

    /// Registers custom reward types (or resolvers) before loading.
    #[must_use]
    pub fn with_setup(mut self, setup: RegistrySetup) -> Self {
        self.setup = Some(setup);
        self
    }

    /// Builds the registry.
    ///
    /// Individual objects and tables never fail the load; they are recorded
    /// in the report instead.
    #[must_use]
    pub fn load(&self) -> (Registry, LoadReport) {
        let mut registry = Registry::with_builtin_types();
        if let Some(setup) = &self.setup {
            setup(&mut registry);
        }
        let mut report = LoadReport::default();

        for (name, rarity) in &self.config.rarities {
            let rarity = if rarity.name().is_some() {
                rarity.clone()
            } else {
                rarity.clone().with_name(name.clone())
            };
            if registry.register_rarity(name, rarity) {
                report.rarities_loaded += 1;
            }
        }

        // Objects: inline first, then files
        let mut objects = Vec::new();
        for (name, table) in &self.config.objects {
            match EntryConfig::from_table(table.clone()) {
                Ok(fragment) => objects.push(Pending {
                    identifier: name.to_lowercase(),
                    fragment,
                }),
                Err(err) => report.fail(name.to_lowercase(), &err),
            }
        }
        let (files, found) = Self::read_directory(&self.config.objects_dir(&self.base_dir), &mut report);
        objects.extend(files);
        report.objects_total = self.config.objects.len() + found;
        report.objects_loaded = Self::run_section(Section::Objects, objects, &mut registry, &mut report);

        let (tables, found) = Self::read_directory(&self.config.tables_dir(&self.base_dir), &mut report);
        report.tables_total = found;
        report.tables_loaded = Self::run_section(Section::Tables, tables, &mut registry, &mut report);

        tracing::info!(
            "loaded {}/{} loot objects and {}/{} loot tables",
            report.objects_loaded,
            report.objects_total,
            report.tables_loaded,
            report.tables_total
        );
        (registry, report)
    }

    fn run_section(
        section: Section,
        mut pending: Vec<Pending>,
        registry: &mut Registry,
        report: &mut LoadReport,
    ) -> usize {
        let mut loaded = 0;

        // Keep retrying the quarantine while it shrinks; chains of forward
        // references resolve one link per pass
        loop {
            let before = pending.len();
            let mut quarantined = Vec::new();

            for item in pending {
                match section.build(registry, &item.fragment) {
                    Ok(entry) => {
                        if section.register(registry, &item.identifier, entry) {
                            loaded += 1;
                        } else {
                            report.fail(&item.identifier, &"duplicate identifier");
                        }
                    }
                    Err(err) if err.is_configuration() => {
                        tracing::debug!("deferring {} {}: {}", section.label(), item.identifier, err);
                        quarantined.push((item, err));
                    }
                    Err(err) => report.fail(&item.identifier, &err),
                }
            }

            if quarantined.is_empty() {
                break;
            }
            if quarantined.len() == before {
                for (item, err) in quarantined {
                    report.fail(&item.identifier, &err);
                }
                break;
            }
            pending = quarantined.into_iter().map(|(item, _)| item).collect();
        }

        loaded
    }

    /// Parses every `*.toml` file below `dir`, sorted by identifier, and
    /// returns them with the number of files found.
    ///
    /// A missing directory is empty. Unreadable files are reported.
    fn read_directory(dir: &Path, report: &mut LoadReport) -> (Vec<Pending>, usize) {
        let mut files = Vec::new();
        if let Err(err) = collect_files(dir, &mut files) {
            report.fail(dir.display().to_string(), &err);
            return (Vec::new(), 0);
        }
        let found = files.len();

        let mut pending: Vec<Pending> = files
            .into_iter()
            .filter_map(|path| {
                let identifier = file_identifier(dir, &path)?;
                match read_fragment(&path) {
                    Ok(fragment) => Some(Pending { identifier, fragment }),
                    Err(err) => {
                        report.fail(identifier, &err);
                        None
                    }
                }
            })
            .collect();
        pending.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        (pending, found)
    }
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> ConfigResult<()> {
    if !dir.is_dir() {
        tracing::debug!("{} does not exist, skipping", dir.display());
        return Ok(());
    }

    let io_error = |source| ConfigError::Io {
        path: dir.to_path_buf(),
        source,
    };
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.is_dir() {
            collect_files(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == FILE_EXTENSION) {
            files.push(path);
        }
    }
    Ok(())
}

fn read_fragment(path: &Path) -> ConfigResult<EntryConfig> {
    let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&source).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Path relative to `dir`, `/`-separated, lowercased, extension stripped.
#[must_use]
pub fn file_identifier(dir: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(dir).ok()?.with_extension("");
    let parts: Vec<String> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().to_lowercase())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}
