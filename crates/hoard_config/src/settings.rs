//! # Main Configuration File
//!
//! ```toml
//! objects_path = "loot-objects"
//! tables_path = "loot-tables"
//!
//! [rarities.rare]
//! name = "Rare"
//! format = "<{REWARD_NAME}>"
//! chance = 2.0
//! max = 1
//!
//! [objects.gold]
//! item = "gold_ingot"
//! amount = 3
//! rarity = "rare"
//! ```
//!
//! Relative directories are resolved against the directory of the main file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use hoard_core::Rarity;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Default directory of per-file loot objects.
pub const DEFAULT_OBJECTS_PATH: &str = "loot-objects";

/// Default directory of per-file loot tables.
pub const DEFAULT_TABLES_PATH: &str = "loot-tables";

/// Contents of the main configuration file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LootConfig {
    /// Directory of per-file loot objects.
    pub objects_path: PathBuf,
    /// Directory of per-file loot tables.
    pub tables_path: PathBuf,
    /// Rarities by name.
    pub rarities: BTreeMap<String, Rarity>,
    /// Inline loot objects by name, kept raw so one bad object fails alone.
    pub objects: BTreeMap<String, toml::Table>,
}

impl Default for LootConfig {
    fn default() -> Self {
        Self {
            objects_path: PathBuf::from(DEFAULT_OBJECTS_PATH),
            tables_path: PathBuf::from(DEFAULT_TABLES_PATH),
            rarities: BTreeMap::new(),
            objects: BTreeMap::new(),
        }
    }
}

impl LootConfig {
    /// Reads and parses a main configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not a valid configuration.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&source).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Objects directory, resolved against `base`.
    #[must_use]
    pub fn objects_dir(&self, base: &Path) -> PathBuf {
        base.join(&self.objects_path)
    }

    /// Tables directory, resolved against `base`.
    #[must_use]
    pub fn tables_dir(&self, base: &Path) -> PathBuf {
        base.join(&self.tables_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: LootConfig = toml::from_str("").unwrap();
        assert_eq!(config, LootConfig::default());
        assert_eq!(
            config.objects_dir(Path::new("/srv/loot")),
            PathBuf::from("/srv/loot/loot-objects")
        );
    }

    #[test]
    fn test_full_file() {
        let config: LootConfig = toml::from_str(
            r#"
            tables_path = "/abs/tables"

            [rarities.rare]
            name = "Rare"
            chance = 2
            max = 1

            [objects.gold]
            item = "gold_ingot"
            rarity = "rare"
            "#,
        )
        .unwrap();

        assert_eq!(config.rarities["rare"].max(), 1);
        assert_eq!(config.rarities["rare"].chance(), 2.0);
        assert_eq!(config.objects["gold"]["item"].as_str(), Some("gold_ingot"));
        assert_eq!(config.tables_dir(Path::new("/srv")), PathBuf::from("/abs/tables"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("hoard_settings_missing_file.toml");
        assert!(matches!(LootConfig::load(&path), Err(ConfigError::Io { .. })));
    }
}
