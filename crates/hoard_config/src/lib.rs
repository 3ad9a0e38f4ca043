//! # HOARD Config
//!
//! Loads loot configuration into a [`hoard_core::Registry`].
//!
//! ## Layout
//!
//! ```text
//! hoard.toml            rarities, inline objects, directory names
//! loot-objects/**.toml  one loot object per file
//! loot-tables/**.toml   one loot table per file
//! ```
//!
//! A file's identifier is its path below the directory, lowercased and
//! without extension: `loot-tables/Dungeon/Boss.toml` is `dungeon/boss`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use hoard_config::LootManager;
//! use hoard_core::SeededRandom;
//!
//! let manager = LootManager::new("config/hoard.toml");
//! let report = manager.load()?;
//! if let Some(chest) = manager.table("dungeon/boss") {
//!     let result = chest.as_table().unwrap().loot(None, &mut SeededRandom::new(7));
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod loader;
pub mod manager;
pub mod settings;

pub use error::{ConfigError, ConfigResult};
pub use loader::{file_identifier, LoadFailure, LoadReport, LootLoader, RegistrySetup};
pub use manager::{LootManager, RegistryHandle};
pub use settings::{LootConfig, DEFAULT_OBJECTS_PATH, DEFAULT_TABLES_PATH};
