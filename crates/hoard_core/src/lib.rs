//! # HOARD Core
//!
//! Loot resolution engine: weighted, constrained random selection from a
//! tree of configurable entries.
//!
//! - Weighted roulette draws over eligible entries
//! - Always-drops, per-resolution uniqueness and rarity caps
//! - Tables of tables to arbitrary depth
//! - Cached results: `result()` is stable until `loot()` re-rolls
//!
//! ## Architecture Rules
//!
//! 1. **Resolution cannot fail** - every error surfaces at load time
//! 2. **One seed, one result** - all draws go through a single [`RandomSource`]
//! 3. **Entries are immutable** - transient state lives in the resolving table
//!
//! ## Example
//!
//! ```rust,ignore
//! use hoard_core::{EntryConfig, Registry, SeededRandom};
//!
//! let registry = Registry::with_builtin_types();
//! let fragment: EntryConfig = toml::from_str(r#"
//!     count = 2
//!     [[rewards]]
//!     item = "diamond"
//!     chance = 1
//! "#)?;
//! let chest = registry.load_table(&fragment)?;
//!
//! let mut rng = SeededRandom::new(42);
//! let result = chest.as_table().unwrap().loot(None, &mut rng);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod constants;
pub mod entry;
pub mod error;
pub mod fragment;
pub mod random;
pub mod rarity;
pub mod registry;
pub mod result;
pub mod reward;
pub mod table;

pub use entry::{Adjustment, EntryHooks, EntryId, EntryKind, EntrySettings, LootEntry};
pub use error::{DeliveryError, HoardError, HoardResult};
pub use fragment::{EntryConfig, RarityRef};
pub use random::{RandomSource, SeededRandom};
pub use rarity::Rarity;
pub use registry::{Registry, TypeResolver};
pub use result::{DeliveryReport, LootResult};
pub use reward::{
    CommandReward, EmptyReward, ItemReward, Recipient, Reward, RewardFactory, RewardParams,
    RewardSink, RewardType, RewardTypeInfo,
};
pub use table::LootTable;
