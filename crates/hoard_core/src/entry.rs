//! # Loot Entries
//!
//! A loot entry is one candidate of a table: either a leaf carrying a
//! [`Reward`], or a nested [`LootTable`] that expands into its own leaves
//! when hit.
//!
//! Entries are immutable once built and shared as `Arc<LootEntry>`: a named
//! object referenced from five tables is one entry, not five copies.
//! Transient changes during a resolution (an entry disabling itself in its
//! pre-evaluation hook) live in the resolving table, never in the entry.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::rarity::{sanitize_chance, Rarity};
use crate::reward::Reward;
use crate::table::LootTable;

/// Stable identity of an entry.
///
/// Assigned at construction and never derived from configuration, so two
/// entries with identical settings are still distinct for uniqueness
/// tracking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(u64);

static NEXT_ENTRY_ID: AtomicU64 = AtomicU64::new(1);

impl EntryId {
    /// Allocates a fresh identity.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_ENTRY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Selection flags and weight of an entry.
///
/// Unset fields fall back to their defaults (`chance` to the rarity's
/// chance), which is what makes field-wise merging possible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntrySettings {
    /// Relative weight.
    pub chance: Option<f64>,
    /// Whether the entry takes part in resolutions (default `true`).
    pub enabled: Option<bool>,
    /// Added on every resolution, ignoring the draw count (default `false`).
    pub always: Option<bool>,
    /// At most once per resolution (default `false`).
    pub unique: Option<bool>,
    /// Never drawn by the weighted pass (default `false`).
    pub exclude_from_random: Option<bool>,
}

impl EntrySettings {
    /// Layers `overrides` over these settings.
    ///
    /// Fields set in `overrides` win; everything else is kept.
    #[must_use]
    pub fn merge(&self, overrides: &EntrySettings) -> EntrySettings {
        EntrySettings {
            chance: overrides.chance.or(self.chance),
            enabled: overrides.enabled.or(self.enabled),
            always: overrides.always.or(self.always),
            unique: overrides.unique.or(self.unique),
            exclude_from_random: overrides.exclude_from_random.or(self.exclude_from_random),
        }
    }

    /// Returns `true` if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Per-resolution change requested by a pre-evaluation hook.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Adjustment {
    /// Overrides `enabled` for this resolution.
    pub enabled: Option<bool>,
    /// Overrides `chance` for this resolution.
    pub chance: Option<f64>,
}

impl Adjustment {
    /// Disables the entry for this resolution.
    #[must_use]
    pub fn disable() -> Self {
        Self {
            enabled: Some(false),
            chance: None,
        }
    }

    /// Returns `true` if nothing is adjusted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.enabled.is_none() && self.chance.is_none()
    }
}

/// Callbacks fired by the resolving table. All default to no-ops.
///
/// Hooks run synchronously on the resolving thread. They must not loot the
/// table that is currently resolving.
pub trait EntryHooks: Send + Sync {
    /// Fired once per resolution on every direct child, before sampling.
    fn on_pre_result_evaluation(&self, _entry: &LootEntry) -> Adjustment {
        Adjustment::default()
    }

    /// Fired when a leaf is hit.
    fn on_hit(&self, _entry: &LootEntry) {}

    /// Fired on every leaf of the finished result, with the whole result.
    fn on_post_result_evaluation(&self, _entry: &LootEntry, _result: &[Arc<LootEntry>]) {}
}

/// The two shapes of an entry.
#[derive(Debug)]
pub enum EntryKind {
    /// Terminal reward.
    Leaf(Reward),
    /// Nested table; expands into its own leaves when hit.
    Table(LootTable),
}

/// A candidate in a loot table.
pub struct LootEntry {
    id: EntryId,
    settings: EntrySettings,
    rarity: Rarity,
    kind: EntryKind,
    hooks: Option<Arc<dyn EntryHooks>>,
}

impl LootEntry {
    /// Creates a leaf entry.
    #[must_use]
    pub fn leaf(reward: Reward) -> Self {
        Self::with_id(EntryId::next(), EntryKind::Leaf(reward))
    }

    /// Creates a table entry. The entry shares the table's identity.
    #[must_use]
    pub fn table(table: LootTable) -> Self {
        Self::with_id(table.id(), EntryKind::Table(table))
    }

    fn with_id(id: EntryId, kind: EntryKind) -> Self {
        Self {
            id,
            settings: EntrySettings::default(),
            rarity: Rarity::default(),
            kind,
            hooks: None,
        }
    }

    /// Sets all selection settings at once.
    #[must_use]
    pub fn with_settings(mut self, settings: EntrySettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the chance.
    #[must_use]
    pub fn with_chance(mut self, chance: f64) -> Self {
        self.settings.chance = Some(chance);
        self
    }

    /// Sets the enabled flag.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.settings.enabled = Some(enabled);
        self
    }

    /// Sets the always flag.
    #[must_use]
    pub fn with_always(mut self, always: bool) -> Self {
        self.settings.always = Some(always);
        self
    }

    /// Sets the unique flag.
    #[must_use]
    pub fn with_unique(mut self, unique: bool) -> Self {
        self.settings.unique = Some(unique);
        self
    }

    /// Sets the exclude-from-random flag.
    #[must_use]
    pub fn with_exclude_from_random(mut self, exclude: bool) -> Self {
        self.settings.exclude_from_random = Some(exclude);
        self
    }

    /// Sets the rarity.
    #[must_use]
    pub fn with_rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = rarity;
        self
    }

    /// Attaches hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn EntryHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Wraps the entry for sharing.
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Identity.
    #[must_use]
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// Raw settings (unset fields still unresolved).
    #[must_use]
    pub fn settings(&self) -> &EntrySettings {
        &self.settings
    }

    /// Relative weight: explicit chance, else the rarity's chance. Never negative.
    #[must_use]
    pub fn chance(&self) -> f64 {
        sanitize_chance(self.settings.chance.unwrap_or_else(|| self.rarity.chance()))
    }

    /// Defaults to `true`.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.settings.enabled.unwrap_or(true)
    }

    /// Defaults to `false`.
    #[must_use]
    pub fn always(&self) -> bool {
        self.settings.always.unwrap_or(false)
    }

    /// Defaults to `false`.
    #[must_use]
    pub fn unique(&self) -> bool {
        self.settings.unique.unwrap_or(false)
    }

    /// Defaults to `false`.
    #[must_use]
    pub fn exclude_from_random(&self) -> bool {
        self.settings.exclude_from_random.unwrap_or(false)
    }

    /// Rarity.
    #[must_use]
    pub fn rarity(&self) -> &Rarity {
        &self.rarity
    }

    /// Leaf or table.
    #[must_use]
    pub fn kind(&self) -> &EntryKind {
        &self.kind
    }

    /// The reward, if this is a leaf.
    #[must_use]
    pub fn as_reward(&self) -> Option<&Reward> {
        match &self.kind {
            EntryKind::Leaf(reward) => Some(reward),
            EntryKind::Table(_) => None,
        }
    }

    /// The table, if this is a table entry.
    #[must_use]
    pub fn as_table(&self) -> Option<&LootTable> {
        match &self.kind {
            EntryKind::Table(table) => Some(table),
            EntryKind::Leaf(_) => None,
        }
    }

    /// Returns `true` for leaf entries.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, EntryKind::Leaf(_))
    }

    /// Attached hooks.
    #[must_use]
    pub fn hooks(&self) -> Option<&Arc<dyn EntryHooks>> {
        self.hooks.as_ref()
    }

    /// Leaf name rendered through the rarity format.
    ///
    /// `None` for tables and for leaves without a name.
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        self.as_reward()
            .and_then(Reward::name)
            .filter(|name| !name.is_empty())
            .map(|name| self.rarity.render(name))
    }

    /// Builds a new entry with `overrides` layered over these settings.
    ///
    /// The result has its own identity and keeps the kind, rarity and hooks.
    /// Table entries get a fresh table over the same children.
    #[must_use]
    pub fn merge_settings(&self, overrides: &EntrySettings) -> LootEntry {
        let kind = match &self.kind {
            EntryKind::Leaf(reward) => EntryKind::Leaf(reward.clone()),
            EntryKind::Table(table) => EntryKind::Table(table.fork(None, None)),
        };
        self.derive(kind, self.settings.merge(overrides), self.rarity.clone())
    }

    /// New entry with this entry's hooks and the given parts.
    pub(crate) fn derive(&self, kind: EntryKind, settings: EntrySettings, rarity: Rarity) -> LootEntry {
        let id = match &kind {
            EntryKind::Table(table) => table.id(),
            EntryKind::Leaf(_) => EntryId::next(),
        };
        LootEntry {
            id,
            settings,
            rarity,
            kind,
            hooks: self.hooks.clone(),
        }
    }
}

impl PartialEq for LootEntry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for LootEntry {}

impl fmt::Debug for LootEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LootEntry")
            .field("id", &self.id)
            .field("settings", &self.settings)
            .field("rarity", &self.rarity)
            .field("kind", &self.kind)
            .field("hooks", &self.hooks.is_some())
            .finish()
    }
}
