//! # Loot Registry
//!
//! Owns everything configuration refers to by name: rarities, reward types,
//! named loot objects and named loot tables. Turns configuration fragments
//! into entries.
//!
//! ## Entry Creation
//!
//! ```text
//! fragment
//!    │
//!    ├─ explicit `type`   ──> validate ──> build leaf / table
//!    ├─ `object = "..."`  ──> registered entry ──> share or merge
//!    ├─ `table = "..."`   ──> registered table ──> share or merge
//!    └─ otherwise         ──> infer type ──> build leaf / table
//! ```
//!
//! A reference without overrides returns the registered `Arc` itself. With
//! overrides it yields a new entry (fresh identity) and leaves the
//! registered one untouched.
//!
//! All identifiers are case-insensitive.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::constants::{COMMAND_TYPE, DEFAULT_TABLE_COUNT, EMPTY_TYPE, ITEM_TYPE, TABLE_TYPE};
use crate::entry::{EntryKind, LootEntry};
use crate::error::{HoardError, HoardResult};
use crate::fragment::{EntryConfig, RarityRef};
use crate::rarity::Rarity;
use crate::reward::{
    CommandReward, EmptyReward, ItemReward, Reward, RewardFactory, RewardParams, RewardType,
    RewardTypeInfo,
};
use crate::table::LootTable;

/// Infers a reward type identifier from fragment parameters.
pub type TypeResolver = Arc<dyn Fn(&RewardParams) -> Option<String> + Send + Sync>;

/// Name lookups for everything loot configuration can reference.
#[derive(Default)]
pub struct Registry {
    rarities: HashMap<String, Rarity>,
    reward_types: HashMap<String, RewardFactory>,
    type_resolvers: Vec<TypeResolver>,
    objects: BTreeMap<String, Arc<LootEntry>>,
    tables: BTreeMap<String, Arc<LootEntry>>,
}

fn normalize(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

impl Registry {
    /// Creates an empty registry (no reward types, no resolvers).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the `none`, `item` and `command` types and
    /// their inference rules.
    #[must_use]
    pub fn with_builtin_types() -> Self {
        let mut registry = Self::new();
        registry.register_builtin_types();
        registry
    }

    /// Registers the built-in reward types and type resolvers.
    pub fn register_builtin_types(&mut self) {
        let builtins = [
            self.register_reward_type::<EmptyReward>(),
            self.register_reward_type::<ItemReward>(),
            self.register_reward_type::<CommandReward>(),
        ];
        for err in builtins.into_iter().filter_map(Result::err) {
            tracing::error!("failed to register built-in reward type: {}", err);
        }

        self.add_type_resolver(|params| params.contains_key("item").then(|| ITEM_TYPE.to_string()));
        self.add_type_resolver(|params| {
            params
                .contains_key("command")
                .then(|| COMMAND_TYPE.to_string())
        });
    }

    // =========================================================================
    // RARITIES
    // =========================================================================

    /// Registers a rarity under `name`. A duplicate name is ignored.
    pub fn register_rarity(&mut self, name: &str, rarity: Rarity) -> bool {
        let key = normalize(name);
        if self.rarities.contains_key(&key) {
            tracing::warn!("rarity {} is already registered, ignoring", key);
            return false;
        }

        tracing::info!("loaded rarity {}", key);
        self.rarities.insert(key, rarity);
        true
    }

    /// Looks up a rarity.
    ///
    /// # Errors
    ///
    /// Returns [`HoardError::UnknownRarity`] if no rarity has that name.
    pub fn rarity(&self, name: &str) -> HoardResult<&Rarity> {
        self.rarities
            .get(&normalize(name))
            .ok_or_else(|| HoardError::UnknownRarity(name.to_string()))
    }

    /// Registered rarities by name, in no particular order.
    pub fn rarities(&self) -> impl Iterator<Item = (&str, &Rarity)> {
        self.rarities.iter().map(|(name, rarity)| (name.as_str(), rarity))
    }

    // =========================================================================
    // REWARD TYPES
    // =========================================================================

    /// Registers a reward type under its [`RewardTypeInfo::IDENTIFIER`].
    ///
    /// # Errors
    ///
    /// Returns [`HoardError::TypeRegistration`] if the identifier is empty.
    /// A duplicate identifier is logged and ignored.
    pub fn register_reward_type<T: RewardTypeInfo>(&mut self) -> HoardResult<()> {
        let factory: RewardFactory =
            Arc::new(|params: &RewardParams| -> HoardResult<Arc<dyn RewardType>> {
                Ok(Arc::new(T::load(params)?))
            });
        self.register_reward_factory(T::IDENTIFIER, factory)
    }

    /// Registers a raw factory under `identifier`.
    ///
    /// # Errors
    ///
    /// Returns [`HoardError::TypeRegistration`] if the identifier is empty or
    /// is the reserved table identifier.
    pub fn register_reward_factory(&mut self, identifier: &str, factory: RewardFactory) -> HoardResult<()> {
        let key = normalize(identifier);
        if key.is_empty() {
            return Err(HoardError::TypeRegistration(
                "reward type identifier must not be empty".to_string(),
            ));
        }
        if key == TABLE_TYPE {
            return Err(HoardError::TypeRegistration(format!(
                "{key} is reserved for loot tables"
            )));
        }
        if self.reward_types.contains_key(&key) {
            tracing::error!("reward type {} is already registered, ignoring", key);
            return Ok(());
        }

        tracing::info!("registered reward type {}", key);
        self.reward_types.insert(key, factory);
        Ok(())
    }

    /// Factory registered under `identifier`.
    #[must_use]
    pub fn reward_type(&self, identifier: &str) -> Option<&RewardFactory> {
        self.reward_types.get(&normalize(identifier))
    }

    /// Returns `true` if `identifier` is a registered reward type.
    #[must_use]
    pub fn has_reward_type(&self, identifier: &str) -> bool {
        self.reward_types.contains_key(&normalize(identifier))
    }

    /// Appends a type inference rule. Rules are consulted in order.
    pub fn add_type_resolver<F>(&mut self, resolver: F)
    where
        F: Fn(&RewardParams) -> Option<String> + Send + Sync + 'static,
    {
        self.type_resolvers.push(Arc::new(resolver));
    }

    /// Type a fragment builds when it does not reference a registered entry.
    ///
    /// Explicit `type` first, then `rewards` (a table), then the inference
    /// rules, then the empty type.
    #[must_use]
    pub fn resolve_type(&self, fragment: &EntryConfig) -> String {
        if let Some(explicit) = &fragment.type_id {
            return normalize(explicit);
        }
        if fragment.rewards.is_some() {
            return TABLE_TYPE.to_string();
        }

        let params = fragment.reward_params();
        self.type_resolvers
            .iter()
            .find_map(|resolver| resolver(&params))
            .map_or_else(|| EMPTY_TYPE.to_string(), |found| normalize(&found))
    }

    // =========================================================================
    // OBJECTS & TABLES
    // =========================================================================

    /// Registers a named loot object. Table entries are also registered as
    /// tables. A duplicate name is ignored.
    pub fn register_object(&mut self, name: &str, entry: Arc<LootEntry>) -> bool {
        let key = normalize(name);
        if self.objects.contains_key(&key) {
            tracing::warn!("loot object {} is already registered, ignoring", key);
            return false;
        }

        if entry.as_table().is_some() {
            self.register_table(&key, Arc::clone(&entry));
        }
        self.objects.insert(key, entry);
        true
    }

    /// Registers a named loot table. Leaves and duplicate names are ignored.
    pub fn register_table(&mut self, name: &str, entry: Arc<LootEntry>) -> bool {
        let key = normalize(name);
        if entry.as_table().is_none() {
            tracing::warn!("loot table {} is not a table, ignoring", key);
            return false;
        }
        if self.tables.contains_key(&key) {
            tracing::warn!("loot table {} is already registered, ignoring", key);
            return false;
        }

        self.tables.insert(key, entry);
        true
    }

    /// Registered loot object.
    #[must_use]
    pub fn object(&self, name: &str) -> Option<&Arc<LootEntry>> {
        self.objects.get(&normalize(name))
    }

    /// Registered loot table entry.
    #[must_use]
    pub fn table_entry(&self, name: &str) -> Option<&Arc<LootEntry>> {
        self.tables.get(&normalize(name))
    }

    /// Registered loot table.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&LootTable> {
        self.table_entry(name).and_then(|entry| entry.as_table())
    }

    /// Loot objects by name, sorted.
    pub fn objects(&self) -> impl Iterator<Item = (&str, &Arc<LootEntry>)> {
        self.objects.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Loot tables by name, sorted.
    pub fn tables(&self) -> impl Iterator<Item = (&str, &LootTable)> {
        self.tables
            .iter()
            .filter_map(|(name, entry)| entry.as_table().map(|table| (name.as_str(), table)))
    }

    // =========================================================================
    // ENTRY CREATION
    // =========================================================================

    /// Builds the entry a fragment describes.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error naming the missing identifier for
    /// an unknown type, object, table or rarity, and with
    /// [`HoardError::InvalidConfig`] if a reward type rejects its parameters.
    pub fn create_entry(&self, fragment: &EntryConfig) -> HoardResult<Arc<LootEntry>> {
        if fragment.type_id.is_some() {
            let type_id = self.resolve_type(fragment);
            return self.build_entry(&type_id, fragment).map(Arc::new);
        }

        if let Some(name) = &fragment.object {
            let base = self
                .object(name)
                .ok_or_else(|| HoardError::UnknownObject(name.clone()))?;
            return self.merge_or_share(base, fragment);
        }

        if let Some(name) = &fragment.table {
            let base = self
                .table_entry(name)
                .ok_or_else(|| HoardError::UnknownTable(name.clone()))?;
            return self.merge_or_share(base, fragment);
        }

        let type_id = self.resolve_type(fragment);
        self.build_entry(&type_id, fragment).map(Arc::new)
    }

    /// Builds a loot table from a table definition.
    ///
    /// Without a type or reference the fragment is always a table, even
    /// with no `rewards`.
    ///
    /// # Errors
    ///
    /// Same as [`Registry::create_entry`], plus [`HoardError::InvalidConfig`]
    /// if the fragment resolves to a leaf.
    pub fn load_table(&self, fragment: &EntryConfig) -> HoardResult<Arc<LootEntry>> {
        let plain = fragment.type_id.is_none() && fragment.object.is_none() && fragment.table.is_none();
        let entry = if plain {
            Arc::new(self.build_entry(TABLE_TYPE, fragment)?)
        } else {
            self.create_entry(fragment)?
        };

        if entry.as_table().is_none() {
            return Err(HoardError::InvalidConfig(format!(
                "entry {} is not a loot table",
                entry.id()
            )));
        }
        Ok(entry)
    }

    fn build_entry(&self, type_id: &str, fragment: &EntryConfig) -> HoardResult<LootEntry> {
        let rarity = self.resolve_rarity(fragment.rarity.as_ref(), &Rarity::default())?;

        let entry = if type_id == TABLE_TYPE {
            let children = self.create_children(fragment.rewards.as_deref().unwrap_or_default())?;
            LootEntry::table(LootTable::new(
                fragment.count.unwrap_or(DEFAULT_TABLE_COUNT),
                children,
            ))
        } else {
            let factory = self
                .reward_type(type_id)
                .ok_or_else(|| HoardError::UnknownRewardType(type_id.to_string()))?;
            let params = fragment.reward_params();
            let kind = factory(&params)?;

            let mut reward = Reward::new(type_id, params, kind);
            reward.set_presentation(fragment.name.clone(), fragment.lore.clone(), fragment.icon.clone());
            LootEntry::leaf(reward)
        };

        Ok(entry.with_settings(fragment.settings()).with_rarity(rarity))
    }

    fn create_children(&self, rewards: &[EntryConfig]) -> HoardResult<Vec<Arc<LootEntry>>> {
        rewards.iter().map(|child| self.create_entry(child)).collect()
    }

    fn resolve_rarity(&self, reference: Option<&RarityRef>, base: &Rarity) -> HoardResult<Rarity> {
        match reference {
            None => Ok(base.clone()),
            Some(RarityRef::Named(name)) => self.rarity(name).cloned(),
            Some(RarityRef::Inline(inline)) => Ok(base.merge(inline)),
        }
    }

    fn merge_or_share(&self, base: &Arc<LootEntry>, fragment: &EntryConfig) -> HoardResult<Arc<LootEntry>> {
        if !fragment.has_overrides() {
            return Ok(Arc::clone(base));
        }

        let settings = base.settings().merge(&fragment.settings());
        let rarity = self.resolve_rarity(fragment.rarity.as_ref(), base.rarity())?;

        let kind = match base.kind() {
            EntryKind::Leaf(reward) => EntryKind::Leaf(self.merge_reward(reward, fragment)?),
            EntryKind::Table(table) => {
                let contents = match &fragment.rewards {
                    Some(rewards) => Some(self.create_children(rewards)?),
                    None => None,
                };
                EntryKind::Table(table.fork(fragment.count, contents))
            }
        };

        Ok(Arc::new(base.derive(kind, settings, rarity)))
    }

    fn merge_reward(&self, base: &Reward, fragment: &EntryConfig) -> HoardResult<Reward> {
        let overrides = fragment.reward_params();

        let mut reward = if overrides.is_empty() {
            base.clone()
        } else {
            let mut params = base.params().clone();
            for (key, value) in overrides {
                params.insert(key, value);
            }

            let factory = self
                .reward_type(base.type_id())
                .ok_or_else(|| HoardError::UnknownRewardType(base.type_id().to_string()))?;
            let kind = factory(&params)?;
            base.reloaded(params, kind)
        };

        reward.set_presentation(fragment.name.clone(), fragment.lore.clone(), fragment.icon.clone());
        Ok(reward)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut reward_types: Vec<&String> = self.reward_types.keys().collect();
        reward_types.sort();

        f.debug_struct("Registry")
            .field("rarities", &self.rarities.len())
            .field("reward_types", &reward_types)
            .field("type_resolvers", &self.type_resolvers.len())
            .field("objects", &self.objects.len())
            .field("tables", &self.tables.len())
            .finish()
    }
}
