//! # Loot Table Resolution
//!
//! **Weighted sampling with always-drops, uniqueness and rarity caps**
//!
//! A table owns an ordered list of entries and a draw count. Resolving it
//! produces a [`LootResult`]:
//!
//! ```text
//! loot(recipient) ──> drop cache ──> result(recipient)
//!                                        │
//!                 cached? ───── yes ─────┴──> same snapshot
//!                    │ no
//!                    ▼
//!   1. reset unique drops + rarity counters
//!   2. pre-evaluation hooks (entries may disable themselves)
//!   3. always pass      (ignores count)
//!   4. weighted pass    (count draws, roulette over eligible entries)
//!   5. nested tables    (re-rolled fresh, leaves appended in place)
//!   6. post-evaluation hooks on every hit leaf
//!   7. snapshot + cache
//! ```
//!
//! ## Degenerate Draws
//!
//! An empty candidate set or a total weight of zero yields nothing for that
//! draw. This is normal steady-state behavior, not an error: a table with
//! `count = 3` may legitimately return fewer than three rewards, and a table
//! with five always-entries returns at least five.
//!
//! ## Concurrency
//!
//! Resolution state lives behind a mutex, so concurrent `loot`/`result`
//! calls on one table are serialized. Hooks run while the table's state is
//! locked and must not loot the same table again.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::entry::{Adjustment, EntryId, EntryKind, LootEntry};
use crate::rarity::{sanitize_chance, Rarity};
use crate::random::RandomSource;
use crate::result::LootResult;
use crate::reward::Recipient;

/// Per-resolution bookkeeping plus the cached result.
#[derive(Debug, Default)]
struct ResolutionState {
    /// Unique entries already added in this resolution.
    unique_drops: HashSet<EntryId>,
    /// Entries added per rarity in this resolution.
    rarity_counts: HashMap<Rarity, u32>,
    /// Changes requested by pre-evaluation hooks.
    adjustments: HashMap<EntryId, Adjustment>,
    /// Last result; dropped only by `loot`.
    cached: Option<LootResult>,
}

impl ResolutionState {
    fn reset(&mut self) {
        self.unique_drops.clear();
        self.rarity_counts.clear();
        self.adjustments.clear();
    }

    fn enabled(&self, entry: &LootEntry) -> bool {
        self.adjustments
            .get(&entry.id())
            .and_then(|adjustment| adjustment.enabled)
            .unwrap_or_else(|| entry.enabled())
    }

    fn chance(&self, entry: &LootEntry) -> f64 {
        self.adjustments
            .get(&entry.id())
            .and_then(|adjustment| adjustment.chance)
            .map_or_else(|| entry.chance(), sanitize_chance)
    }

    fn below_rarity_cap(&self, entry: &LootEntry) -> bool {
        let rarity = entry.rarity();
        rarity.allows(self.rarity_counts.get(rarity).copied().unwrap_or(0))
    }

    /// Uniqueness gate and rarity counting for one addition.
    ///
    /// Returns `false` if the entry is unique and already added, in which
    /// case nothing is recorded.
    fn admit(&mut self, entry: &LootEntry) -> bool {
        if entry.unique() && !self.unique_drops.insert(entry.id()) {
            return false;
        }

        *self.rarity_counts.entry(entry.rarity().clone()).or_insert(0) += 1;
        true
    }

    /// Adds a hit, expanding nested tables in place.
    fn add_to_result(
        &mut self,
        hits: &mut Vec<Arc<LootEntry>>,
        entry: &Arc<LootEntry>,
        recipient: Option<&Recipient>,
        rng: &mut dyn RandomSource,
    ) {
        if !self.admit(entry) {
            return;
        }

        match entry.kind() {
            EntryKind::Table(table) => {
                // Nested tables are always re-rolled, never read from cache
                let nested = table.loot(recipient, rng);
                for leaf in nested.rewards() {
                    if self.admit(leaf) {
                        hits.push(Arc::clone(leaf));
                    }
                }
            }
            EntryKind::Leaf(_) => {
                hits.push(Arc::clone(entry));
                if let Some(hooks) = entry.hooks() {
                    hooks.on_hit(entry);
                }
            }
        }
    }
}

/// An ordered collection of entries with a draw count.
#[derive(Debug)]
pub struct LootTable {
    id: EntryId,
    count: u32,
    contents: Vec<Arc<LootEntry>>,
    state: Mutex<ResolutionState>,
}

impl LootTable {
    /// Creates a table that attempts `count` weighted draws over `contents`.
    #[must_use]
    pub fn new(count: u32, contents: Vec<Arc<LootEntry>>) -> Self {
        Self {
            id: EntryId::next(),
            count,
            contents,
            state: Mutex::new(ResolutionState::default()),
        }
    }

    /// Identity (shared with the entry wrapping this table).
    #[must_use]
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// Number of weighted draws attempted per resolution.
    ///
    /// Not a guarantee of result size: always-entries come on top, and
    /// draws may come up empty.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Direct children, in table order.
    #[must_use]
    pub fn contents(&self) -> &[Arc<LootEntry>] {
        &self.contents
    }

    /// A new, unresolved table with optional replacement count/contents.
    #[must_use]
    pub fn fork(&self, count: Option<u32>, contents: Option<Vec<Arc<LootEntry>>>) -> LootTable {
        LootTable::new(
            count.unwrap_or(self.count),
            contents.unwrap_or_else(|| self.contents.clone()),
        )
    }

    /// Returns `true` if a result is cached.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.state.lock().cached.is_some()
    }

    /// Returns the cached result, or resolves and caches a fresh one.
    ///
    /// While a result is cached, `rng` is not touched and the same snapshot
    /// is returned regardless of `recipient`.
    pub fn result(&self, recipient: Option<&Recipient>, rng: &mut dyn RandomSource) -> LootResult {
        let mut state = self.state.lock();
        if let Some(cached) = &state.cached {
            return cached.clone();
        }

        let result = self.resolve(&mut state, recipient, rng);
        state.cached = Some(result.clone());
        result
    }

    /// Discards any cached result and resolves the table again.
    pub fn loot(&self, recipient: Option<&Recipient>, rng: &mut dyn RandomSource) -> LootResult {
        let mut state = self.state.lock();
        state.cached = None;

        let result = self.resolve(&mut state, recipient, rng);
        state.cached = Some(result.clone());
        result
    }

    fn resolve(
        &self,
        state: &mut ResolutionState,
        recipient: Option<&Recipient>,
        rng: &mut dyn RandomSource,
    ) -> LootResult {
        state.reset();
        let mut hits: Vec<Arc<LootEntry>> = Vec::new();

        // This is the moment entries may disable themselves
        for entry in &self.contents {
            if let Some(hooks) = entry.hooks() {
                let adjustment = hooks.on_pre_result_evaluation(entry);
                if !adjustment.is_empty() {
                    state.adjustments.insert(entry.id(), adjustment);
                }
            }
        }

        // Always pass: no draw, no count, no rarity cap
        for entry in &self.contents {
            if entry.always() && state.enabled(entry) {
                state.add_to_result(&mut hits, entry, recipient, rng);
            }
        }

        for _ in 0..self.count {
            let candidates: Vec<&Arc<LootEntry>> = self
                .contents
                .iter()
                .filter(|entry| !entry.exclude_from_random())
                .filter(|entry| state.enabled(entry))
                .filter(|entry| state.below_rarity_cap(entry))
                .collect();

            let winner = roulette(&candidates, |entry| state.chance(entry), rng).map(|entry| Arc::clone(*entry));

            if let Some(entry) = winner {
                state.add_to_result(&mut hits, &entry, recipient, rng);
            } else {
                tracing::trace!("table {}: draw yielded nothing", self.id);
            }
        }

        // Let every hit leaf see the complete result
        for entry in &hits {
            if let Some(hooks) = entry.hooks() {
                hooks.on_post_result_evaluation(entry, &hits);
            }
        }

        LootResult::new(self.id, recipient.cloned(), hits)
    }
}

/// Weighted roulette selection.
///
/// Draws a value in `[0, total)` and returns the first candidate whose
/// cumulative weight exceeds it. Earlier candidates win exact boundaries.
/// Returns `None` (without drawing) if the total weight is not positive.
pub fn roulette<'a, T>(
    candidates: &'a [T],
    weight: impl Fn(&T) -> f64,
    rng: &mut dyn RandomSource,
) -> Option<&'a T> {
    if candidates.is_empty() {
        return None;
    }

    let total: f64 = candidates.iter().map(&weight).sum();
    if !total.is_finite() || total <= 0.0 {
        return None;
    }

    let hit = rng.roll(total);
    let mut running = 0.0;
    for candidate in candidates {
        running += weight(candidate);
        if hit < running {
            return Some(candidate);
        }
    }

    None
}
