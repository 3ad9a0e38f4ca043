//! # Rarity
//!
//! Shared classification of loot entries: display format, fallback weight
//! and the cap on how many entries of the rarity one resolution may yield.
//!
//! Every field is optional so that rarities can be layered: a child rarity
//! only overrides what it actually sets (see [`Rarity::merge`]).

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::constants::{REWARD_NAME_PLACEHOLDER, UNBOUNDED};

/// A rarity classification.
///
/// Rarities have value semantics: two rarities are equal when their
/// configuration is equal. They are used directly as keys of the
/// per-resolution rarity counters.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Rarity {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<i32>,
}

impl Rarity {
    /// Creates an empty rarity (chance 0, unbounded, plain name format).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Display name of the rarity.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name template; `{REWARD_NAME}` is replaced by the reward name.
    #[must_use]
    pub fn format(&self) -> &str {
        self.format.as_deref().unwrap_or(REWARD_NAME_PLACEHOLDER)
    }

    /// Fallback weight for entries without an explicit chance.
    #[must_use]
    pub fn chance(&self) -> f64 {
        sanitize_chance(self.chance.unwrap_or(0.0))
    }

    /// Maximum number of entries of this rarity per resolution.
    ///
    /// Negative means unbounded, which is also the default.
    #[must_use]
    pub fn max(&self) -> i32 {
        self.max.unwrap_or(UNBOUNDED)
    }

    /// Returns `true` if this rarity caps its occurrences.
    #[must_use]
    pub fn is_capped(&self) -> bool {
        self.max() >= 0
    }

    /// Returns `true` if another entry of this rarity may be drawn after
    /// `count` entries of it were already added.
    #[must_use]
    pub fn allows(&self, count: u32) -> bool {
        let max = self.max();
        max < 0 || i64::from(count) < i64::from(max)
    }

    /// Renders a reward name through this rarity's format.
    #[must_use]
    pub fn render(&self, reward_name: &str) -> String {
        self.format().replace(REWARD_NAME_PLACEHOLDER, reward_name)
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the name format template.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Sets the fallback chance.
    #[must_use]
    pub fn with_chance(mut self, chance: f64) -> Self {
        self.chance = Some(chance);
        self
    }

    /// Sets the per-resolution cap (negative = unbounded).
    #[must_use]
    pub fn with_max(mut self, max: i32) -> Self {
        self.max = Some(max);
        self
    }

    /// Layers `other` over this rarity.
    ///
    /// Fields set in `other` win; everything else is kept from `self`.
    #[must_use]
    pub fn merge(&self, other: &Rarity) -> Rarity {
        Rarity {
            name: other.name.clone().or_else(|| self.name.clone()),
            format: other.format.clone().or_else(|| self.format.clone()),
            chance: other.chance.or(self.chance),
            max: other.max.or(self.max),
        }
    }
}

impl PartialEq for Rarity {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.format == other.format
            && self.chance.map(f64::to_bits) == other.chance.map(f64::to_bits)
            && self.max == other.max
    }
}

impl Eq for Rarity {}

impl Hash for Rarity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.format.hash(state);
        self.chance.map(f64::to_bits).hash(state);
        self.max.hash(state);
    }
}

impl std::fmt::Display for Rarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Rarity{{name={}, chance={}, max={}}}",
            self.name().unwrap_or("-"),
            self.chance(),
            self.max()
        )
    }
}

/// Clamps a configured weight into `[0, inf)`; NaN becomes 0.
#[inline]
pub(crate) fn sanitize_chance(chance: f64) -> f64 {
    if chance.is_nan() || chance < 0.0 {
        0.0
    } else {
        chance
    }
}
