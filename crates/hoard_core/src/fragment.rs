//! # Configuration Fragments
//!
//! The serde shape of one loot entry as it appears in configuration. A
//! fragment is only data; [`Registry::create_entry`](crate::Registry::create_entry)
//! decides what it becomes.
//!
//! ```toml
//! type = "item"            # optional, inferred from params otherwise
//! item = "diamond"         # inline reward parameter
//! amount = 2               # inline reward parameter
//! chance = 5.0
//! rarity = "rare"          # or an inline table: { max = 1 }
//! name = "Shiny"
//! unique = true
//!
//! [with]                   # reward parameters; win over inline ones
//! amount = 3
//! ```

use serde::{Deserialize, Serialize};

use crate::entry::EntrySettings;
use crate::error::{HoardError, HoardResult};
use crate::rarity::Rarity;
use crate::reward::RewardParams;

/// Rarity of a fragment: a registered name or an inline definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RarityRef {
    /// Registered rarity, looked up by name. Replaces the base rarity.
    Named(String),
    /// Inline rarity. Merged over the base rarity.
    Inline(Rarity),
}

/// One entry as written in configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryConfig {
    /// Explicit reward type (`"table"` for nested tables).
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_id: Option<String>,
    /// Reference to a registered loot object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    /// Reference to a registered loot table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,

    /// Relative weight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chance: Option<f64>,
    /// Enabled flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Always flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub always: Option<bool>,
    /// Unique flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    /// Exclude-from-random flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_from_random: Option<bool>,
    /// Rarity reference or inline rarity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rarity: Option<RarityRef>,

    /// Leaf display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Leaf lore lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lore: Option<Vec<String>>,
    /// Leaf icon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Draw count of a table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    /// Children of a table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewards: Option<Vec<EntryConfig>>,

    /// Reward parameters in their own table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub with: Option<RewardParams>,
    /// Every other key: inline reward parameters.
    #[serde(flatten)]
    pub params: RewardParams,
}

impl EntryConfig {
    /// Converts a raw TOML table into a fragment.
    ///
    /// # Errors
    ///
    /// Returns [`HoardError::InvalidConfig`] if a known key has the wrong shape.
    pub fn from_table(table: toml::Table) -> HoardResult<Self> {
        toml::Value::Table(table)
            .try_into()
            .map_err(|err: toml::de::Error| HoardError::InvalidConfig(err.message().to_string()))
    }

    /// Selection settings carried by this fragment.
    #[must_use]
    pub fn settings(&self) -> EntrySettings {
        EntrySettings {
            chance: self.chance,
            enabled: self.enabled,
            always: self.always,
            unique: self.unique,
            exclude_from_random: self.exclude_from_random,
        }
    }

    /// Reward parameters: inline keys overlaid with the `with` table.
    #[must_use]
    pub fn reward_params(&self) -> RewardParams {
        let mut params = self.params.clone();
        if let Some(with) = &self.with {
            for (key, value) in with {
                params.insert(key.clone(), value.clone());
            }
        }
        params
    }

    /// Returns `true` if the fragment changes anything about a referenced entry.
    ///
    /// A reference without overrides shares the registered instance.
    #[must_use]
    pub fn has_overrides(&self) -> bool {
        !self.settings().is_empty()
            || self.rarity.is_some()
            || self.name.is_some()
            || self.lore.is_some()
            || self.icon.is_some()
            || self.count.is_some()
            || self.rewards.is_some()
            || self.with.as_ref().is_some_and(|with| !with.is_empty())
            || !self.params.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> EntryConfig {
        toml::from_str(src).unwrap()
    }

    #[test]
    fn test_known_keys_and_inline_params() {
        let fragment = parse(
            r#"
            item = "diamond"
            amount = 2
            chance = 5
            unique = true
            rarity = "rare"
            name = "Shiny"
            lore = ["a", "b"]
            "#,
        );

        assert_eq!(fragment.chance, Some(5.0));
        assert_eq!(fragment.unique, Some(true));
        assert_eq!(fragment.rarity, Some(RarityRef::Named("rare".to_string())));
        assert_eq!(fragment.lore.as_deref(), Some(&["a".to_string(), "b".to_string()][..]));
        assert_eq!(fragment.params.len(), 2);
        assert_eq!(fragment.params["item"].as_str(), Some("diamond"));
        assert!(fragment.params.get("chance").is_none());
    }

    #[test]
    fn test_with_wins_over_inline() {
        let fragment = parse(
            r#"
            item = "stone"
            amount = 1

            [with]
            amount = 3
            "#,
        );

        let params = fragment.reward_params();
        assert_eq!(params["item"].as_str(), Some("stone"));
        assert_eq!(params["amount"].as_integer(), Some(3));
    }

    #[test]
    fn test_inline_rarity() {
        let fragment = parse("rarity = { max = 1, chance = 2.5 }");
        let Some(RarityRef::Inline(rarity)) = fragment.rarity else {
            panic!("expected inline rarity");
        };
        assert_eq!(rarity.max(), 1);
        assert_eq!(rarity.chance(), 2.5);
    }

    #[test]
    fn test_nested_rewards() {
        let fragment = parse(
            r#"
            type = "table"
            count = 2

            [[rewards]]
            object = "gold"

            [[rewards]]
            command = "say hi"
            always = true
            "#,
        );

        let rewards = fragment.rewards.unwrap();
        assert_eq!(fragment.count, Some(2));
        assert_eq!(rewards.len(), 2);
        assert_eq!(rewards[0].object.as_deref(), Some("gold"));
        assert_eq!(rewards[1].always, Some(true));
    }

    #[test]
    fn test_has_overrides() {
        assert!(!parse("object = \"gold\"").has_overrides());
        assert!(parse("object = \"gold\"\nchance = 2").has_overrides());
        assert!(parse("object = \"gold\"\namount = 2").has_overrides());
        assert!(parse("table = \"t\"\ncount = 4").has_overrides());
    }

    #[test]
    fn test_from_table_rejects_bad_shape() {
        let table: toml::Table = toml::from_str("chance = \"lots\"").unwrap();
        assert!(matches!(
            EntryConfig::from_table(table),
            Err(HoardError::InvalidConfig(_))
        ));
    }
}
