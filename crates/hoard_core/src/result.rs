//! # Loot Results
//!
//! The immutable snapshot of one resolution. Cloning a result is cheap and
//! clones share the same reward list, so a cached result handed out twice
//! is the same snapshot both times.

use std::sync::Arc;

use crate::entry::{EntryId, LootEntry};
use crate::error::DeliveryError;
use crate::reward::{Recipient, RewardSink};

/// Outcome of one resolution of a table.
#[derive(Clone, Debug)]
pub struct LootResult {
    source: EntryId,
    recipient: Option<Recipient>,
    rewards: Arc<[Arc<LootEntry>]>,
}

impl LootResult {
    /// Wraps the leaves hit by a resolution of `source`.
    #[must_use]
    pub fn new(source: EntryId, recipient: Option<Recipient>, rewards: Vec<Arc<LootEntry>>) -> Self {
        Self {
            source,
            recipient,
            rewards: Arc::from(rewards),
        }
    }

    /// Identity of the table that produced this result.
    #[must_use]
    pub fn source(&self) -> EntryId {
        self.source
    }

    /// The recipient the table was looted for, if any.
    #[must_use]
    pub fn recipient(&self) -> Option<&Recipient> {
        self.recipient.as_ref()
    }

    /// Hit leaves in hit order, nested tables fully expanded.
    #[must_use]
    pub fn rewards(&self) -> &[Arc<LootEntry>] {
        &self.rewards
    }

    /// Number of rewards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    /// Returns `true` if nothing dropped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// Iterates the rewards.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<LootEntry>> {
        self.rewards.iter()
    }

    /// Number of times the entry `id` appears.
    #[must_use]
    pub fn count_of(&self, id: EntryId) -> usize {
        self.rewards.iter().filter(|entry| entry.id() == id).count()
    }

    /// Returns `true` if the entry `id` dropped.
    #[must_use]
    pub fn contains(&self, id: EntryId) -> bool {
        self.rewards.iter().any(|entry| entry.id() == id)
    }

    /// Identities in hit order.
    #[must_use]
    pub fn ids(&self) -> Vec<EntryId> {
        self.rewards.iter().map(|entry| entry.id()).collect()
    }

    /// Returns `true` if both results are the same snapshot.
    #[must_use]
    pub fn same_snapshot(&self, other: &LootResult) -> bool {
        Arc::ptr_eq(&self.rewards, &other.rewards)
    }

    /// Display names of all named rewards, formatted by rarity.
    #[must_use]
    pub fn display_names(&self) -> Vec<String> {
        self.rewards
            .iter()
            .filter_map(|entry| entry.display_name())
            .collect()
    }

    /// Delivers every reward to the sink's recipient.
    ///
    /// Each reward is delivered independently: a refused reward is logged
    /// and recorded, the remaining rewards are still delivered. The sink
    /// does not have to be the recipient the table was looted for.
    pub fn deliver_to(&self, sink: &mut dyn RewardSink) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for entry in self.rewards.iter() {
            let Some(reward) = entry.as_reward() else {
                continue;
            };

            match reward.deliver(sink) {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    tracing::warn!(
                        "failed to deliver reward {} ({}) to {}: {}",
                        entry.id(),
                        reward.type_id(),
                        sink.recipient().name,
                        err
                    );
                    report.failures.push((entry.id(), err));
                }
            }
        }

        report
    }
}

/// Outcome of [`LootResult::deliver_to`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Rewards handed over successfully.
    pub delivered: usize,
    /// Rewards the sink refused, with the reason.
    pub failures: Vec<(EntryId, DeliveryError)>,
}

impl DeliveryReport {
    /// Returns `true` if every reward was delivered.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reward::tests::RecordingSink;
    use crate::reward::{CommandReward, ItemReward, Reward, RewardTypeInfo};
    use crate::constants::{COMMAND_TYPE, ITEM_TYPE};
    use crate::rarity::Rarity;

    fn item(name: &str) -> Arc<LootEntry> {
        let params: toml::Table = toml::from_str(&format!("item = \"{name}\"")).unwrap();
        let kind = ItemReward::load(&params).unwrap();
        LootEntry::leaf(Reward::new(ITEM_TYPE, params, Arc::new(kind)).with_name(name)).shared()
    }

    fn command(cmd: &str) -> Arc<LootEntry> {
        let params: toml::Table = toml::from_str(&format!("command = \"{cmd}\"")).unwrap();
        let kind = CommandReward::load(&params).unwrap();
        LootEntry::leaf(Reward::new(COMMAND_TYPE, params, Arc::new(kind))).shared()
    }

    #[test]
    fn test_accessors() {
        let a = item("apple");
        let b = item("bread");
        let result = LootResult::new(EntryId::next(), None, vec![a.clone(), b.clone(), a.clone()]);

        assert_eq!(result.len(), 3);
        assert_eq!(result.count_of(a.id()), 2);
        assert!(result.contains(b.id()));
        assert_eq!(result.ids(), vec![a.id(), b.id(), a.id()]);
        assert!(result.recipient().is_none());
    }

    #[test]
    fn test_clone_is_same_snapshot() {
        let result = LootResult::new(EntryId::next(), None, vec![item("apple")]);
        let copy = result.clone();
        assert!(result.same_snapshot(&copy));

        let other = LootResult::new(result.source(), None, result.rewards().to_vec());
        assert!(!result.same_snapshot(&other));
    }

    #[test]
    fn test_delivery_continues_after_failure() {
        let result = LootResult::new(
            EntryId::next(),
            Some(Recipient::new(1, "alice")),
            vec![item("apple"), item("anvil"), command("say hi %player%")],
        );

        let mut sink = RecordingSink::new("alice");
        sink.reject_items.push("anvil".to_string());

        let report = result.deliver_to(&mut sink);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failures.len(), 1);
        assert!(!report.is_complete());
        assert_eq!(sink.items, vec![("apple".to_string(), 1)]);
        assert_eq!(sink.commands, vec![("say hi alice".to_string(), false)]);
    }

    #[test]
    fn test_display_names() {
        let named = LootEntry::leaf(Reward::empty().with_name("Gem"))
            .with_rarity(Rarity::new().with_format("[{REWARD_NAME}]"))
            .shared();
        let unnamed = LootEntry::leaf(Reward::empty()).shared();
        let result = LootResult::new(EntryId::next(), None, vec![named, unnamed]);
        assert_eq!(result.display_names(), vec!["[Gem]".to_string()]);
    }
}
