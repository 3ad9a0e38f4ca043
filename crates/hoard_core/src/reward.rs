//! # Rewards
//!
//! The leaf payload of the loot system and the boundary to the delivery
//! collaborator.
//!
//! ## Reward Types
//!
//! A reward type is what actually reaches the recipient: an item stack,
//! a command, nothing at all. Types are registered by identifier in the
//! [`Registry`](crate::Registry) and instantiated from the parameters of a
//! configuration fragment at load time:
//!
//! ```text
//! fragment params ──> RewardFactory ──> Arc<dyn RewardType> ──> deliver(sink)
//! ```
//!
//! Loading validates everything (empty item, unknown item, empty command),
//! so delivery never has to re-check configuration.

use std::fmt;
use std::sync::Arc;

use crate::constants::{COMMAND_TYPE, EMPTY_TYPE, ITEM_TYPE, RECIPIENT_PLACEHOLDER};
use crate::error::{DeliveryError, HoardError, HoardResult};

/// Reward parameters, as found in a configuration fragment.
pub type RewardParams = toml::Table;

/// The context a table is looted for.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Recipient {
    /// Stable identifier of the recipient (player, entity, account).
    pub id: u64,
    /// Name used for placeholder substitution.
    pub name: String,
}

impl Recipient {
    /// Creates a recipient context.
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// The delivery collaborator: whatever can hand rewards to a recipient.
pub trait RewardSink {
    /// The recipient that receives the rewards.
    fn recipient(&self) -> &Recipient;

    /// Gives `amount` of `item` to the recipient.
    ///
    /// # Errors
    ///
    /// Returns an error if the recipient cannot take the stack.
    fn give_item(&mut self, item: &str, amount: u32) -> Result<(), DeliveryError>;

    /// Runs `command`, either as the recipient or `elevated` (console).
    ///
    /// # Errors
    ///
    /// Returns an error if the command could not be executed.
    fn run_command(&mut self, command: &str, elevated: bool) -> Result<(), DeliveryError>;
}

/// A loaded reward type instance.
pub trait RewardType: fmt::Debug + Send + Sync {
    /// Hands this reward to the sink's recipient.
    ///
    /// May be called many times, for different recipients.
    ///
    /// # Errors
    ///
    /// Propagates the sink's refusal.
    fn deliver(&self, sink: &mut dyn RewardSink) -> Result<(), DeliveryError>;

    /// Icon identifier provided by the type itself.
    fn icon(&self) -> Option<&str> {
        None
    }
}

/// Registration metadata of a reward type.
pub trait RewardTypeInfo: RewardType + Sized + 'static {
    /// Unique identifier the type is referenced by. Must not be empty.
    const IDENTIFIER: &'static str;

    /// Builds an instance from fragment parameters.
    ///
    /// # Errors
    ///
    /// Returns [`HoardError::InvalidConfig`] if required parameters are
    /// missing or invalid.
    fn load(params: &RewardParams) -> HoardResult<Self>;
}

/// Factory producing loaded reward type instances from parameters.
pub type RewardFactory = Arc<dyn Fn(&RewardParams) -> HoardResult<Arc<dyn RewardType>> + Send + Sync>;

/// The payload of a leaf entry.
#[derive(Clone)]
pub struct Reward {
    type_id: String,
    params: RewardParams,
    kind: Arc<dyn RewardType>,
    name: Option<String>,
    lore: Vec<String>,
    icon: Option<String>,
}

impl Reward {
    /// Creates a reward from an already loaded type instance.
    #[must_use]
    pub fn new(type_id: impl Into<String>, params: RewardParams, kind: Arc<dyn RewardType>) -> Self {
        Self {
            type_id: type_id.into(),
            params,
            kind,
            name: None,
            lore: Vec::new(),
            icon: None,
        }
    }

    /// The empty reward.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(EMPTY_TYPE, RewardParams::new(), Arc::new(EmptyReward))
    }

    /// Reward type identifier.
    #[must_use]
    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    /// Parameters the type was loaded with.
    #[must_use]
    pub fn params(&self) -> &RewardParams {
        &self.params
    }

    /// The loaded type instance.
    #[must_use]
    pub fn kind(&self) -> &Arc<dyn RewardType> {
        &self.kind
    }

    /// Raw configured name (unformatted).
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Lore lines.
    #[must_use]
    pub fn lore(&self) -> &[String] {
        &self.lore
    }

    /// Icon: the type's own icon wins over the configured one.
    #[must_use]
    pub fn icon(&self) -> Option<&str> {
        self.kind.icon().or(self.icon.as_deref())
    }

    /// Sets the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the lore lines.
    #[must_use]
    pub fn with_lore(mut self, lore: Vec<String>) -> Self {
        self.lore = lore;
        self
    }

    /// Sets the configured icon.
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Same presentation, new parameters and type instance.
    pub(crate) fn reloaded(&self, params: RewardParams, kind: Arc<dyn RewardType>) -> Reward {
        Reward {
            params,
            kind,
            ..self.clone()
        }
    }

    pub(crate) fn set_presentation(
        &mut self,
        name: Option<String>,
        lore: Option<Vec<String>>,
        icon: Option<String>,
    ) {
        if name.is_some() {
            self.name = name;
        }
        if let Some(lore) = lore {
            self.lore = lore;
        }
        if icon.is_some() {
            self.icon = icon;
        }
    }

    /// Delivers this reward to the sink's recipient.
    ///
    /// # Errors
    ///
    /// Propagates the sink's refusal.
    pub fn deliver(&self, sink: &mut dyn RewardSink) -> Result<(), DeliveryError> {
        self.kind.deliver(sink)
    }
}

impl fmt::Debug for Reward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reward")
            .field("type_id", &self.type_id)
            .field("kind", &self.kind)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// BUILT-IN TYPES
// =============================================================================

/// Reward that delivers nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmptyReward;

impl RewardType for EmptyReward {
    fn deliver(&self, _sink: &mut dyn RewardSink) -> Result<(), DeliveryError> {
        Ok(())
    }
}

impl RewardTypeInfo for EmptyReward {
    const IDENTIFIER: &'static str = EMPTY_TYPE;

    fn load(_params: &RewardParams) -> HoardResult<Self> {
        Ok(Self)
    }
}

/// Reward that gives an item stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemReward {
    item: String,
    amount: u32,
}

impl ItemReward {
    /// Item identifier.
    #[must_use]
    pub fn item(&self) -> &str {
        &self.item
    }

    /// Stack size.
    #[must_use]
    pub const fn amount(&self) -> u32 {
        self.amount
    }
}

impl RewardType for ItemReward {
    fn deliver(&self, sink: &mut dyn RewardSink) -> Result<(), DeliveryError> {
        sink.give_item(&self.item, self.amount)
    }

    fn icon(&self) -> Option<&str> {
        Some(&self.item)
    }
}

impl RewardTypeInfo for ItemReward {
    const IDENTIFIER: &'static str = ITEM_TYPE;

    fn load(params: &RewardParams) -> HoardResult<Self> {
        let item = params
            .get("item")
            .and_then(toml::Value::as_str)
            .map(str::trim)
            .unwrap_or_default();
        if item.is_empty() {
            return Err(HoardError::InvalidConfig(
                "item must not be null or empty".to_string(),
            ));
        }

        let item = item.to_lowercase();
        if !is_item_identifier(&item) {
            return Err(HoardError::InvalidConfig(format!("unknown item: {item}")));
        }

        let amount = match params.get("amount") {
            None => 1,
            Some(value) => value
                .as_integer()
                .and_then(|amount| u32::try_from(amount).ok())
                .filter(|&amount| amount > 0)
                .ok_or_else(|| {
                    HoardError::InvalidConfig(format!("invalid amount for item {item}: {value}"))
                })?,
        };

        Ok(Self { item, amount })
    }
}

/// `namespace:path` or `path`, lowercase ascii, digits, `_`, `.`, `-`.
fn is_item_identifier(item: &str) -> bool {
    let mut parts = item.splitn(2, ':');
    let valid = |part: &str| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '-' | '/'))
    };
    parts.all(valid)
}

/// Reward that runs a command for the recipient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandReward {
    command: String,
    op: bool,
}

impl CommandReward {
    /// Command template (may contain `%player%`).
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Whether the command runs elevated instead of as the recipient.
    #[must_use]
    pub const fn op(&self) -> bool {
        self.op
    }
}

impl RewardType for CommandReward {
    fn deliver(&self, sink: &mut dyn RewardSink) -> Result<(), DeliveryError> {
        // Substitute per delivery; the template is reused for every recipient
        let command = self
            .command
            .replace(RECIPIENT_PLACEHOLDER, &sink.recipient().name);
        sink.run_command(&command, self.op)
    }
}

impl RewardTypeInfo for CommandReward {
    const IDENTIFIER: &'static str = COMMAND_TYPE;

    fn load(params: &RewardParams) -> HoardResult<Self> {
        let command = params
            .get("command")
            .and_then(toml::Value::as_str)
            .map(str::trim)
            .unwrap_or_default();
        if command.is_empty() {
            return Err(HoardError::InvalidConfig(
                "command must not be null or empty".to_string(),
            ));
        }

        let op = params
            .get("op")
            .and_then(toml::Value::as_bool)
            .unwrap_or(false);

        Ok(Self {
            command: command.to_string(),
            op,
        })
    }
}
