//! # Loot Constants
//!
//! Reserved identifiers and template tokens shared by the engine,
//! the registry and the configuration loader.

// =============================================================================
// TEMPLATE TOKENS
// =============================================================================

/// Replaced by the reward's configured name in a rarity `format`.
pub const REWARD_NAME_PLACEHOLDER: &str = "{REWARD_NAME}";

/// Replaced by the recipient's name in command rewards.
pub const RECIPIENT_PLACEHOLDER: &str = "%player%";

// =============================================================================
// RESERVED TYPE IDENTIFIERS
// =============================================================================

/// Type identifier that builds a nested table instead of a leaf.
pub const TABLE_TYPE: &str = "table";

/// The empty reward; used when no type is given or inferred.
pub const EMPTY_TYPE: &str = "none";

/// Item reward type.
pub const ITEM_TYPE: &str = "item";

/// Command reward type.
pub const COMMAND_TYPE: &str = "command";

// =============================================================================
// DEFAULTS
// =============================================================================

/// Rarity `max` value meaning "no cap".
pub const UNBOUNDED: i32 = -1;

/// Draw count of a table without an explicit `count`.
pub const DEFAULT_TABLE_COUNT: u32 = 1;
