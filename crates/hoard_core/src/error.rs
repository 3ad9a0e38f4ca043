//! # Loot Error Types
//!
//! All errors that can occur while building loot entries and tables.
//!
//! Resolution itself has no error type: once a table is loaded, rolling it
//! cannot fail. Everything here surfaces at load time.

use thiserror::Error;

/// Errors that can occur while loading or registering loot configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HoardError {
    /// A fragment named a reward type that is not registered.
    #[error("unknown reward type: {0}")]
    UnknownRewardType(String),

    /// A fragment referenced a rarity that is not registered.
    #[error("rarity not found: {0}")]
    UnknownRarity(String),

    /// A fragment referenced a loot object that is not registered.
    #[error("unknown loot object: {0}")]
    UnknownObject(String),

    /// A fragment referenced a loot table that is not registered.
    #[error("unknown loot table: {0}")]
    UnknownTable(String),

    /// Invalid reward or entry configuration (missing field, unknown item, ...).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A reward type could not be registered.
    #[error("type registration failed: {0}")]
    TypeRegistration(String),
}

impl HoardError {
    /// Returns `true` for the configuration class of errors.
    ///
    /// Configuration errors are recoverable by the caller: batch loaders
    /// quarantine the failing item and retry it once the rest of the
    /// registry has loaded.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        !matches!(self, Self::TypeRegistration(_))
    }
}

/// Result type for loot configuration operations.
pub type HoardResult<T> = Result<T, HoardError>;

/// Failure to hand a single reward to its recipient.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The recipient refused the item (full inventory, unknown item, ...).
    #[error("recipient rejected {amount}x {item}: {reason}")]
    ItemRejected {
        /// Item identifier.
        item: String,
        /// Stack size that was offered.
        amount: u32,
        /// Why the recipient refused it.
        reason: String,
    },

    /// A reward command could not be executed.
    #[error("command `{command}` failed: {reason}")]
    CommandFailed {
        /// The command after placeholder substitution.
        command: String,
        /// Failure reported by the sink.
        reason: String,
    },

    /// The recipient is not available (offline, despawned, ...).
    #[error("recipient unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_class() {
        assert!(HoardError::UnknownTable("boss".into()).is_configuration());
        assert!(HoardError::InvalidConfig("empty item".into()).is_configuration());
        assert!(!HoardError::TypeRegistration("no identifier".into()).is_configuration());
    }

    #[test]
    fn test_messages_name_the_missing_identifier() {
        let err = HoardError::UnknownRarity("legendary".into());
        assert_eq!(err.to_string(), "rarity not found: legendary");

        let err = HoardError::UnknownObject("gold".into());
        assert!(err.to_string().contains("gold"));
    }
}
