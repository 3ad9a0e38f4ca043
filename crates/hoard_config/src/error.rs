//! # Configuration Error Types

use std::path::PathBuf;

use hoard_core::HoardError;
use thiserror::Error;

/// Errors that can occur while reading loot configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configuration file or directory could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The file or directory.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration file is not valid TOML or has the wrong shape.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        /// The file.
        path: PathBuf,
        /// Underlying parse error.
        source: toml::de::Error,
    },

    /// A loot object or table could not be built.
    #[error(transparent)]
    Loot(#[from] HoardError),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
