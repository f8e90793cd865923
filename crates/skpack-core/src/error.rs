//! Error types for skpack-core

use std::path::PathBuf;

/// Result type for packaging operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during a packaging run
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required environment variable is not set for the selected mode
    #[error("Required environment variable {name} is not set")]
    MissingRequiredVar { name: String },

    /// An unrecognized packaging mode string
    #[error("Invalid packaging mode: {mode}")]
    InvalidMode { mode: String },

    /// A per-app image file exists but could not be read
    #[error("Failed to read image reference {path}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Registry validation error from skpack-meta
    #[error(transparent)]
    Meta(#[from] skpack_meta::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML serialization error
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}
