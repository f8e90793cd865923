//! Error types for skpack-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from the packaging pipeline
    #[error(transparent)]
    Core(#[from] skpack_core::Error),

    /// Registry validation error
    #[error(transparent)]
    Meta(#[from] skpack_meta::Error),
}
