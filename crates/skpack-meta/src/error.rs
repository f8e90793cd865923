//! Error types for skpack-meta

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing or validating the registry
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Two application specs share the same id
    #[error("Duplicate application id: {id}")]
    DuplicateApplication { id: String },

    /// An application depends on an id that is not in the registry
    #[error("Application {id} depends on unknown application {depends_on}")]
    UnknownDependency { id: String, depends_on: String },

    /// The dependency graph is not acyclic
    #[error("Dependency cycle: {path}")]
    DependencyCycle { path: String },
}
