//! Packaging mode
//!
//! The mode is chosen once per invocation from the command line and is
//! immutable for the run's duration. It drives both the image-resolution
//! strategy and the output shape (see [`crate::target`]).

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// The run-time choice between development and release packaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PackagingMode {
    /// Development output: a single dependency-ordered manifest stream
    /// plus diagram and diff artifacts. Images come from per-app files
    /// in the build directory, with a placeholder fallback.
    #[default]
    DevGraph,

    /// Release output: `base`/`prod`/`sim` kustomize overlay trees.
    /// Images are versioned registry references.
    ReleaseKustomize,
}

impl FromStr for PackagingMode {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "graph" | "dev-graph" => Ok(PackagingMode::DevGraph),
            "release" | "kustomize" | "release-kustomize" => Ok(PackagingMode::ReleaseKustomize),
            _ => Err(Error::InvalidMode {
                mode: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for PackagingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackagingMode::DevGraph => write!(f, "dev-graph"),
            PackagingMode::ReleaseKustomize => write!(f, "release-kustomize"),
        }
    }
}
