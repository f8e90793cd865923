//! Run configuration
//!
//! All ambient inputs (the build directory and the application version)
//! are read from the environment exactly once, here, at the boundary.
//! Everything downstream receives plain values through [`RunConfig`];
//! no nested logic performs its own environment lookups.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::mode::PackagingMode;

/// Environment variable naming the directory image-reference files are
/// written to by the build pipeline.
pub const BUILD_DIR_VAR: &str = "BUILD_DIR";

/// Environment variable carrying the application version for release
/// packaging.
pub const APP_VERSION_VAR: &str = "APP_VERSION";

/// Immutable configuration for one packaging run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    mode: PackagingMode,
    build_dir: Option<PathBuf>,
    version: Option<String>,
}

impl RunConfig {
    /// Build a run configuration from explicit values, validating that
    /// the selected mode's required inputs are present.
    ///
    /// Dev-graph packaging requires a build directory (every built
    /// image resolves through it); release packaging requires a
    /// version. Missing required inputs fail here, before any work
    /// happens, rather than surfacing as a malformed reference later.
    pub fn new(
        mode: PackagingMode,
        build_dir: Option<PathBuf>,
        version: Option<String>,
    ) -> Result<Self> {
        match mode {
            PackagingMode::DevGraph if build_dir.is_none() => {
                return Err(Error::MissingRequiredVar {
                    name: BUILD_DIR_VAR.to_string(),
                });
            }
            PackagingMode::ReleaseKustomize if version.is_none() => {
                return Err(Error::MissingRequiredVar {
                    name: APP_VERSION_VAR.to_string(),
                });
            }
            _ => {}
        }

        tracing::debug!(%mode, ?build_dir, ?version, "Run configuration resolved");
        Ok(Self {
            mode,
            build_dir,
            version,
        })
    }

    /// Read `BUILD_DIR` and `APP_VERSION` from the process environment
    /// and validate them for the selected mode.
    pub fn from_env(mode: PackagingMode) -> Result<Self> {
        let build_dir = std::env::var_os(BUILD_DIR_VAR).map(PathBuf::from);
        let version = std::env::var(APP_VERSION_VAR).ok();
        Self::new(mode, build_dir, version)
    }

    /// The packaging mode for this run.
    pub fn mode(&self) -> PackagingMode {
        self.mode
    }

    /// The build directory holding per-app image-reference files.
    ///
    /// # Errors
    ///
    /// [`Error::MissingRequiredVar`] when the run was constructed
    /// without one (release-mode runs do not need it).
    pub fn build_dir(&self) -> Result<&Path> {
        self.build_dir
            .as_deref()
            .ok_or_else(|| Error::MissingRequiredVar {
                name: BUILD_DIR_VAR.to_string(),
            })
    }

    /// The application version used for release image references.
    ///
    /// # Errors
    ///
    /// [`Error::MissingRequiredVar`] when the run was constructed
    /// without one (dev-mode runs do not need it).
    pub fn version(&self) -> Result<&str> {
        self.version
            .as_deref()
            .ok_or_else(|| Error::MissingRequiredVar {
                name: APP_VERSION_VAR.to_string(),
            })
    }
}
