//! Container image resolution
//!
//! Each packaging run resolves every application's image reference
//! exactly once. The strategy depends on the image source and the
//! packaging mode:
//!
//! - pinned images are used verbatim in every mode;
//! - release packaging builds a versioned registry path;
//! - dev packaging reads the reference the build pipeline wrote to
//!   `{build_dir}/{id}-image`, falling back to a placeholder when the
//!   file does not exist yet, so partial builds still produce a
//!   syntactically valid manifest set.
//!
//! Only "file not found" is recoverable. Any other read failure (such
//! as permission denied) aborts the run with the offending path.

use std::fs;
use std::io::ErrorKind;

use skpack_meta::{ApplicationSpec, ImageSource};

use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::mode::PackagingMode;

/// Registry all released platform images are published under.
pub const REGISTRY_PREFIX: &str = "quay.io/appliedcomputing";

/// Substitute reference for images that have not been built yet.
pub const PLACEHOLDER_IMAGE: &str = "PLACEHOLDER";

/// The outcome of image resolution for one application.
///
/// Computed once per packaging run and never mutated afterward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    reference: String,
}

impl ResolvedImage {
    /// The image reference to place in the rendered manifest.
    pub fn reference(&self) -> &str {
        &self.reference
    }
}

/// Resolve the image reference for one application.
pub fn resolve(spec: &ApplicationSpec, config: &RunConfig) -> Result<ResolvedImage> {
    let reference = match &spec.image {
        ImageSource::Pinned(reference) => reference.clone(),
        ImageSource::Built => match config.mode() {
            PackagingMode::ReleaseKustomize => {
                format!("{REGISTRY_PREFIX}/{}:v{}", spec.id, config.version()?)
            }
            PackagingMode::DevGraph => read_built_reference(&spec.id, config)?,
        },
    };
    Ok(ResolvedImage { reference })
}

fn read_built_reference(id: &str, config: &RunConfig) -> Result<String> {
    let path = config.build_dir()?.join(format!("{id}-image"));
    match fs::read_to_string(&path) {
        Ok(contents) => Ok(contents.trim().to_string()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(%id, ?path, "No image file yet; using placeholder");
            Ok(PLACEHOLDER_IMAGE.to_string())
        }
        Err(e) => Err(Error::ImageRead { path, source: e }),
    }
}
