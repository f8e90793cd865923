//! Packaging pipeline for the simkube manifest packager
//!
//! This crate turns the fixed application catalog from `skpack-meta`
//! into deployment-manifest artifacts. One run is a single synchronous
//! pass:
//!
//! ```text
//!    RunConfig (env read once at the boundary)
//!        |
//!    image::resolve      -- per-app image references
//!        |
//!    target::TargetPolicy -- output shape + debug/scheduling posture
//!        |
//!    assemble::Assembler  -- ordered documents + dependency diagram
//!        |
//!    output               -- graph-stream or kustomize overlay artifacts
//! ```
//!
//! The [`package::Packager`] orchestrates the steps above. All fatal
//! errors surface before any artifact is written, so a failed run never
//! leaves a partial manifest set behind.

pub mod assemble;
pub mod config;
pub mod error;
pub mod image;
pub mod mode;
pub mod output;
pub mod package;
pub mod target;

pub use assemble::{Assembler, Compiled, Document, ManifestRenderer, ResolvedApplication};
pub use config::{APP_VERSION_VAR, BUILD_DIR_VAR, RunConfig};
pub use error::{Error, Result};
pub use image::{PLACEHOLDER_IMAGE, REGISTRY_PREFIX, ResolvedImage};
pub use mode::PackagingMode;
pub use package::{PackageReport, Packager};
pub use target::{OutputShape, TargetPolicy};
