//! The packaging pipeline
//!
//! [`Packager`] wires the pieces together for one run: resolve every
//! catalog image, apply the target policy, compile through the
//! assembler, then write the artifacts for the selected output shape.
//! Resolution and compilation complete before the first write, so a
//! failing run never leaves a partial manifest set behind.

use std::path::{Path, PathBuf};

use skpack_meta::Registry;

use crate::assemble::{Assembler, ManifestRenderer, ResolvedApplication};
use crate::config::RunConfig;
use crate::error::Result;
use crate::image;
use crate::mode::PackagingMode;
use crate::output;
use crate::target::{OutputShape, TargetPolicy};

/// What one packaging run produced.
#[derive(Debug, Clone)]
pub struct PackageReport {
    /// The mode the run executed under.
    pub mode: PackagingMode,
    /// Files written, in write order.
    pub artifacts: Vec<PathBuf>,
    /// The dependency-ordered manifest stream. In dev-graph packaging
    /// this is the primary output (the CLI prints it); in release
    /// packaging the same content is what landed under `base/`.
    pub manifest_stream: String,
}

/// One-shot packaging runner.
pub struct Packager<A = ManifestRenderer> {
    config: RunConfig,
    policy: TargetPolicy,
    assembler: A,
}

impl Packager<ManifestRenderer> {
    /// A packager using the built-in manifest renderer.
    pub fn new(config: RunConfig) -> Self {
        Self::with_assembler(config, ManifestRenderer)
    }
}

impl<A: Assembler> Packager<A> {
    /// A packager delegating document rendering to a custom assembler.
    pub fn with_assembler(config: RunConfig, assembler: A) -> Self {
        let policy = TargetPolicy::for_mode(config.mode());
        Self {
            config,
            policy,
            assembler,
        }
    }

    /// The policy derived from this run's mode.
    pub fn policy(&self) -> &TargetPolicy {
        &self.policy
    }

    /// Run the pipeline over `registry`, writing artifacts under
    /// `out_dir`.
    pub fn run(&self, registry: &Registry, out_dir: &Path) -> Result<PackageReport> {
        let mode = self.config.mode();
        tracing::debug!(%mode, apps = registry.len(), "Starting packaging run");

        let mut apps = Vec::with_capacity(registry.len());
        for spec in registry.applications() {
            let resolved = image::resolve(spec, &self.config)?;
            tracing::debug!(id = %spec.id, image = %resolved.reference(), "Resolved image");
            apps.push(ResolvedApplication::new(spec, resolved, &self.policy));
        }

        let compiled = self.assembler.compile(&apps)?;
        let manifest_stream = output::manifest_stream(&compiled);

        let artifacts = match self.policy.shape {
            OutputShape::GraphStream => output::write_graph_artifacts(out_dir, &compiled)?,
            OutputShape::KustomizeOverlays => output::write_overlay_tree(out_dir, &compiled)?,
        };

        Ok(PackageReport {
            mode,
            artifacts,
            manifest_stream,
        })
    }
}
