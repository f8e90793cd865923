//! Manifest target selection
//!
//! A [`TargetPolicy`] is derived from the packaging mode exactly once
//! per invocation and never re-evaluated. It answers three questions:
//! what shape the output takes, whether containers get the elevated
//! debug capability, and whether node-selector constraints are applied.
//!
//! Release packaging never applies node selectors: the dev selectors
//! pin components to specific kind-cluster node groups, an assumption
//! release manifests must not carry.

use crate::mode::PackagingMode;

/// The filesystem shape a packaging run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    /// One dependency-ordered manifest stream plus diagram and diff
    /// artifacts.
    GraphStream,
    /// `base`/`prod`/`sim` overlay directories, each with its own
    /// kustomization listing.
    KustomizeOverlays,
}

/// Debug and scheduling posture for one packaging run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetPolicy {
    pub shape: OutputShape,
    pub debug_capabilities: bool,
    pub apply_node_selectors: bool,
}

impl TargetPolicy {
    /// The one-shot mode branch.
    pub fn for_mode(mode: PackagingMode) -> Self {
        match mode {
            PackagingMode::DevGraph => Self {
                shape: OutputShape::GraphStream,
                debug_capabilities: true,
                apply_node_selectors: true,
            },
            PackagingMode::ReleaseKustomize => Self {
                shape: OutputShape::KustomizeOverlays,
                debug_capabilities: false,
                apply_node_selectors: false,
            },
        }
    }
}
