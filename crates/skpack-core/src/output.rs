//! Artifact output
//!
//! Two packaging conventions share this module:
//!
//! - **Graph stream** (dev): the manifest stream itself is handed back
//!   to the caller (the CLI prints it); only the dependency diagram and
//!   the manifest diff land on disk.
//! - **Kustomize overlays** (release): documents are emitted as
//!   numbered `NNNN-{id}.k8s.yaml` files at the output root, then moved
//!   under `base/`; `base`, `prod` and `sim` each get a kustomization
//!   listing. The diagram and diff artifacts are written alongside.
//!
//! The diff artifact compares the freshly rendered stream against the
//! manifests left on disk by the previous run (the concatenated `base/`
//! documents in release mode; nothing persists between dev runs, so dev
//! diffs render against an empty baseline). Runs over identical inputs
//! and filesystem state therefore produce byte-identical artifacts.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use similar::TextDiff;

use crate::assemble::Compiled;
use crate::error::Result;

/// Dependency-diagram artifact filename.
pub const DIAGRAM_FILE: &str = "dag.mermaid";

/// Manifest-diff artifact filename.
pub const DIFF_FILE: &str = "manifests.diff";

/// Shared-base overlay directory.
pub const BASE_DIR: &str = "base";

/// Per-environment overlay directories layered on [`BASE_DIR`].
pub const OVERLAY_DIRS: [&str; 2] = ["prod", "sim"];

/// Kustomization listing filename, one per overlay directory.
pub const KUSTOMIZATION_FILE: &str = "kustomization.yaml";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Kustomization {
    api_version: String,
    kind: String,
    resources: Vec<String>,
}

impl Kustomization {
    fn listing(resources: Vec<String>) -> Self {
        Self {
            api_version: "kustomize.config.k8s.io/v1beta1".to_string(),
            kind: "Kustomization".to_string(),
            resources,
        }
    }
}

/// Concatenate compiled documents into one `---`-separated stream,
/// preserving their dependency order.
pub fn manifest_stream(compiled: &Compiled) -> String {
    compiled
        .documents
        .iter()
        .map(|doc| format!("---\n{}", doc.yaml))
        .collect()
}

/// Numbered filename a document is emitted under in release packaging.
fn numbered_filename(index: usize, app_id: &str) -> String {
    format!("{index:04}-{app_id}.k8s.yaml")
}

/// Write the dev-mode artifacts: diagram and diff. The manifest stream
/// is not persisted in this mode; the diff renders against an empty
/// baseline.
pub fn write_graph_artifacts(out_dir: &Path, compiled: &Compiled) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;
    let stream = manifest_stream(compiled);
    write_diagram_and_diff(out_dir, compiled, "", &stream)
}

/// Write the release-mode overlay tree plus diagram and diff.
pub fn write_overlay_tree(out_dir: &Path, compiled: &Compiled) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;
    let base_dir = out_dir.join(BASE_DIR);
    let previous = read_base_stream(&base_dir)?;

    // Start the base tree fresh so documents for applications that left
    // the catalog do not linger.
    match fs::remove_dir_all(&base_dir) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    fs::create_dir_all(&base_dir)?;

    let mut paths = Vec::new();
    let mut resources = Vec::new();
    for (index, doc) in compiled.documents.iter().enumerate() {
        let filename = numbered_filename(index, &doc.app_id);
        // Emit at the output root first, then move into base/, the
        // same two-step repackaging the library's flat output goes
        // through.
        let staged = out_dir.join(&filename);
        fs::write(&staged, &doc.yaml)?;
        let target = base_dir.join(&filename);
        fs::rename(&staged, &target)?;
        tracing::info!(path = %target.display(), "Wrote manifest document");
        paths.push(target);
        resources.push(filename);
    }

    let base_listing = base_dir.join(KUSTOMIZATION_FILE);
    fs::write(
        &base_listing,
        serde_yaml::to_string(&Kustomization::listing(resources))?,
    )?;
    paths.push(base_listing);

    for overlay in OVERLAY_DIRS {
        let overlay_dir = out_dir.join(overlay);
        fs::create_dir_all(&overlay_dir)?;
        let listing = overlay_dir.join(KUSTOMIZATION_FILE);
        fs::write(
            &listing,
            serde_yaml::to_string(&Kustomization::listing(vec![format!("../{BASE_DIR}")]))?,
        )?;
        tracing::info!(path = %listing.display(), "Wrote overlay listing");
        paths.push(listing);
    }

    let stream = manifest_stream(compiled);
    paths.extend(write_diagram_and_diff(out_dir, compiled, &previous, &stream)?);
    Ok(paths)
}

/// The previous run's manifests, reconstructed from the base overlay in
/// filename order. Empty when no previous output exists.
fn read_base_stream(base_dir: &Path) -> Result<String> {
    let entries = match fs::read_dir(base_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(String::new()),
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".k8s.yaml"))
        {
            files.push(path);
        }
    }
    files.sort();

    let mut stream = String::new();
    for path in files {
        stream.push_str("---\n");
        stream.push_str(&fs::read_to_string(path)?);
    }
    Ok(stream)
}

fn write_diagram_and_diff(
    out_dir: &Path,
    compiled: &Compiled,
    previous: &str,
    current: &str,
) -> Result<Vec<PathBuf>> {
    let diagram_path = out_dir.join(DIAGRAM_FILE);
    fs::write(&diagram_path, &compiled.diagram)?;
    tracing::info!(path = %diagram_path.display(), "Wrote dependency diagram");

    let diff = TextDiff::from_lines(previous, current)
        .unified_diff()
        .context_radius(3)
        .header("previous", "current")
        .to_string();
    let diff_path = out_dir.join(DIFF_FILE);
    fs::write(&diff_path, diff)?;
    tracing::info!(path = %diff_path.display(), "Wrote manifest diff");

    Ok(vec![diagram_path, diff_path])
}
