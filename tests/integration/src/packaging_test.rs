//! End-to-end packaging runs over the built-in application catalog.

use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use skpack_core::{PackagingMode, Packager, RunConfig};
use skpack_meta::{ApplicationSpec, Registry};
use tempfile::TempDir;

const BUILT_APPS: [&str; 4] = ["sk-cloudprov", "sk-vnode", "sk-tracer", "sk-ctrl"];

fn dev_config(build_dir: &Path) -> RunConfig {
    RunConfig::new(PackagingMode::DevGraph, Some(build_dir.to_path_buf()), None).unwrap()
}

fn release_config(version: &str) -> RunConfig {
    RunConfig::new(
        PackagingMode::ReleaseKustomize,
        None,
        Some(version.to_string()),
    )
    .unwrap()
}

fn write_image_files(build_dir: &Path) {
    for app in BUILT_APPS {
        fs::write(
            build_dir.join(format!("{app}-image")),
            format!("localhost:5000/{app}:abc123\n"),
        )
        .unwrap();
    }
}

/// All files under `root`, as (relative path, bytes), sorted.
fn snapshot(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                files.push((
                    path.strip_prefix(root).unwrap().to_path_buf(),
                    fs::read(&path).unwrap(),
                ));
            }
        }
    }
    files.sort();
    files
}

#[test]
fn test_dev_run_resolves_every_built_image_from_the_build_dir() {
    let build_dir = TempDir::new().unwrap();
    let out_dir = TempDir::new().unwrap();
    write_image_files(build_dir.path());

    let registry = Registry::simkube().unwrap();
    let report = Packager::new(dev_config(build_dir.path()))
        .run(&registry, out_dir.path())
        .unwrap();

    for app in BUILT_APPS {
        assert!(
            report
                .manifest_stream
                .contains(&format!("image: localhost:5000/{app}:abc123")),
            "missing resolved image for {app}"
        );
    }
    // Pinned images are untouched by dev resolution.
    assert!(report.manifest_stream.contains("image: nginx:latest"));
    assert!(report
        .manifest_stream
        .contains("image: localhost:5000/cluster-autoscaler:latest"));
}

#[test]
fn test_dev_stream_orders_dependencies_first() {
    let build_dir = TempDir::new().unwrap();
    let out_dir = TempDir::new().unwrap();
    write_image_files(build_dir.path());

    let registry = Registry::simkube().unwrap();
    let report = Packager::new(dev_config(build_dir.path()))
        .run(&registry, out_dir.path())
        .unwrap();

    let cloudprov = report.manifest_stream.find("name: sk-cloudprov").unwrap();
    let autoscaler = report
        .manifest_stream
        .find("name: cluster-autoscaler")
        .unwrap();
    assert!(
        cloudprov < autoscaler,
        "the autoscaler's dependency must be emitted before it"
    );
}

#[test]
fn test_dev_run_writes_exactly_diagram_and_diff() {
    let build_dir = TempDir::new().unwrap();
    let out_dir = TempDir::new().unwrap();
    write_image_files(build_dir.path());

    let registry = Registry::simkube().unwrap();
    Packager::new(dev_config(build_dir.path()))
        .run(&registry, out_dir.path())
        .unwrap();

    let mut entries: Vec<String> = fs::read_dir(out_dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    entries.sort();
    assert_eq!(entries, vec!["dag.mermaid", "manifests.diff"]);

    let diagram = fs::read_to_string(out_dir.path().join("dag.mermaid")).unwrap();
    assert!(diagram.contains("sk-cloudprov --> cluster-autoscaler"));
}

#[test]
fn test_identical_runs_produce_byte_identical_artifacts() {
    let build_dir = TempDir::new().unwrap();
    write_image_files(build_dir.path());
    let registry = Registry::simkube().unwrap();

    let mut dev_snapshots = Vec::new();
    let mut release_snapshots = Vec::new();
    for _ in 0..2 {
        let out_dir = TempDir::new().unwrap();
        let report = Packager::new(dev_config(build_dir.path()))
            .run(&registry, out_dir.path())
            .unwrap();
        dev_snapshots.push((snapshot(out_dir.path()), report.manifest_stream));

        let out_dir = TempDir::new().unwrap();
        Packager::new(release_config("1.2.3"))
            .run(&registry, out_dir.path())
            .unwrap();
        release_snapshots.push(snapshot(out_dir.path()));
    }

    assert_eq!(dev_snapshots[0], dev_snapshots[1]);
    assert_eq!(release_snapshots[0], release_snapshots[1]);
}

#[test]
fn test_release_overlay_tree_is_complete() {
    let out_dir = TempDir::new().unwrap();
    let registry = Registry::simkube().unwrap();
    Packager::new(release_config("1.2.3"))
        .run(&registry, out_dir.path())
        .unwrap();

    let base_listing =
        fs::read_to_string(out_dir.path().join("base/kustomization.yaml")).unwrap();
    for (index, app) in [
        "sk-cloudprov",
        "cluster-autoscaler",
        "sk-vnode",
        "sk-tracer",
        "sk-ctrl",
        "test-workload",
    ]
    .iter()
    .enumerate()
    {
        let filename = format!("{index:04}-{app}.k8s.yaml");
        assert!(
            base_listing.contains(&filename),
            "base kustomization missing {filename}"
        );
        assert!(out_dir.path().join("base").join(&filename).is_file());
    }

    for overlay in ["prod", "sim"] {
        let listing =
            fs::read_to_string(out_dir.path().join(overlay).join("kustomization.yaml")).unwrap();
        assert!(listing.contains("- ../base"));
    }
}

#[test]
fn test_release_documents_use_versioned_references_and_no_dev_posture() {
    let out_dir = TempDir::new().unwrap();
    let registry = Registry::simkube().unwrap();
    let report = Packager::new(release_config("1.2.3"))
        .run(&registry, out_dir.path())
        .unwrap();

    let ctrl = fs::read_to_string(out_dir.path().join("base/0004-sk-ctrl.k8s.yaml")).unwrap();
    assert!(ctrl.contains("image: quay.io/appliedcomputing/sk-ctrl:v1.2.3"));
    // Kind-cluster node selectors and the debug capability are a
    // dev-only posture.
    assert!(!report.manifest_stream.contains("nodeSelector"));
    assert!(!report.manifest_stream.contains("debug: true"));
}

#[test]
fn test_dev_documents_carry_dev_posture() {
    let build_dir = TempDir::new().unwrap();
    let out_dir = TempDir::new().unwrap();
    write_image_files(build_dir.path());

    let registry = Registry::simkube().unwrap();
    let report = Packager::new(dev_config(build_dir.path()))
        .run(&registry, out_dir.path())
        .unwrap();

    assert!(report.manifest_stream.contains("kind-worker"));
    assert!(report.manifest_stream.contains("debug: true"));
}

#[test]
fn test_duplicate_ids_fail_before_any_packaging_output() {
    let specs = vec![
        ApplicationSpec {
            id: "sk-ctrl".to_string(),
            ..Default::default()
        },
        ApplicationSpec {
            id: "sk-ctrl".to_string(),
            ..Default::default()
        },
    ];

    let result = Registry::new(specs);
    assert!(matches!(
        result,
        Err(skpack_meta::Error::DuplicateApplication { id }) if id == "sk-ctrl"
    ));
}
