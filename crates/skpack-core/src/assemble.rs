//! Manifest assembly
//!
//! The [`Assembler`] trait is the seam to the manifest-assembly
//! collaborator: one `compile` call over the resolved application set
//! yields ordered manifest documents plus a dependency diagram. The
//! built-in [`ManifestRenderer`] computes a stable topological order
//! (catalog order breaks ties) and serializes each application as a
//! compact YAML document of this crate's own model. It does not model
//! full Kubernetes object schemas, which remain the collaborator's
//! concern.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use skpack_meta::{ApplicationSpec, EnvValue, registry::NAMESPACE};

use crate::error::Result;
use crate::image::ResolvedImage;
use crate::target::TargetPolicy;

/// An application annotated with its resolved image and the run's
/// debug/scheduling posture already applied.
#[derive(Debug, Clone)]
pub struct ResolvedApplication {
    pub spec: ApplicationSpec,
    pub image: ResolvedImage,
    /// Whether this container receives the elevated debug capability.
    pub debug: bool,
}

impl ResolvedApplication {
    /// Annotate a spec with its image and apply the target policy:
    /// node selectors are stripped when the policy says not to apply
    /// them, and the debug capability is granted only to debug-capable
    /// applications under a debug posture.
    pub fn new(spec: &ApplicationSpec, image: ResolvedImage, policy: &TargetPolicy) -> Self {
        let mut spec = spec.clone();
        if !policy.apply_node_selectors {
            spec.node_selector.clear();
        }
        let debug = policy.debug_capabilities && spec.debug_capable;
        Self { spec, image, debug }
    }
}

/// One rendered manifest document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub app_id: String,
    pub yaml: String,
}

/// The result of one assembly pass: documents in dependency order plus
/// a rendered dependency diagram.
#[derive(Debug, Clone)]
pub struct Compiled {
    pub documents: Vec<Document>,
    pub diagram: String,
}

/// The manifest-assembly collaborator seam.
///
/// Callers hand over the full resolved application set in one call;
/// implementations own document rendering and ordering. Inputs are
/// expected to come from a validated [`Registry`](skpack_meta::Registry),
/// so dependency references are known to exist and be acyclic.
pub trait Assembler {
    fn compile(&self, apps: &[ResolvedApplication]) -> Result<Compiled>;
}

/// Built-in assembler rendering compact YAML application documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestRenderer;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ManifestDoc {
    name: String,
    namespace: String,
    image: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    args: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    env: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    config_maps: Vec<ConfigMapDoc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ports: Vec<u16>,
    service: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    requests: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    node_selector: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tolerations: Vec<String>,
    debug: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigMapDoc {
    name: String,
    mount_path: String,
    files: BTreeMap<String, String>,
}

impl ManifestDoc {
    fn from_app(app: &ResolvedApplication) -> Self {
        let spec = &app.spec;
        Self {
            name: spec.id.clone(),
            namespace: NAMESPACE.to_string(),
            image: app.image.reference().to_string(),
            args: spec.args.clone(),
            env: spec
                .env
                .iter()
                .map(|(name, value)| {
                    let rendered = match value {
                        EnvValue::Literal(v) => v.clone(),
                        EnvValue::FieldRef(field) => format!("downward:{field}"),
                    };
                    (name.clone(), rendered)
                })
                .collect(),
            config_maps: spec
                .volumes
                .iter()
                .map(|v| ConfigMapDoc {
                    name: v.name.clone(),
                    mount_path: v.mount_path.clone(),
                    files: v.files.clone(),
                })
                .collect(),
            ports: spec.ports.clone(),
            service: spec.expose_service,
            requests: spec.requests.clone(),
            node_selector: spec.node_selector.clone(),
            tolerations: spec
                .tolerations
                .iter()
                .map(|t| format!("{}={}:{}", t.key, t.value, t.effect))
                .collect(),
            debug: app.debug,
        }
    }
}

impl Assembler for ManifestRenderer {
    fn compile(&self, apps: &[ResolvedApplication]) -> Result<Compiled> {
        let order = dependency_order(apps)?;

        let mut documents = Vec::with_capacity(apps.len());
        for &idx in &order {
            let app = &apps[idx];
            let yaml = serde_yaml::to_string(&ManifestDoc::from_app(app))?;
            documents.push(Document {
                app_id: app.spec.id.clone(),
                yaml,
            });
        }

        let diagram = render_diagram(apps, &order);
        Ok(Compiled { documents, diagram })
    }
}

/// Stable topological sort: among the ready applications, input order
/// wins. Input size is the platform catalog, so the quadratic scan is
/// irrelevant.
fn dependency_order(apps: &[ResolvedApplication]) -> Result<Vec<usize>> {
    let mut placed = HashSet::new();
    let mut remaining: Vec<usize> = (0..apps.len()).collect();
    let mut order = Vec::with_capacity(apps.len());

    while !remaining.is_empty() {
        let next = remaining.iter().position(|&i| {
            apps[i]
                .spec
                .depends_on
                .iter()
                .all(|dep| placed.contains(dep.as_str()))
        });
        match next {
            Some(pos) => {
                let idx = remaining.remove(pos);
                placed.insert(apps[idx].spec.id.as_str());
                order.push(idx);
            }
            None => {
                let stuck: Vec<&str> = remaining
                    .iter()
                    .map(|&i| apps[i].spec.id.as_str())
                    .collect();
                return Err(skpack_meta::Error::DependencyCycle {
                    path: stuck.join(" -> "),
                }
                .into());
            }
        }
    }
    Ok(order)
}

/// Mermaid rendering of the dependency graph, edges pointing from a
/// dependency to its dependent. Independent applications appear as
/// bare nodes.
fn render_diagram(apps: &[ResolvedApplication], order: &[usize]) -> String {
    let mut lines = vec!["graph TD".to_string()];
    for &idx in order {
        let spec = &apps[idx].spec;
        if spec.depends_on.is_empty() {
            lines.push(format!("    {}", spec.id));
        } else {
            for dep in &spec.depends_on {
                lines.push(format!("    {} --> {}", dep, spec.id));
            }
        }
    }
    lines.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use skpack_meta::ImageSource;

    use super::*;
    use crate::config::RunConfig;
    use crate::image;
    use crate::mode::PackagingMode;

    fn resolved(id: &str, depends_on: &[&str], policy: &TargetPolicy) -> ResolvedApplication {
        let spec = ApplicationSpec {
            id: id.to_string(),
            image: ImageSource::Pinned(format!("registry.example.com/{id}:latest")),
            depends_on: depends_on.iter().map(|d| d.to_string()).collect(),
            debug_capable: true,
            ..Default::default()
        };
        let config = RunConfig::new(
            PackagingMode::ReleaseKustomize,
            None,
            Some("0.0.0".to_string()),
        )
        .unwrap();
        let img = image::resolve(&spec, &config).unwrap();
        ResolvedApplication::new(&spec, img, policy)
    }

    #[test]
    fn test_dependencies_precede_dependents() {
        let policy = TargetPolicy::for_mode(PackagingMode::DevGraph);
        // "a" declared first but depends on "b"
        let apps = vec![resolved("a", &["b"], &policy), resolved("b", &[], &policy)];

        let compiled = ManifestRenderer.compile(&apps).unwrap();
        let ids: Vec<&str> = compiled
            .documents
            .iter()
            .map(|d| d.app_id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_independent_apps_keep_catalog_order() {
        let policy = TargetPolicy::for_mode(PackagingMode::DevGraph);
        let apps = vec![
            resolved("x", &[], &policy),
            resolved("y", &[], &policy),
            resolved("z", &[], &policy),
        ];

        let compiled = ManifestRenderer.compile(&apps).unwrap();
        let ids: Vec<&str> = compiled
            .documents
            .iter()
            .map(|d| d.app_id.as_str())
            .collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_diagram_lists_edges_and_bare_nodes() {
        let policy = TargetPolicy::for_mode(PackagingMode::DevGraph);
        let apps = vec![
            resolved("ca", &["prov"], &policy),
            resolved("prov", &[], &policy),
            resolved("lone", &[], &policy),
        ];

        let compiled = ManifestRenderer.compile(&apps).unwrap();
        assert_eq!(compiled.diagram, "graph TD\n    prov\n    prov --> ca\n    lone\n");
    }

    #[test]
    fn test_policy_strips_node_selectors_and_debug() {
        let spec = ApplicationSpec {
            id: "app".to_string(),
            image: ImageSource::Pinned("img:1".to_string()),
            node_selector: std::collections::BTreeMap::from([(
                "type".to_string(),
                "kind-worker".to_string(),
            )]),
            debug_capable: true,
            ..Default::default()
        };
        let config = RunConfig::new(
            PackagingMode::ReleaseKustomize,
            None,
            Some("1.0.0".to_string()),
        )
        .unwrap();
        let img = image::resolve(&spec, &config).unwrap();

        let release = TargetPolicy::for_mode(PackagingMode::ReleaseKustomize);
        let app = ResolvedApplication::new(&spec, img.clone(), &release);
        assert!(app.spec.node_selector.is_empty());
        assert!(!app.debug);

        let dev = TargetPolicy::for_mode(PackagingMode::DevGraph);
        let app = ResolvedApplication::new(&spec, img, &dev);
        assert_eq!(app.spec.node_selector.len(), 1);
        assert!(app.debug);
    }

    #[test]
    fn test_debug_posture_respects_debug_capable() {
        let spec = ApplicationSpec {
            id: "nginx".to_string(),
            image: ImageSource::Pinned("nginx:latest".to_string()),
            debug_capable: false,
            ..Default::default()
        };
        let config = RunConfig::new(
            PackagingMode::ReleaseKustomize,
            None,
            Some("1.0.0".to_string()),
        )
        .unwrap();
        let img = image::resolve(&spec, &config).unwrap();

        let dev = TargetPolicy::for_mode(PackagingMode::DevGraph);
        let app = ResolvedApplication::new(&spec, img, &dev);
        assert!(!app.debug);
    }

    #[test]
    fn test_document_renders_image_env_and_tolerations() {
        use skpack_meta::{DownwardField, TaintEffect, Toleration};

        let spec = ApplicationSpec {
            id: "app".to_string(),
            image: ImageSource::Pinned("img:1".to_string()),
            env: std::collections::BTreeMap::from([
                ("RUST_BACKTRACE".to_string(), EnvValue::literal("1")),
                (
                    "POD_NAME".to_string(),
                    EnvValue::FieldRef(DownwardField::PodName),
                ),
            ]),
            tolerations: vec![Toleration::new("kwok-provider", "true", TaintEffect::NoSchedule)],
            debug_capable: true,
            ..Default::default()
        };
        let config = RunConfig::new(
            PackagingMode::ReleaseKustomize,
            None,
            Some("1.0.0".to_string()),
        )
        .unwrap();
        let img = image::resolve(&spec, &config).unwrap();
        let policy = TargetPolicy::for_mode(PackagingMode::DevGraph);
        let apps = vec![ResolvedApplication::new(&spec, img, &policy)];

        let compiled = ManifestRenderer.compile(&apps).unwrap();
        let yaml = &compiled.documents[0].yaml;
        assert!(yaml.contains("image: img:1"));
        assert!(yaml.contains("namespace: simkube"));
        assert!(yaml.contains("POD_NAME: downward:pod-name"));
        assert!(yaml.contains("RUST_BACKTRACE: '1'"));
        assert!(yaml.contains("kwok-provider=true:NoSchedule"));
        assert!(yaml.contains("debug: true"));
    }

    #[test]
    fn test_unsatisfiable_dependencies_error_instead_of_looping() {
        let policy = TargetPolicy::for_mode(PackagingMode::DevGraph);
        let apps = vec![resolved("a", &["b"], &policy), resolved("b", &["a"], &policy)];

        let result = ManifestRenderer.compile(&apps);
        assert!(matches!(
            result,
            Err(crate::Error::Meta(skpack_meta::Error::DependencyCycle { .. }))
        ));
    }
}
