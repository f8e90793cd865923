//! The application registry
//!
//! A [`Registry`] is an ordered, fixed collection of application specs
//! validated once at construction: ids must be unique, dependencies
//! must reference existing ids, and the dependency graph must be
//! acyclic. Validation happens here, before any packaging output is
//! produced; the downstream assembly step performs no cross-checks of
//! its own.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::app::{
    ApplicationSpec, DownwardField, EnvValue, ImageSource, TaintEffect, Toleration, VolumeMount,
};
use crate::error::{Error, Result};

/// Namespace all platform components are deployed into.
pub const NAMESPACE: &str = "simkube";

/// Application ids, in catalog order.
pub const CLOUDPROV_ID: &str = "sk-cloudprov";
pub const AUTOSCALER_ID: &str = "cluster-autoscaler";
pub const VNODE_ID: &str = "sk-vnode";
pub const TRACER_ID: &str = "sk-tracer";
pub const CTRL_ID: &str = "sk-ctrl";
pub const TEST_WORKLOAD_ID: &str = "test-workload";

/// gRPC port the cloud-provider shim listens on.
pub const CLOUDPROV_GRPC_PORT: u16 = 8086;

/// HTTP port the tracer serves traces on.
pub const TRACER_SERVER_PORT: u16 = 7777;

const NODE_SKELETON_YML: &str = "---
apiVersion: v1
kind: Node
status:
  allocatable:
    cpu: \"16\"
    memory: \"32Gi\"
  capacity:
    cpu: \"16\"
    memory: \"32Gi\"
";

const TRACER_CONFIG_YML: &str = "---
trackedObjects:
  apps/v1.Deployment:
    podSpecTemplatePath: /spec/template
  v1.ServiceAccount: {}
  v1.ConfigMap: {}
";

/// An ordered, validated collection of application specs.
#[derive(Debug, Clone)]
pub struct Registry {
    apps: Vec<ApplicationSpec>,
}

impl Registry {
    /// Validate the given specs and build a registry.
    ///
    /// # Errors
    ///
    /// - [`Error::DuplicateApplication`] if two specs share an id
    /// - [`Error::UnknownDependency`] if `depends_on` names an id that
    ///   is not in the collection
    /// - [`Error::DependencyCycle`] if the dependency graph is not a DAG
    pub fn new(apps: Vec<ApplicationSpec>) -> Result<Self> {
        let mut seen = HashSet::new();
        for app in &apps {
            if !seen.insert(app.id.as_str()) {
                return Err(Error::DuplicateApplication {
                    id: app.id.clone(),
                });
            }
        }

        for app in &apps {
            for dep in &app.depends_on {
                if !seen.contains(dep.as_str()) {
                    return Err(Error::UnknownDependency {
                        id: app.id.clone(),
                        depends_on: dep.clone(),
                    });
                }
            }
        }

        check_acyclic(&apps)?;

        tracing::debug!(count = apps.len(), "Registry validated");
        Ok(Self { apps })
    }

    /// The built-in catalog of simulation-platform applications.
    pub fn simkube() -> Result<Self> {
        Self::new(vec![
            cloudprov(),
            cluster_autoscaler(),
            vnode(),
            tracer(),
            controller(),
            test_workload(),
        ])
    }

    /// Applications in catalog order.
    pub fn applications(&self) -> &[ApplicationSpec] {
        &self.apps
    }

    /// Look up one application by id.
    pub fn get(&self, id: &str) -> Option<&ApplicationSpec> {
        self.apps.iter().find(|app| app.id == id)
    }

    /// Number of applications in the registry.
    pub fn len(&self) -> usize {
        self.apps.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

/// Cycle detection over `depends_on` edges (DFS coloring).
fn check_acyclic(apps: &[ApplicationSpec]) -> Result<()> {
    #[derive(Copy, Clone, PartialEq, Eq)]
    enum Mark {
        Temp,
        Perm,
    }

    fn dfs(
        id: &str,
        deps: &HashMap<&str, &[String]>,
        marks: &mut HashMap<String, Mark>,
        stack: &mut Vec<String>,
    ) -> Result<()> {
        match marks.get(id) {
            Some(Mark::Perm) => return Ok(()),
            Some(Mark::Temp) => {
                // id is in the current recursion stack
                stack.push(id.to_string());
                return Err(Error::DependencyCycle {
                    path: stack.join(" -> "),
                });
            }
            None => {}
        }

        marks.insert(id.to_string(), Mark::Temp);
        stack.push(id.to_string());

        if let Some(targets) = deps.get(id) {
            for dep in targets.iter() {
                dfs(dep, deps, marks, stack)?;
            }
        }

        stack.pop();
        marks.insert(id.to_string(), Mark::Perm);
        Ok(())
    }

    let deps: HashMap<&str, &[String]> = apps
        .iter()
        .map(|app| (app.id.as_str(), app.depends_on.as_slice()))
        .collect();

    let mut marks = HashMap::new();
    let mut stack = Vec::new();
    for app in apps {
        stack.clear();
        dfs(&app.id, &deps, &mut marks, &mut stack)?;
    }
    Ok(())
}

fn kind_worker() -> BTreeMap<String, String> {
    BTreeMap::from([("type".to_string(), "kind-worker".to_string())])
}

fn cloudprov() -> ApplicationSpec {
    ApplicationSpec {
        id: CLOUDPROV_ID.to_string(),
        image: ImageSource::Built,
        args: vec!["/sk-cloudprov".to_string()],
        ports: vec![CLOUDPROV_GRPC_PORT],
        expose_service: true,
        node_selector: kind_worker(),
        debug_capable: true,
        ..Default::default()
    }
}

fn cluster_autoscaler() -> ApplicationSpec {
    let config = VolumeMount::config_map(
        "cluster-autoscaler-config",
        "/config",
        BTreeMap::from([(
            "config.yml".to_string(),
            // The autoscaler's externalgrpc backend dials the
            // cloud-provider shim through its service name.
            format!("---\naddress: {CLOUDPROV_ID}:{CLOUDPROV_GRPC_PORT}\n"),
        )]),
    );
    let config_path = config.path_to("config.yml");

    ApplicationSpec {
        id: AUTOSCALER_ID.to_string(),
        image: ImageSource::Pinned("localhost:5000/cluster-autoscaler:latest".to_string()),
        args: vec![
            "/cluster-autoscaler".to_string(),
            "--cloud-provider".to_string(),
            "externalgrpc".to_string(),
            "--cloud-config".to_string(),
            config_path,
            "--scale-down-delay-after-add".to_string(),
            "1m".to_string(),
            "--scale-down-unneeded-time".to_string(),
            "1m".to_string(),
            "--v".to_string(),
            "4".to_string(),
        ],
        volumes: vec![config],
        depends_on: vec![CLOUDPROV_ID.to_string()],
        node_selector: BTreeMap::from([("type".to_string(), "kind-control-plane".to_string())]),
        tolerations: vec![Toleration::new(
            "node-role.kubernetes.io/control-plane",
            "",
            TaintEffect::NoSchedule,
        )],
        debug_capable: true,
        ..Default::default()
    }
}

fn vnode() -> ApplicationSpec {
    let skeleton = VolumeMount::config_map(
        "node-skeleton",
        "/config",
        BTreeMap::from([("node.yml".to_string(), NODE_SKELETON_YML.to_string())]),
    );
    let skeleton_path = skeleton.path_to("node.yml");

    ApplicationSpec {
        id: VNODE_ID.to_string(),
        image: ImageSource::Built,
        args: vec![
            "/sk-vnode".to_string(),
            "--node-skeleton".to_string(),
            skeleton_path,
        ],
        env: BTreeMap::from([
            ("POD_NAME".to_string(), EnvValue::FieldRef(DownwardField::PodName)),
            (
                "POD_NAMESPACE".to_string(),
                EnvValue::FieldRef(DownwardField::PodNamespace),
            ),
        ]),
        volumes: vec![skeleton],
        node_selector: kind_worker(),
        debug_capable: true,
        ..Default::default()
    }
}

fn tracer() -> ApplicationSpec {
    let config = VolumeMount::config_map(
        "tracer-config",
        "/config",
        BTreeMap::from([(
            "tracer-config.yml".to_string(),
            TRACER_CONFIG_YML.to_string(),
        )]),
    );
    let config_path = config.path_to("tracer-config.yml");

    ApplicationSpec {
        id: TRACER_ID.to_string(),
        image: ImageSource::Built,
        args: vec![
            "/sk-tracer".to_string(),
            "--server-port".to_string(),
            TRACER_SERVER_PORT.to_string(),
            "-c".to_string(),
            config_path,
        ],
        env: BTreeMap::from([(
            "RUST_BACKTRACE".to_string(),
            EnvValue::literal("1"),
        )]),
        volumes: vec![config],
        ports: vec![TRACER_SERVER_PORT],
        expose_service: true,
        node_selector: kind_worker(),
        debug_capable: true,
        ..Default::default()
    }
}

fn controller() -> ApplicationSpec {
    ApplicationSpec {
        id: CTRL_ID.to_string(),
        image: ImageSource::Built,
        args: vec![
            "/sk-ctrl".to_string(),
            "--driver-secrets".to_string(),
            "simkube".to_string(),
            "--use-cert-manager".to_string(),
            "--cert-manager-issuer".to_string(),
            "selfsigned".to_string(),
        ],
        env: BTreeMap::from([
            ("RUST_BACKTRACE".to_string(), EnvValue::literal("1")),
            (
                "POD_SVC_ACCOUNT".to_string(),
                EnvValue::FieldRef(DownwardField::ServiceAccountName),
            ),
            (
                "CTRL_NAMESPACE".to_string(),
                EnvValue::FieldRef(DownwardField::PodNamespace),
            ),
        ]),
        node_selector: kind_worker(),
        debug_capable: true,
        ..Default::default()
    }
}

fn test_workload() -> ApplicationSpec {
    ApplicationSpec {
        id: TEST_WORKLOAD_ID.to_string(),
        image: ImageSource::Pinned("nginx:latest".to_string()),
        requests: BTreeMap::from([("cpu".to_string(), "1".to_string())]),
        node_selector: BTreeMap::from([("type".to_string(), "virtual".to_string())]),
        tolerations: vec![Toleration::new(
            "kwok-provider",
            "true",
            TaintEffect::NoSchedule,
        )],
        debug_capable: false,
        ..Default::default()
    }
}
