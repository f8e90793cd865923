//! Application specification types
//!
//! An [`ApplicationSpec`] is a plain, immutable description of one
//! deployable unit. There is no builder chain: specs are written as
//! struct literals and validated in one place, by
//! [`Registry::new`](crate::registry::Registry::new).

use std::collections::BTreeMap;
use std::fmt;

/// How the container image for an application is obtained.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageSource {
    /// Built by this repository's build pipeline; the reference is
    /// resolved at packaging time (build-dir file in dev, versioned
    /// registry path in release).
    #[default]
    Built,

    /// A fixed reference used verbatim in every packaging mode.
    Pinned(String),
}

/// Downward field references available to container environments.
///
/// These inject runtime pod metadata without hardcoding it into the
/// manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownwardField {
    PodName,
    PodNamespace,
    ServiceAccountName,
}

impl fmt::Display for DownwardField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownwardField::PodName => write!(f, "pod-name"),
            DownwardField::PodNamespace => write!(f, "pod-namespace"),
            DownwardField::ServiceAccountName => write!(f, "service-account-name"),
        }
    }
}

/// Source of one environment variable's value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvValue {
    /// A literal string value.
    Literal(String),
    /// A downward field reference resolved by the platform at runtime.
    FieldRef(DownwardField),
}

impl EnvValue {
    pub fn literal(value: impl Into<String>) -> Self {
        EnvValue::Literal(value.into())
    }
}

/// A projected config-map volume: a set of named files mounted together
/// under one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMount {
    /// Config-map name.
    pub name: String,
    /// Directory the files appear under inside the container.
    pub mount_path: String,
    /// Filename -> file content, inlined at definition time.
    pub files: BTreeMap<String, String>,
}

impl VolumeMount {
    pub fn config_map(
        name: impl Into<String>,
        mount_path: impl Into<String>,
        files: BTreeMap<String, String>,
    ) -> Self {
        Self {
            name: name.into(),
            mount_path: mount_path.into(),
            files,
        }
    }

    /// Path a mounted file is visible at inside the container.
    ///
    /// Used when an entrypoint argument must reference its own mounted
    /// configuration file.
    pub fn path_to(&self, filename: &str) -> String {
        format!("{}/{}", self.mount_path.trim_end_matches('/'), filename)
    }
}

/// Taint effects an application may tolerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaintEffect {
    NoSchedule,
    NoExecute,
    PreferNoSchedule,
}

impl fmt::Display for TaintEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaintEffect::NoSchedule => write!(f, "NoSchedule"),
            TaintEffect::NoExecute => write!(f, "NoExecute"),
            TaintEffect::PreferNoSchedule => write!(f, "PreferNoSchedule"),
        }
    }
}

/// A scheduling toleration (key, value, effect).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toleration {
    pub key: String,
    pub value: String,
    pub effect: TaintEffect,
}

impl Toleration {
    pub fn new(key: impl Into<String>, value: impl Into<String>, effect: TaintEffect) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            effect,
        }
    }
}

/// One deployable unit of the simulation platform.
///
/// Everything here is fixed at definition time; nothing is discovered
/// dynamically. `depends_on` states ordering constraints for the
/// assembly step, which computes the actual order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApplicationSpec {
    /// Unique stable identifier, e.g. `sk-ctrl`.
    pub id: String,

    /// How the container image is obtained.
    pub image: ImageSource,

    /// Ordered entrypoint tokens (command plus flags).
    pub args: Vec<String>,

    /// Environment variable name -> value source.
    pub env: BTreeMap<String, EnvValue>,

    /// Config-map volumes mounted into the container.
    pub volumes: Vec<VolumeMount>,

    /// Container ports.
    pub ports: Vec<u16>,

    /// Whether the application is exposed through a service.
    pub expose_service: bool,

    /// Resource requests (resource name -> quantity).
    pub requests: BTreeMap<String, String>,

    /// Ids of applications that must be realized before this one.
    pub depends_on: Vec<String>,

    /// Node-selector constraints (key -> value).
    pub node_selector: BTreeMap<String, String>,

    /// Taint tolerations.
    pub tolerations: Vec<Toleration>,

    /// Whether the container may receive the elevated debug capability
    /// when the packaging run asks for a debug posture.
    pub debug_capable: bool,
}
