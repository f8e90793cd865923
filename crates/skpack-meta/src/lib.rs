//! Application model and registry for the simkube manifest packager
//!
//! This crate is the leaf layer of the packager: it defines what a
//! deployable application *is* (entrypoint, environment, config-map
//! volumes, scheduling constraints, dependencies) and the validated,
//! compile-time-fixed catalog of applications that make up the
//! simulation platform.
//!
//! It deliberately knows nothing about packaging modes, image
//! resolution, or output layouts; those live in `skpack-core`.

pub mod app;
pub mod error;
pub mod registry;

pub use app::{
    ApplicationSpec, DownwardField, EnvValue, ImageSource, TaintEffect, Toleration, VolumeMount,
};
pub use error::{Error, Result};
pub use registry::{NAMESPACE, Registry};
