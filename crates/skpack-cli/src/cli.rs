//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::Parser;
use skpack_core::PackagingMode;

/// Assemble deployment manifests for the simulation platform
///
/// Without flags, prints the dependency-ordered manifest stream for the
/// local dev cluster and writes the dependency diagram and manifest
/// diff next to it. With `--kustomize`, writes the release overlay
/// trees instead.
#[derive(Parser, Debug)]
#[command(name = "skpack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Emit kustomize overlay trees (release) instead of the dev
    /// manifest stream
    #[arg(short, long)]
    pub kustomize: bool,

    /// Directory artifacts are written to
    #[arg(short, long, default_value = "dist")]
    pub output: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// The packaging mode selected by the flags.
    pub fn mode(&self) -> PackagingMode {
        if self.kustomize {
            PackagingMode::ReleaseKustomize
        } else {
            PackagingMode::DevGraph
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_dev_graph() {
        let cli = Cli::try_parse_from(["skpack"]).unwrap();
        assert_eq!(cli.mode(), PackagingMode::DevGraph);
        assert_eq!(cli.output, PathBuf::from("dist"));
        assert!(!cli.verbose);
    }

    #[test]
    fn test_kustomize_flag_selects_release() {
        let cli = Cli::try_parse_from(["skpack", "--kustomize"]).unwrap();
        assert_eq!(cli.mode(), PackagingMode::ReleaseKustomize);
    }

    #[test]
    fn test_output_override() {
        let cli = Cli::try_parse_from(["skpack", "-o", "/tmp/manifests"]).unwrap();
        assert_eq!(cli.output, PathBuf::from("/tmp/manifests"));
    }
}
