//! simkube manifest packager CLI
//!
//! One-shot batch tool: reads the environment and the build directory
//! once, packages the application catalog, writes the artifacts, exits.

mod cli;
mod error;

use clap::Parser;
use colored::Colorize;
use skpack_core::{PackagingMode, Packager, RunConfig};
use skpack_meta::Registry;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use cli::Cli;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing if verbose
    if cli.verbose {
        // Log to stderr; stdout belongs to the manifest stream.
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
        tracing::debug!("Verbose mode enabled");
    }

    let config = RunConfig::from_env(cli.mode())?;
    let registry = Registry::simkube()?;
    let report = Packager::new(config).run(&registry, &cli.output)?;

    if report.mode == PackagingMode::DevGraph {
        // The manifest stream is the primary dev output; keep stdout
        // clean so it can be piped straight into an apply step.
        print!("{}", report.manifest_stream);
    }

    eprintln!(
        "{} packaged {} artifacts under {} ({})",
        "skpack".green().bold(),
        report.artifacts.len(),
        cli.output.display(),
        report.mode
    );
    Ok(())
}
