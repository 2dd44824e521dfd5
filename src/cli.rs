//! Command line surface of the `registry-bundler` binary.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing::warn;

use crate::bundles::{BundleTable, build_bundles};
use crate::config::ProjectConfig;
use crate::filesystem::DiskFs;
use crate::flat::build_flat;
use crate::project::RegistryBuildContext;
use crate::transform::{TransformOptions, transform_output};

/// Publish a component registry as static, index-compatible JSON.
#[derive(Debug, Parser)]
#[command(name = "registry-bundler", version, about)]
pub struct Cli {
  /// Project root containing the registry descriptor.
  #[arg(long, global = true, default_value = ".")]
  pub root: PathBuf,
  /// Configuration file; defaults to `registry.config.json` in the root when present.
  #[arg(long, global = true)]
  pub config: Option<PathBuf>,
  /// Output directory, relative to the root.
  #[arg(long, global = true)]
  pub output: Option<String>,
  /// Registry descriptor, relative to the root.
  #[arg(long, global = true)]
  pub registry: Option<String>,
  /// Base URL that internal dependencies are rewritten against.
  #[arg(long, global = true)]
  pub base_url: Option<String>,
  /// Increase log verbosity (-v, -vv).
  #[arg(short, long, global = true, action = ArgAction::Count)]
  pub verbose: u8,
  /// Suppress all log output.
  #[arg(short, long, global = true)]
  pub quiet: bool,
  /// Build step to run.
  #[command(subcommand)]
  pub command: Command,
}

/// Build steps.
#[derive(Debug, Subcommand)]
pub enum Command {
  /// Write a bundle descriptor and registry index for every backend.
  Bundles {
    /// JSON file replacing the built-in backend table.
    #[arg(long)]
    bundles: Option<PathBuf>,
  },
  /// Write per-item descriptors without inline content and copy their source files.
  Flat,
  /// Rewrite `registryDependencies` across the output tree in place.
  Transform {
    /// List files that would change without writing them.
    #[arg(long)]
    check: bool,
  },
  /// Run bundles, flat and transform in order.
  All,
}

impl Cli {
  /// Load the project configuration and apply command line overrides.
  pub fn resolve_config(&self) -> Result<ProjectConfig> {
    let mut config = match &self.config {
      Some(path) => ProjectConfig::from_path(path)
        .with_context(|| format!("failed to load configuration {}", path.display()))?,
      None => ProjectConfig::discover(&self.root),
    };

    if let Some(output) = &self.output {
      config.output_dir = output.clone();
    }
    if let Some(registry) = &self.registry {
      config.registry_file = registry.clone();
    }
    if let Some(base_url) = &self.base_url {
      config.base_url = base_url.clone();
    }
    if let Command::Bundles {
      bundles: Some(path),
    } = &self.command
    {
      config.bundles_file = Some(path.to_string_lossy().into_owned());
    }
    Ok(config)
  }
}

/// Execute the parsed command against the real filesystem.
pub fn run(cli: &Cli) -> Result<()> {
  let config = cli.resolve_config()?;
  let context = RegistryBuildContext::new(&cli.root, config.to_layout(), &DiskFs);

  match &cli.command {
    Command::Bundles { .. } => run_bundles(&context, &config, &cli.root),
    Command::Flat => run_flat(&context),
    Command::Transform { check } => {
      run_transform(&context, *check);
      Ok(())
    }
    Command::All => {
      run_bundles(&context, &config, &cli.root)?;
      run_flat(&context)?;
      run_transform(&context, false);
      Ok(())
    }
  }
}

fn run_bundles(context: &RegistryBuildContext, config: &ProjectConfig, root: &Path) -> Result<()> {
  let table = match config.bundles_path(root) {
    Some(path) => BundleTable::from_path(context.fs, &path)
      .with_context(|| format!("failed to load bundle table {}", path.display()))?,
    None => BundleTable::builtin(),
  };
  build_bundles(context, &table).context("bundle build failed")?;
  Ok(())
}

fn run_flat(context: &RegistryBuildContext) -> Result<()> {
  build_flat(context).context("registry build failed")?;
  Ok(())
}

fn run_transform(context: &RegistryBuildContext, check: bool) {
  let report = transform_output(context, TransformOptions { check });
  if !report.failed.is_empty() {
    warn!("{} files could not be transformed", report.failed.len());
  }
}
