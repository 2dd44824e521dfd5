//! Project configuration loader describing registry locations and published URLs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{RegistryError, Result};
use crate::project::RegistryLayout;

/// File searched for in the project root by [`ProjectConfig::discover`].
pub const DEFAULT_CONFIG_FILE: &str = "registry.config.json";

/// Discoverable project configuration describing inputs, outputs and URL rewriting.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
  /// Absolute URL under which the output directory is published.
  pub base_url: String,
  /// Dependency identifiers starting with this prefix refer to items of this registry.
  pub internal_prefix: String,
  /// Top-level registry descriptor, relative to the project root.
  pub registry_file: String,
  /// Directory receiving every generated artifact, relative to the project root.
  pub output_dir: String,
  /// Directory name holding authored registry sources; never rewritten by the post-build pass.
  pub source_registry_dir: String,
  /// `name` field of generated registry indexes.
  pub registry_name: String,
  /// `homepage` field of generated registry indexes.
  pub homepage: String,
  /// `$schema` tag written into item descriptors.
  pub item_schema: String,
  /// `$schema` tag written into registry indexes.
  pub registry_schema: String,
  /// File stem of the per-backend bundle descriptor.
  pub bundle_file_name: String,
  /// Optional JSON file replacing the built-in backend table.
  pub bundles_file: Option<String>,
}

impl Default for ProjectConfig {
  fn default() -> Self {
    Self {
      base_url: "https://raw.githubusercontent.com/RMNCLDYO/coderabbit-shadcn-registry/main/public/r"
        .into(),
      internal_prefix: "coderabbit-".into(),
      registry_file: "registry.json".into(),
      output_dir: "public/r".into(),
      source_registry_dir: "registry".into(),
      registry_name: "coderabbit".into(),
      homepage: "https://github.com/RMNCLDYO/coderabbit-shadcn-registry".into(),
      item_schema: "https://ui.shadcn.com/schema/registry-item.json".into(),
      registry_schema: "https://ui.shadcn.com/schema/registry.json".into(),
      bundle_file_name: "coderabbit-bundle".into(),
      bundles_file: None,
    }
  }
}

impl ProjectConfig {
  /// Attempt to load configuration from the provided project root.
  ///
  /// A missing or unparseable file yields the defaults so the builders keep working on a
  /// checkout without any configuration.
  pub fn discover(root: &Path) -> Self {
    let candidate = root.join(DEFAULT_CONFIG_FILE);
    match Self::from_path(&candidate) {
      Ok(config) => config,
      Err(err) => {
        if candidate.exists() {
          tracing::warn!("ignoring {}: {err}", candidate.display());
        }
        Self::default()
      }
    }
  }

  /// Read configuration from a specific JSON file.
  pub fn from_path(path: &Path) -> Result<Self> {
    let content = fs::read_to_string(path).map_err(|err| RegistryError::io(path, err))?;
    serde_json::from_str(&content).map_err(|err| RegistryError::parse(path, err))
  }

  /// Borrowing conversion into the layout handed to the builders.
  pub fn to_layout(&self) -> RegistryLayout<'_> {
    RegistryLayout {
      base_url: self.base_url.trim_end_matches('/'),
      internal_prefix: &self.internal_prefix,
      registry_file: &self.registry_file,
      output_dir: &self.output_dir,
      source_registry_dir: &self.source_registry_dir,
      registry_name: &self.registry_name,
      homepage: &self.homepage,
      item_schema: &self.item_schema,
      registry_schema: &self.registry_schema,
      bundle_file_name: &self.bundle_file_name,
    }
  }

  /// Path of the backend table override, if configured.
  pub fn bundles_path(&self, root: &Path) -> Option<PathBuf> {
    self.bundles_file.as_ref().map(|file| root.join(file))
  }
}
