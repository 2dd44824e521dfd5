//! Data structures read from and written to registry JSON documents.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One file shipped by a registry item.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RegistryFile {
  /// Path relative to the project root; mirrored under the output directory.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub path: Option<String>,
  /// Inline file body. Never present in flattened item descriptors.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub content: Option<String>,
  /// File kind tag, e.g. `registry:lib`.
  #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
  pub file_type: Option<String>,
  /// Install target inside the consuming project.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub target: Option<String>,
  /// Any other attributes, preserved verbatim.
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// A named, distributable unit of the registry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryItem {
  /// Schema tag of a standalone item descriptor.
  #[serde(default, rename = "$schema", skip_serializing_if = "Option::is_none")]
  pub schema: Option<String>,
  /// Unique identifier within the registry.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  /// Item kind tag, e.g. `registry:block`.
  #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
  pub item_type: Option<String>,
  /// Human readable title.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  /// Item author.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub author: Option<String>,
  /// Short description.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  /// External package names, passed through unmodified.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub dependencies: Option<Vec<String>>,
  /// Development-only package names.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub dev_dependencies: Option<Vec<String>>,
  /// Other registry items this item installs, by name or URL.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub registry_dependencies: Option<Vec<String>>,
  /// Files shipped with the item.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub files: Option<Vec<RegistryFile>>,
  /// Environment variables and their defaults, in authored order.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub env_vars: Option<Map<String, Value>>,
  /// Free-form metadata.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub meta: Option<Value>,
  /// Post-install documentation.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub docs: Option<String>,
  /// Category tags.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub categories: Option<Vec<String>>,
  /// Any other attributes, preserved verbatim.
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl RegistryItem {
  /// Number of registry dependencies.
  pub fn dependency_count(&self) -> usize {
    self.registry_dependencies.as_ref().map_or(0, Vec::len)
  }
}

/// Aggregate document listing registry items.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RegistryIndex {
  /// Schema tag of the index.
  #[serde(default, rename = "$schema", skip_serializing_if = "Option::is_none")]
  pub schema: Option<String>,
  /// Registry name.
  #[serde(default)]
  pub name: String,
  /// Registry homepage.
  #[serde(default)]
  pub homepage: String,
  /// Embedded items.
  pub items: Vec<RegistryItem>,
  /// Any other attributes, preserved verbatim.
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// Registry item describing one deployment backend preset.
pub type BundleConfig = RegistryItem;

/// Per-backend outcome of the bundle builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSummary {
  /// Backend key from the bundle table.
  pub backend: String,
  /// Bundle title, or the bundle name when untitled.
  pub title: String,
  /// Human readable backend label.
  pub label: String,
  /// Number of registry dependencies.
  pub dependency_count: usize,
  /// Written item descriptor.
  pub descriptor_path: PathBuf,
  /// Written per-backend registry index.
  pub registry_path: PathBuf,
}

/// Outcome of a bundle builder run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleReport {
  /// One summary per backend, in table order.
  pub bundles: Vec<BundleSummary>,
}

/// Outcome of a flat registry builder run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatReport {
  /// Item descriptors written, in input order.
  pub descriptors: Vec<PathBuf>,
  /// Source files copied into the output tree.
  pub copied_files: Vec<PathBuf>,
  /// Referenced source files that did not exist or could not be mirrored safely.
  pub missing_files: Vec<String>,
  /// Items skipped for not being an object or for a missing, unsafe or duplicate name, by
  /// position in the descriptor.
  pub skipped_items: Vec<usize>,
  /// Count of written items per `type`.
  pub items_by_type: BTreeMap<String, usize>,
  /// Consolidated registry index.
  pub registry_path: PathBuf,
}

/// Outcome of a post-build transform run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformReport {
  /// JSON files inspected.
  pub scanned: usize,
  /// Files rewritten (or that would be, in check mode), relative to the output root.
  pub transformed: Vec<PathBuf>,
  /// Files that could not be read, parsed or written, with the error message.
  pub failed: Vec<(PathBuf, String)>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn unknown_attributes_survive_a_round_trip() {
    let raw = json!({
      "name": "coderabbit-form",
      "type": "registry:component",
      "registryDependencies": ["button"],
      "cssVars": {"light": {"accent": "red"}},
      "files": [{"path": "lib/foo.ts", "type": "registry:lib", "mode": "0644"}]
    });

    let item: RegistryItem = serde_json::from_value(raw.clone()).unwrap();
    assert_eq!(item.extra.get("cssVars"), raw.get("cssVars"));
    assert_eq!(serde_json::to_value(&item).unwrap(), raw);
  }

  #[test]
  fn env_vars_keep_authored_order() {
    let item: RegistryItem = serde_json::from_value(json!({
      "name": "coderabbit-bundle",
      "envVars": {"ZED_KEY": "", "ALPHA_KEY": "", "PORT": 3000}
    }))
    .unwrap();

    let keys: Vec<&str> = item
      .env_vars
      .as_ref()
      .map(|vars| vars.keys().map(String::as_str).collect())
      .unwrap_or_default();
    assert_eq!(keys, vec!["ZED_KEY", "ALPHA_KEY", "PORT"]);

    let written = serde_json::to_string(&item).unwrap();
    assert!(written.contains(r#""envVars":{"ZED_KEY":"","ALPHA_KEY":"","PORT":3000}"#));
  }

  #[test]
  fn index_requires_items() {
    let result: Result<RegistryIndex, _> =
      serde_json::from_value(json!({"name": "x", "homepage": "y"}));
    assert!(result.is_err());
  }
}
