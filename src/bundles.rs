//! Backend bundle presets and the builder that publishes them.
//!
//! Every backend gets its own directory under the output root holding the bundle descriptor and
//! a one-item registry index, so a consumer can point the CLI at `<base-url>/<backend>` and
//! install the full preset.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{Map, Value, json};
use tracing::{debug, info};

use crate::error::{RegistryError, Result};
use crate::filesystem::{RegistryFs, read_json, write_json};
use crate::models::{BundleConfig, BundleReport, BundleSummary, RegistryIndex};
use crate::project::RegistryBuildContext;
use crate::records::{contained_path, item_descriptor, with_rewritten_dependencies};

/// Immutable table of backend bundle presets keyed by backend name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BundleTable {
  bundles: BTreeMap<String, BundleConfig>,
}

impl BundleTable {
  /// Table with the given entries.
  pub fn new(bundles: BTreeMap<String, BundleConfig>) -> Self {
    Self { bundles }
  }

  /// Load a table from a JSON object mapping backend keys to bundle configurations.
  pub fn from_path(fs: &dyn RegistryFs, path: &Path) -> Result<Self> {
    read_json(fs, path).map(Self::new)
  }

  /// Hand-authored presets for the supported backends.
  pub fn builtin() -> Self {
    let mut bundles = BTreeMap::new();
    bundles.insert(
      "localstorage".to_string(),
      preset(
        "LocalStorage",
        "Stores review history in the browser. No server or database required.",
        &[],
        "coderabbit-storage-localstorage",
        &[("NEXT_PUBLIC_CODERABBIT_STORAGE_KEY", "coderabbit-reviews")],
      ),
    );
    bundles.insert(
      "convex".to_string(),
      preset(
        "Convex",
        "Persists reviews in a Convex deployment with realtime updates.",
        &["convex"],
        "coderabbit-storage-convex",
        &[("CONVEX_DEPLOYMENT", ""), ("NEXT_PUBLIC_CONVEX_URL", "")],
      ),
    );
    bundles.insert(
      "postgres".to_string(),
      preset(
        "Postgres",
        "Persists reviews in PostgreSQL through Drizzle ORM.",
        &["drizzle-orm", "postgres"],
        "coderabbit-storage-postgres",
        &[("DATABASE_URL", "")],
      ),
    );
    Self { bundles }
  }

  /// Whether the table has no entries.
  pub fn is_empty(&self) -> bool {
    self.bundles.is_empty()
  }

  /// Number of backends.
  pub fn len(&self) -> usize {
    self.bundles.len()
  }

  /// Backend keys and configurations in key order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &BundleConfig)> {
    self
      .bundles
      .iter()
      .map(|(backend, config)| (backend.as_str(), config))
  }

  /// Configuration for a single backend.
  pub fn get(&self, backend: &str) -> Option<&BundleConfig> {
    self.bundles.get(backend)
  }
}

const SHARED_PACKAGES: &[&str] = &["zod", "sonner", "lucide-react", "react-markdown"];

const SHARED_REGISTRY_DEPENDENCIES: &[&str] = &[
  "button",
  "card",
  "badge",
  "input",
  "label",
  "textarea",
  "scroll-area",
  "coderabbit-types",
  "coderabbit-client",
  "coderabbit-review-form",
  "coderabbit-review-list",
];

fn preset(
  label: &str,
  summary: &str,
  packages: &[&str],
  storage_item: &str,
  env_vars: &[(&str, &str)],
) -> BundleConfig {
  let dependencies = SHARED_PACKAGES
    .iter()
    .chain(packages)
    .map(|name| name.to_string())
    .collect();
  let registry_dependencies = SHARED_REGISTRY_DEPENDENCIES
    .iter()
    .chain(std::iter::once(&storage_item))
    .map(|name| name.to_string())
    .collect();
  let env_vars = env_vars
    .iter()
    .map(|(name, default)| (name.to_string(), Value::String(default.to_string())))
    .collect();

  BundleConfig {
    schema: None,
    name: Some("coderabbit-bundle".into()),
    item_type: Some("registry:block".into()),
    title: Some(format!("CodeRabbit Bundle ({label})")),
    author: Some("RMNCLDYO".into()),
    description: Some(format!(
      "Everything needed to request and display CodeRabbit reviews. {summary}"
    )),
    dependencies: Some(dependencies),
    dev_dependencies: None,
    registry_dependencies: Some(registry_dependencies),
    files: None,
    env_vars: Some(env_vars),
    meta: Some(json!({ "backend": label })),
    docs: Some(format!(
      "Add CODERABBIT_API_KEY to your environment, then configure the {label} storage adapter."
    )),
    categories: Some(vec!["coderabbit".into(), "code-review".into(), "ai".into()]),
    extra: Map::new(),
  }
}

/// Write `<backend>/<bundle>.json` and `<backend>/registry.json` for every backend in `table`.
///
/// Every key is checked before anything is written; a key that is empty, absolute or climbs
/// out of the output directory fails the whole run.
pub fn build_bundles(context: &RegistryBuildContext, table: &BundleTable) -> Result<BundleReport> {
  if table.is_empty() {
    return Err(RegistryError::EmptyBundleTable);
  }
  let directories = table
    .iter()
    .map(|(backend, _)| {
      contained_path(backend).ok_or_else(|| RegistryError::UnsafeBackendKey {
        key: backend.to_string(),
      })
    })
    .collect::<Result<Vec<_>>>()?;

  let layout = context.layout;
  let rewriter = layout.rewriter();
  let output_root = context.output_root();
  let mut report = BundleReport::default();

  info!("building {} backend bundles into {}", table.len(), output_root.display());

  for ((backend, config), directory) in table.iter().zip(directories) {
    let backend_dir = output_root.join(directory);
    context
      .fs
      .create_dir_all(&backend_dir)
      .map_err(|err| RegistryError::io(&backend_dir, err))?;

    let descriptor = item_descriptor(config, layout.item_schema, &rewriter);
    let descriptor_path = backend_dir.join(format!("{}.json", layout.bundle_file_name));
    write_json(context.fs, &descriptor_path, &descriptor)?;
    debug!("wrote {}", descriptor_path.display());

    let index = RegistryIndex {
      schema: Some(layout.registry_schema.to_string()),
      name: layout.registry_name.to_string(),
      homepage: layout.homepage.to_string(),
      items: vec![with_rewritten_dependencies(config, &rewriter)],
      extra: Map::new(),
    };
    let registry_path = backend_dir.join("registry.json");
    write_json(context.fs, &registry_path, &index)?;
    debug!("wrote {}", registry_path.display());

    let summary = BundleSummary {
      backend: backend.to_string(),
      title: config
        .title
        .clone()
        .or_else(|| config.name.clone())
        .unwrap_or_else(|| backend.to_string()),
      label: backend_label(config).unwrap_or(backend).to_string(),
      dependency_count: descriptor.dependency_count(),
      descriptor_path,
      registry_path,
    };
    info!(
      backend = %summary.backend,
      "{} [{}]: {} registry dependencies",
      summary.title,
      summary.label,
      summary.dependency_count
    );
    report.bundles.push(summary);
  }

  info!("built {} backend bundles", report.bundles.len());
  Ok(report)
}

fn backend_label(config: &BundleConfig) -> Option<&str> {
  config
    .meta
    .as_ref()
    .and_then(|meta| meta.get("backend"))
    .and_then(|backend| backend.as_str())
}
