//! Expand the top-level registry descriptor into per-item descriptors and mirrored sources.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{RegistryError, Result};
use crate::filesystem::{read_json, write_json};
use crate::models::FlatReport;
use crate::project::RegistryBuildContext;
use crate::records::{
  contained_path, flattened_record, record_file_paths, record_name, record_type, replace_field,
  rewrite_record_dependencies,
};

/// Read the registry descriptor and publish every item in flattened form.
///
/// Writes `<output>/<name>.json` for each named item, copies each referenced source file to
/// `<output>/<path>`, then writes `<output>/registry.json` holding every original item with
/// rewritten dependencies. Items are handled as raw JSON objects, so an item with an unusual
/// shape is published as written. Items without a name and missing source files are skipped
/// with a warning.
pub fn build_flat(context: &RegistryBuildContext) -> Result<FlatReport> {
  let registry_path = context.registry_path();
  let (index, items) = load_registry(context, &registry_path)?;
  let output_root = context.output_root();
  let layout = context.layout;
  let rewriter = layout.rewriter();

  info!(
    "flattening {} items from {} into {}",
    items.len(),
    registry_path.display(),
    output_root.display()
  );

  context
    .fs
    .create_dir_all(&output_root)
    .map_err(|err| RegistryError::io(&output_root, err))?;

  let mut report = FlatReport::default();
  let mut seen = BTreeSet::new();

  for (position, item) in items.iter().enumerate() {
    let Some(record) = item.as_object() else {
      warn!("skipping item #{position}: not an object");
      report.skipped_items.push(position);
      continue;
    };
    let Some(name) = record_name(record) else {
      warn!("skipping item #{position}: missing name");
      report.skipped_items.push(position);
      continue;
    };
    let Some(relative) = contained_path(&format!("{name}.json")) else {
      warn!("skipping item #{position}: name {name:?} escapes the output directory");
      report.skipped_items.push(position);
      continue;
    };
    if !seen.insert(name.to_string()) {
      warn!("skipping item #{position}: duplicate name {name:?}");
      report.skipped_items.push(position);
      continue;
    }

    let descriptor = flattened_record(record, name, layout.item_schema, &rewriter);
    let descriptor_path = output_root.join(relative);
    ensure_parent(context, &descriptor_path)?;
    write_json(context.fs, &descriptor_path, &descriptor)?;
    debug!("wrote {}", descriptor_path.display());
    report.descriptors.push(descriptor_path);

    copy_item_files(context, &output_root, name, record, &mut report)?;

    let item_type = record_type(record).unwrap_or("unknown");
    *report.items_by_type.entry(item_type.to_string()).or_default() += 1;
  }

  let rewritten: Vec<Value> = items
    .iter()
    .map(|item| match item {
      Value::Object(record) => Value::Object(rewrite_record_dependencies(record, &rewriter)),
      other => other.clone(),
    })
    .collect();
  let consolidated = replace_field(&index, "items", Value::Array(rewritten));
  report.registry_path = output_root.join("registry.json");
  write_json(context.fs, &report.registry_path, &consolidated)?;

  info!(
    "wrote {} item descriptors and copied {} files",
    report.descriptors.len(),
    report.copied_files.len()
  );
  for (item_type, count) in &report.items_by_type {
    info!("  {item_type}: {count}");
  }
  if !report.skipped_items.is_empty() || !report.missing_files.is_empty() {
    warn!(
      "skipped {} items and {} files",
      report.skipped_items.len(),
      report.missing_files.len()
    );
  }

  Ok(report)
}

/// Parse the descriptor as raw JSON, requiring an object with an `items` array.
fn load_registry(
  context: &RegistryBuildContext,
  path: &Path,
) -> Result<(Map<String, Value>, Vec<Value>)> {
  let raw: Value = read_json(context.fs, path)?;
  let Value::Object(index) = raw else {
    return Err(RegistryError::MissingItems {
      path: path.to_path_buf(),
    });
  };
  let items = match index.get("items") {
    Some(Value::Array(items)) => items.clone(),
    _ => {
      return Err(RegistryError::MissingItems {
        path: path.to_path_buf(),
      });
    }
  };
  Ok((index, items))
}

fn copy_item_files(
  context: &RegistryBuildContext,
  output_root: &Path,
  name: &str,
  record: &Map<String, Value>,
  report: &mut FlatReport,
) -> Result<()> {
  for declared in record_file_paths(record) {
    let Some(relative) = contained_path(declared) else {
      warn!("{name}: not copying {declared}, path leaves the project root");
      report.missing_files.push(declared.to_string());
      continue;
    };

    let source = context.root.join(&relative);
    if !context.fs.is_file(&source) {
      warn!("{name}: source file not found: {}", source.display());
      report.missing_files.push(declared.to_string());
      continue;
    }

    let destination = output_root.join(&relative);
    ensure_parent(context, &destination)?;
    context
      .fs
      .copy(&source, &destination)
      .map_err(|err| RegistryError::io(&source, err))?;
    debug!("copied {} -> {}", source.display(), destination.display());
    report.copied_files.push(destination);
  }

  Ok(())
}

fn ensure_parent(context: &RegistryBuildContext, path: &Path) -> Result<()> {
  match path.parent() {
    Some(parent) => context
      .fs
      .create_dir_all(parent)
      .map_err(|err| RegistryError::io(parent, err)),
    None => Ok(()),
  }
}
