//! Idempotent post-build pass rewriting `registryDependencies` across an output tree.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, error, info};

use crate::dependencies::DependencyRewriter;
use crate::filesystem::{RegistryFs, write_json};
use crate::models::TransformReport;
use crate::project::RegistryBuildContext;
use crate::records::{DEPENDENCIES_FIELD, replace_field};

/// Options for [`transform_output`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformOptions {
  /// Report files that would change without writing them.
  pub check: bool,
}

/// Rewrite dependency identifiers in every JSON file under the output root.
///
/// Directories named after the source registry directory are skipped. A file is only written
/// when its content changes, so running the pass on its own output touches nothing. Failures
/// on individual files are logged and recorded; they never abort the scan.
pub fn transform_output(context: &RegistryBuildContext, options: TransformOptions) -> TransformReport {
  let output_root = context.output_root();
  let rewriter = context.layout.rewriter();
  let mut report = TransformReport::default();

  let mut files = Vec::new();
  collect_json_files(
    context.fs,
    &output_root,
    context.layout.source_registry_dir,
    &mut files,
    &mut report,
  );
  files.sort();

  info!("scanning {} JSON files under {}", files.len(), output_root.display());

  for path in files {
    report.scanned += 1;
    let relative = path
      .strip_prefix(&output_root)
      .map(Path::to_path_buf)
      .unwrap_or_else(|_| path.clone());

    match transform_file(context.fs, &path, &rewriter, options) {
      Ok(true) => {
        info!("transformed {}", relative.display());
        report.transformed.push(relative);
      }
      Ok(false) => debug!("unchanged {}", relative.display()),
      Err(message) => {
        error!("failed to transform {}: {message}", path.display());
        report.failed.push((path, message));
      }
    }
  }

  if options.check {
    info!("{} files would be transformed", report.transformed.len());
  } else {
    info!("transformed {} files", report.transformed.len());
  }
  report
}

/// Rewrite dependencies at the document root and inside each element of `items`.
///
/// Returns `None` when nothing changed.
pub fn transform_document(document: &Value, rewriter: &DependencyRewriter) -> Option<Value> {
  let Value::Object(root) = document else {
    return None;
  };

  let mut updated = root.clone();
  let mut changed = false;

  if let Some(dependencies) = root.get(DEPENDENCIES_FIELD) {
    let rewritten = rewriter.rewrite_value(dependencies);
    if &rewritten != dependencies {
      updated = replace_field(&updated, DEPENDENCIES_FIELD, rewritten);
      changed = true;
    }
  }

  if let Some(Value::Array(items)) = root.get("items") {
    let mut items_changed = false;
    let items: Vec<Value> = items
      .iter()
      .map(|item| match rewrite_item(item, rewriter) {
        Some(rewritten) => {
          items_changed = true;
          rewritten
        }
        None => item.clone(),
      })
      .collect();
    if items_changed {
      updated = replace_field(&updated, "items", Value::Array(items));
      changed = true;
    }
  }

  changed.then_some(Value::Object(updated))
}

fn rewrite_item(item: &Value, rewriter: &DependencyRewriter) -> Option<Value> {
  let Value::Object(fields) = item else {
    return None;
  };
  let dependencies = fields.get(DEPENDENCIES_FIELD)?;
  let rewritten = rewriter.rewrite_value(dependencies);
  (&rewritten != dependencies)
    .then(|| Value::Object(replace_field(fields, DEPENDENCIES_FIELD, rewritten)))
}

fn transform_file(
  fs: &dyn RegistryFs,
  path: &Path,
  rewriter: &DependencyRewriter,
  options: TransformOptions,
) -> Result<bool, String> {
  let content = fs.read_to_string(path).map_err(|err| err.to_string())?;
  let document: Value = serde_json::from_str(&content).map_err(|err| err.to_string())?;

  let Some(updated) = transform_document(&document, rewriter) else {
    return Ok(false);
  };
  if !options.check {
    write_json(fs, path, &updated).map_err(|err| err.to_string())?;
  }
  Ok(true)
}

fn collect_json_files(
  fs: &dyn RegistryFs,
  dir: &Path,
  excluded_dir: &str,
  files: &mut Vec<PathBuf>,
  report: &mut TransformReport,
) {
  let entries = match fs.read_dir(dir) {
    Ok(entries) => entries,
    Err(err) => {
      error!("failed to list {}: {err}", dir.display());
      report.failed.push((dir.to_path_buf(), err.to_string()));
      return;
    }
  };

  for entry in entries {
    if entry.is_dir {
      if entry.file_name() == excluded_dir {
        debug!("skipping source directory {}", entry.path.display());
        continue;
      }
      collect_json_files(fs, &entry.path, excluded_dir, files, report);
    } else if entry.path.extension().is_some_and(|ext| ext == "json") {
      files.push(entry.path);
    }
  }
}
