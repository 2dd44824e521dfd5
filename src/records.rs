//! Pure record transformations shared by the builders.
//!
//! Nothing here touches the filesystem; every function returns a new value and leaves its
//! input alone. Items read from an authored descriptor stay raw JSON objects so that any shape
//! the author wrote survives untouched apart from the fields being rewritten.

use std::path::{Component, Path, PathBuf};

use serde_json::{Map, Value};

use crate::dependencies::DependencyRewriter;
use crate::models::RegistryItem;

/// Field holding an item's registry dependencies.
pub const DEPENDENCIES_FIELD: &str = "registryDependencies";

/// Copy of `record` with `field` set to `value`.
///
/// An existing key keeps its position; a new key is appended.
pub fn replace_field(record: &Map<String, Value>, field: &str, value: Value) -> Map<String, Value> {
  let mut updated = record.clone();
  updated.insert(field.to_string(), value);
  updated
}

/// Item name, trimmed; `None` when missing, not a string or blank.
pub fn record_name(record: &Map<String, Value>) -> Option<&str> {
  record
    .get("name")
    .and_then(Value::as_str)
    .map(str::trim)
    .filter(|name| !name.is_empty())
}

/// Item `type` tag when it is a string.
pub fn record_type(record: &Map<String, Value>) -> Option<&str> {
  record.get("type").and_then(Value::as_str)
}

/// `path` of every object entry in `files` that declares one as a string.
pub fn record_file_paths(record: &Map<String, Value>) -> Vec<&str> {
  match record.get("files") {
    Some(Value::Array(files)) => files
      .iter()
      .filter_map(|file| file.get("path").and_then(Value::as_str))
      .collect(),
    _ => Vec::new(),
  }
}

/// Copy of `record` with `registryDependencies` rewritten, when present.
///
/// Values that are not arrays are left as they are.
pub fn rewrite_record_dependencies(
  record: &Map<String, Value>,
  rewriter: &DependencyRewriter,
) -> Map<String, Value> {
  match record.get(DEPENDENCIES_FIELD) {
    Some(dependencies) => replace_field(record, DEPENDENCIES_FIELD, rewriter.rewrite_value(dependencies)),
    None => record.clone(),
  }
}

/// `files` value without any `content` attribute on its object entries.
///
/// Anything that is not an array, and array entries that are not objects, pass through.
pub fn strip_files_content(files: &Value) -> Value {
  match files {
    Value::Array(entries) => Value::Array(
      entries
        .iter()
        .map(|entry| match entry {
          Value::Object(fields) => Value::Object(
            fields
              .iter()
              .filter(|(key, _)| key.as_str() != "content")
              .map(|(key, value)| (key.clone(), value.clone()))
              .collect(),
          ),
          other => other.clone(),
        })
        .collect(),
    ),
    other => other.clone(),
  }
}

/// Served descriptor for a raw item: schema tag first, the item's own fields after it, the
/// trimmed `name`, rewritten dependencies and `files` without inline content.
///
/// A schema already declared by the item wins over `schema`.
pub fn flattened_record(
  record: &Map<String, Value>,
  name: &str,
  schema: &str,
  rewriter: &DependencyRewriter,
) -> Map<String, Value> {
  let mut descriptor = Map::new();
  descriptor.insert("$schema".to_string(), Value::String(schema.to_string()));
  for (key, value) in record {
    descriptor.insert(key.clone(), value.clone());
  }
  descriptor.insert("name".to_string(), Value::String(name.to_string()));

  let mut descriptor = rewrite_record_dependencies(&descriptor, rewriter);
  if let Some(files) = descriptor.get("files") {
    let stripped = strip_files_content(files);
    descriptor = replace_field(&descriptor, "files", stripped);
  }
  descriptor
}

/// Copy of a typed `item` with its `registryDependencies` rewritten.
pub fn with_rewritten_dependencies(item: &RegistryItem, rewriter: &DependencyRewriter) -> RegistryItem {
  RegistryItem {
    registry_dependencies: item
      .registry_dependencies
      .as_deref()
      .map(|dependencies| rewriter.rewrite(dependencies)),
    ..item.clone()
  }
}

/// Standalone descriptor for a typed `item`: schema tag, rewritten dependencies, original files.
///
/// A schema already declared by the item wins over `schema`.
pub fn item_descriptor(item: &RegistryItem, schema: &str, rewriter: &DependencyRewriter) -> RegistryItem {
  let mut descriptor = with_rewritten_dependencies(item, rewriter);
  if descriptor.schema.is_none() {
    descriptor.schema = Some(schema.to_string());
  }
  descriptor
}

/// Normalise a relative path, rejecting anything that could land outside its root.
pub fn contained_path(raw: &str) -> Option<PathBuf> {
  let mut relative = PathBuf::new();
  for component in Path::new(raw).components() {
    match component {
      Component::Normal(part) => relative.push(part),
      Component::CurDir => {}
      Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
    }
  }
  (!relative.as_os_str().is_empty()).then_some(relative)
}
