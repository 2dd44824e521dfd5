use std::fs;
use std::path::Path;

use registry_bundler::{
  BundleTable, DiskFs, ProjectConfig, RegistryBuildContext, TransformOptions, build_bundles,
  build_flat, transform_output,
};
use serde_json::Value;
use tempfile::tempdir;

const BASE: &str =
  "https://raw.githubusercontent.com/RMNCLDYO/coderabbit-shadcn-registry/main/public/r";

fn read_json(path: &Path) -> Value {
  let raw = fs::read_to_string(path).unwrap_or_else(|err| panic!("{}: {err}", path.display()));
  serde_json::from_str(&raw).unwrap()
}

fn seed_project(root: &Path) {
  fs::create_dir_all(root.join("registry/components")).unwrap();
  fs::create_dir_all(root.join("lib")).unwrap();
  fs::write(root.join("lib/foo.ts"), "export const x=1").unwrap();
  fs::write(
    root.join("registry/components/review-form.tsx"),
    "export function ReviewForm() {}",
  )
  .unwrap();
  fs::write(
    root.join("registry.json"),
    r#"{
  "$schema": "https://ui.shadcn.com/schema/registry.json",
  "name": "coderabbit",
  "homepage": "https://github.com/RMNCLDYO/coderabbit-shadcn-registry",
  "items": [
    {
      "name": "coderabbit-form",
      "type": "registry:component",
      "title": "Review form",
      "registryDependencies": ["button", "coderabbit-types"],
      "files": [
        {"path": "registry/components/review-form.tsx", "content": "export function ReviewForm() {}", "type": "registry:component"}
      ]
    },
    {
      "name": "coderabbit-types",
      "type": "registry:lib",
      "files": [{"path": "lib/foo.ts", "content": "export const x=1", "type": "registry:lib"}]
    },
    {
      "type": "registry:lib",
      "description": "no name, never published"
    }
  ]
}"#,
  )
  .unwrap();
}

#[test]
fn full_build_publishes_index_compatible_output() {
  let temp = tempdir().unwrap();
  let root = temp.path();
  seed_project(root);

  let config = ProjectConfig::discover(root);
  let context = RegistryBuildContext::new(root, config.to_layout(), &DiskFs);
  let out = root.join("public/r");

  let bundles = build_bundles(&context, &BundleTable::builtin()).unwrap();
  assert_eq!(bundles.bundles.len(), 3);

  let flat = build_flat(&context).unwrap();
  assert_eq!(flat.descriptors.len(), 2);
  assert_eq!(flat.skipped_items, vec![2]);
  assert_eq!(flat.copied_files.len(), 2);
  assert_eq!(flat.items_by_type.get("registry:lib"), Some(&1));

  let form = read_json(&out.join("coderabbit-form.json"));
  assert_eq!(
    form["registryDependencies"],
    serde_json::json!(["button", format!("{BASE}/coderabbit-types.json")])
  );
  assert_eq!(
    form["files"],
    serde_json::json!([{"path": "registry/components/review-form.tsx", "type": "registry:component"}])
  );

  let types = read_json(&out.join("coderabbit-types.json"));
  assert_eq!(
    types["files"],
    serde_json::json!([{"path": "lib/foo.ts", "type": "registry:lib"}])
  );
  assert_eq!(fs::read_to_string(out.join("lib/foo.ts")).unwrap(), "export const x=1");

  let first = transform_output(&context, TransformOptions::default());
  assert!(first.failed.is_empty());
  assert!(first.transformed.is_empty(), "builders already rewrote everything");

  let second = transform_output(&context, TransformOptions::default());
  assert!(second.transformed.is_empty());
}

#[test]
fn transform_repairs_hand_edited_output_once() {
  let temp = tempdir().unwrap();
  let root = temp.path();
  let out = root.join("public/r/postgres");
  fs::create_dir_all(&out).unwrap();
  fs::write(
    out.join("registry.json"),
    r#"{"name":"coderabbit","items":[{"name":"coderabbit-bundle","registryDependencies":["coderabbit-storage-postgres","card"]}]}"#,
  )
  .unwrap();

  let config = ProjectConfig::default();
  let context = RegistryBuildContext::new(root, config.to_layout(), &DiskFs);

  let first = transform_output(&context, TransformOptions::default());
  assert_eq!(first.transformed.len(), 1);
  assert_eq!(
    read_json(&out.join("registry.json"))["items"][0]["registryDependencies"],
    serde_json::json!([format!("{BASE}/coderabbit-storage-postgres.json"), "card"])
  );

  let second = transform_output(&context, TransformOptions::default());
  assert_eq!(second.transformed.len(), 0);
}
