//! Borrowed project layout and the build context handed to every builder.

use std::path::{Path, PathBuf};

use crate::dependencies::DependencyRewriter;
use crate::filesystem::RegistryFs;

/// Filesystem layout and publishing parameters of a registry project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryLayout<'a> {
  /// Absolute URL of the published output directory, without a trailing slash.
  pub base_url: &'a str,
  /// Prefix marking dependency identifiers that belong to this registry.
  pub internal_prefix: &'a str,
  /// Top-level registry descriptor relative to the project root.
  pub registry_file: &'a str,
  /// Output directory relative to the project root.
  pub output_dir: &'a str,
  /// Name of the authored source directory skipped by the post-build pass.
  pub source_registry_dir: &'a str,
  /// `name` of generated registry indexes.
  pub registry_name: &'a str,
  /// `homepage` of generated registry indexes.
  pub homepage: &'a str,
  /// `$schema` tag of item descriptors.
  pub item_schema: &'a str,
  /// `$schema` tag of registry indexes.
  pub registry_schema: &'a str,
  /// File stem of per-backend bundle descriptors.
  pub bundle_file_name: &'a str,
}

impl<'a> RegistryLayout<'a> {
  /// Rewriter configured with this layout's prefix and base URL.
  pub fn rewriter(&self) -> DependencyRewriter<'a> {
    DependencyRewriter::new(self.internal_prefix, self.base_url)
  }
}

/// Everything a builder needs: where the project lives, how it is laid out, and how to reach disk.
#[derive(Clone, Copy)]
pub struct RegistryBuildContext<'a> {
  /// Project root; relative paths in the layout and in item files resolve against it.
  pub root: &'a Path,
  /// Project layout.
  pub layout: RegistryLayout<'a>,
  /// Filesystem used for every read and write.
  pub fs: &'a dyn RegistryFs,
}

impl<'a> RegistryBuildContext<'a> {
  /// Create a context for the given root, layout and filesystem.
  pub fn new(root: &'a Path, layout: RegistryLayout<'a>, fs: &'a dyn RegistryFs) -> Self {
    Self { root, layout, fs }
  }

  /// Absolute output directory.
  pub fn output_root(&self) -> PathBuf {
    self.root.join(self.layout.output_dir)
  }

  /// Absolute path of the top-level registry descriptor.
  pub fn registry_path(&self) -> PathBuf {
    self.root.join(self.layout.registry_file)
  }
}

impl std::fmt::Debug for RegistryBuildContext<'_> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RegistryBuildContext")
      .field("root", &self.root)
      .field("layout", &self.layout)
      .finish_non_exhaustive()
  }
}
