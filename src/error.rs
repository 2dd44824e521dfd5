//! Error taxonomy shared by the registry builders.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors that abort a build run.
///
/// Per-item and per-file problems are not represented here; builders log them as warnings and
/// record them in their reports instead.
#[derive(Debug, Error)]
pub enum RegistryError {
  /// Reading or writing a path failed.
  #[error("failed to access {}: {source}", .path.display())]
  Io {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    source: std::io::Error,
  },
  /// A JSON document could not be parsed.
  #[error("failed to parse {}: {source}", .path.display())]
  Parse {
    /// Path that caused the error.
    path: PathBuf,
    /// Source parse error.
    source: serde_json::Error,
  },
  /// The registry descriptor has no `items` array.
  #[error("{} does not contain an `items` array", .path.display())]
  MissingItems {
    /// Descriptor path.
    path: PathBuf,
  },
  /// Serialising an output document failed.
  #[error("failed to serialise JSON: {0}")]
  Serialize(#[from] serde_json::Error),
  /// The backend table has no entries.
  #[error("bundle table is empty")]
  EmptyBundleTable,
  /// A backend key is not a single relative directory name.
  #[error("backend key {key:?} would be written outside the output directory")]
  UnsafeBackendKey {
    /// Offending key.
    key: String,
  },
}

impl RegistryError {
  pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io {
      path: path.into(),
      source,
    }
  }

  pub(crate) fn parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
    Self::Parse {
      path: path.into(),
      source,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn messages_name_the_offending_path() {
    let err = RegistryError::MissingItems {
      path: PathBuf::from("registry.json"),
    };
    assert_eq!(err.to_string(), "registry.json does not contain an `items` array");

    let io = RegistryError::io(
      "public/r/a.json",
      std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
    );
    assert!(io.to_string().starts_with("failed to access public/r/a.json"));

    let key = RegistryError::UnsafeBackendKey { key: "../x".into() };
    assert_eq!(
      key.to_string(),
      r#"backend key "../x" would be written outside the output directory"#
    );
  }
}
