//! Minimal filesystem seam used by the builders.
//!
//! Builders only read, write, copy and list; [`DiskFs`] forwards to `std::fs` while
//! [`MemoryFs`] keeps everything in a map so transformation logic can be exercised without
//! touching disk.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use same_file::is_same_file;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{RegistryError, Result};

/// Entry returned by [`RegistryFs::read_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
  /// Full path of the entry.
  pub path: PathBuf,
  /// Whether the entry is a directory.
  pub is_dir: bool,
}

impl DirEntry {
  /// Final path component as UTF-8, lossily converted.
  pub fn file_name(&self) -> String {
    self
      .path
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_default()
  }
}

/// Filesystem operations needed to build a registry.
pub trait RegistryFs {
  /// Read a UTF-8 file.
  fn read_to_string(&self, path: &Path) -> io::Result<String>;
  /// Create or overwrite a file. Parent directories must exist.
  fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
  /// Create a directory and all of its parents.
  fn create_dir_all(&self, path: &Path) -> io::Result<()>;
  /// Whether a regular file exists at `path`.
  fn is_file(&self, path: &Path) -> bool;
  /// Copy `from` to `to`, overwriting `to`.
  fn copy(&self, from: &Path, to: &Path) -> io::Result<()>;
  /// List the direct children of a directory, sorted by path.
  fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;
}

/// Read and deserialise a JSON document.
pub fn read_json<T: DeserializeOwned>(fs: &dyn RegistryFs, path: &Path) -> Result<T> {
  let content = fs
    .read_to_string(path)
    .map_err(|err| RegistryError::io(path, err))?;
  serde_json::from_str(&content).map_err(|err| RegistryError::parse(path, err))
}

/// Write `value` as pretty-printed JSON, replacing any existing file.
pub fn write_json<T: Serialize + ?Sized>(fs: &dyn RegistryFs, path: &Path, value: &T) -> Result<()> {
  let json = serde_json::to_string_pretty(value)?;
  fs.write(path, json.as_bytes())
    .map_err(|err| RegistryError::io(path, err))
}

/// [`RegistryFs`] backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFs;

impl RegistryFs for DiskFs {
  fn read_to_string(&self, path: &Path) -> io::Result<String> {
    fs::read_to_string(path)
  }

  fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
    fs::write(path, contents)
  }

  fn create_dir_all(&self, path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
  }

  fn is_file(&self, path: &Path) -> bool {
    path.is_file()
  }

  fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
    // Copying a file onto itself truncates it on some platforms.
    if to.exists() && is_same_file(from, to)? {
      return Ok(());
    }
    fs::copy(from, to).map(|_| ())
  }

  fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(path)? {
      let entry = entry?;
      entries.push(DirEntry {
        path: entry.path(),
        is_dir: entry.file_type()?.is_dir(),
      });
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
  }
}

/// In-memory [`RegistryFs`] for tests.
///
/// Paths are stored exactly as given; directories are implied by file paths and by
/// [`RegistryFs::create_dir_all`].
#[derive(Debug, Default)]
pub struct MemoryFs {
  state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
  files: BTreeMap<PathBuf, Vec<u8>>,
  dirs: BTreeSet<PathBuf>,
  writes: usize,
}

impl MemoryFs {
  /// Empty filesystem.
  pub fn new() -> Self {
    Self::default()
  }

  /// Insert a file, creating its parent directories.
  pub fn insert(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
    let path = path.as_ref();
    let mut state = self.lock();
    if let Some(parent) = path.parent() {
      state.add_dir(parent);
    }
    state.files.insert(path.to_path_buf(), contents.into());
  }

  /// Contents of a file as UTF-8, if present.
  pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
    self
      .lock()
      .files
      .get(path.as_ref())
      .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
  }

  /// Every file path currently stored.
  pub fn paths(&self) -> Vec<PathBuf> {
    self.lock().files.keys().cloned().collect()
  }

  /// Number of successful writes and copies so far.
  pub fn write_count(&self) -> usize {
    self.lock().writes
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
    match self.state.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    }
  }
}

impl MemoryState {
  fn add_dir(&mut self, path: &Path) {
    for ancestor in path.ancestors() {
      if ancestor.as_os_str().is_empty() {
        break;
      }
      self.dirs.insert(ancestor.to_path_buf());
    }
  }

  fn has_dir(&self, path: &Path) -> bool {
    path.as_os_str().is_empty()
      || path.components().all(|c| matches!(c, Component::RootDir))
      || self.dirs.contains(path)
  }
}

fn not_found(path: &Path) -> io::Error {
  io::Error::new(ErrorKind::NotFound, format!("{} not found", path.display()))
}

impl RegistryFs for MemoryFs {
  fn read_to_string(&self, path: &Path) -> io::Result<String> {
    let state = self.lock();
    let bytes = state.files.get(path).ok_or_else(|| not_found(path))?;
    String::from_utf8(bytes.clone()).map_err(|err| io::Error::new(ErrorKind::InvalidData, err))
  }

  fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut state = self.lock();
    if let Some(parent) = path.parent() {
      if !state.has_dir(parent) {
        return Err(not_found(parent));
      }
    }
    if state.dirs.contains(path) {
      return Err(io::Error::new(
        ErrorKind::IsADirectory,
        format!("{} is a directory", path.display()),
      ));
    }
    state.files.insert(path.to_path_buf(), contents.to_vec());
    state.writes += 1;
    Ok(())
  }

  fn create_dir_all(&self, path: &Path) -> io::Result<()> {
    self.lock().add_dir(path);
    Ok(())
  }

  fn is_file(&self, path: &Path) -> bool {
    self.lock().files.contains_key(path)
  }

  fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
    let contents = {
      let state = self.lock();
      state.files.get(from).cloned().ok_or_else(|| not_found(from))?
    };
    self.write(to, &contents)
  }

  fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
    let state = self.lock();
    if !state.dirs.contains(path) {
      return Err(not_found(path));
    }
    let dirs = state
      .dirs
      .iter()
      .filter(|dir| dir.parent() == Some(path))
      .map(|dir| DirEntry {
        path: dir.clone(),
        is_dir: true,
      });
    let files = state
      .files
      .keys()
      .filter(|file| file.parent() == Some(path))
      .map(|file| DirEntry {
        path: file.clone(),
        is_dir: false,
      });
    let mut entries: Vec<DirEntry> = dirs.chain(files).collect();
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[test]
  fn disk_copy_onto_itself_keeps_contents() -> io::Result<()> {
    let temp = tempdir()?;
    let file = temp.path().join("file.txt");
    fs::write(&file, b"content")?;

    DiskFs.copy(&file, &file)?;
    assert_eq!(fs::read_to_string(&file)?, "content");
    Ok(())
  }

  #[test]
  fn disk_read_dir_is_sorted() -> io::Result<()> {
    let temp = tempdir()?;
    fs::write(temp.path().join("b.json"), b"{}")?;
    fs::create_dir(temp.path().join("a"))?;

    let entries = DiskFs.read_dir(temp.path())?;
    let names: Vec<String> = entries.iter().map(DirEntry::file_name).collect();
    assert_eq!(names, vec!["a", "b.json"]);
    assert!(entries[0].is_dir);
    Ok(())
  }

  #[test]
  fn json_helpers_round_trip_through_memory() {
    let memory = MemoryFs::new();
    memory.create_dir_all(Path::new("/out")).unwrap();
    let path = Path::new("/out/doc.json");

    write_json(&memory, path, &serde_json::json!({"b": 1, "a": [true]})).unwrap();
    assert_eq!(
      memory.get(path).as_deref(),
      Some("{\n  \"b\": 1,\n  \"a\": [\n    true\n  ]\n}")
    );

    let value: serde_json::Value = read_json(&memory, path).unwrap();
    assert_eq!(value["b"], 1);
  }

  #[test]
  fn read_json_reports_parse_errors_with_path() {
    let memory = MemoryFs::new();
    memory.insert("/bad.json", "{");
    let err = read_json::<serde_json::Value>(&memory, Path::new("/bad.json")).unwrap_err();
    assert!(matches!(err, RegistryError::Parse { .. }));
  }

  #[test]
  fn memory_write_requires_parent_directory() {
    let memory = MemoryFs::new();
    let err = memory.write(Path::new("/out/a.json"), b"{}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    memory.create_dir_all(Path::new("/out")).unwrap();
    memory.write(Path::new("/out/a.json"), b"{}").unwrap();
    assert_eq!(memory.get("/out/a.json").as_deref(), Some("{}"));
    assert_eq!(memory.write_count(), 1);
  }

  #[test]
  fn memory_read_dir_lists_direct_children() {
    let memory = MemoryFs::new();
    memory.insert("/out/a.json", "{}");
    memory.insert("/out/nested/b.json", "{}");

    let entries = memory.read_dir(Path::new("/out")).unwrap();
    assert_eq!(entries, vec![
      DirEntry {
        path: PathBuf::from("/out/a.json"),
        is_dir: false,
      },
      DirEntry {
        path: PathBuf::from("/out/nested"),
        is_dir: true,
      },
    ]);
  }
}
