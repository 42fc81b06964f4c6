//! Directory-backed registry store
//!
//! Keys are directories and values are regular files below a root directory.
//! Unlike most registries this store knows real modification times, so
//! recency ranking uses them instead of the child-count heuristic.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use tracing::trace;

use super::{split_key, RegistryStore};
use crate::error::{MonitorError, Result};

/// A registry hierarchy mirrored on the file system
#[derive(Debug, Clone)]
pub struct FsRegistry {
    root: PathBuf,
}

impl FsRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a registry path onto the file system, refusing anything that escapes the root
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let mut full = self.root.clone();
        for key in split_key(path) {
            let mut components = Path::new(key).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(part)), None) => full.push(part),
                _ => {
                    return Err(MonitorError::registry(path, "key name escapes registry root"));
                }
            }
        }
        Ok(full)
    }

    fn list(&self, path: &str, want_dirs: bool) -> Result<Vec<String>> {
        let dir = self.resolve(path)?;
        let entries = fs::read_dir(&dir).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MonitorError::KeyNotFound(path.to_string())
            } else {
                MonitorError::registry(path, e.to_string())
            }
        })?;

        let mut names: Vec<String> = entries
            .flatten()
            .filter(|entry| {
                entry
                    .file_type()
                    .map(|t| if want_dirs { t.is_dir() } else { t.is_file() })
                    .unwrap_or(false)
            })
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        Ok(names)
    }
}

impl RegistryStore for FsRegistry {
    fn subkeys(&self, path: &str) -> Result<Vec<String>> {
        self.list(path, true)
    }

    fn value_names(&self, path: &str) -> Result<Vec<String>> {
        self.list(path, false)
    }

    fn read_binary(&self, path: &str, name: &str) -> Result<Vec<u8>> {
        let file = self.resolve(path)?.join(name);
        trace!(path = ?file, "Reading registry value");
        fs::read(&file).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MonitorError::ValueNotFound {
                    key: path.to_string(),
                    name: name.to_string(),
                }
            } else {
                MonitorError::FileRead { path: file, source: e }
            }
        })
    }

    fn modified(&self, path: &str) -> Option<SystemTime> {
        let dir = self.resolve(path).ok()?;
        fs::metadata(dir).and_then(|m| m.modified()).ok()
    }
}
