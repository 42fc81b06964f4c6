//! In-memory registry store

use std::collections::BTreeMap;
use std::time::SystemTime;

use super::{split_key, RegistryStore};
use crate::error::{MonitorError, Result};

#[derive(Debug, Clone, Default)]
struct Node {
    subkeys: BTreeMap<String, Node>,
    values: BTreeMap<String, Vec<u8>>,
    modified: Option<SystemTime>,
}

/// A registry hierarchy held in memory
///
/// Useful for callers that already hold EDID blobs (e.g. exported from another
/// machine) and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    root: Node,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `path` (and its parents) if missing
    pub fn insert_key(&mut self, path: &str) {
        self.node_mut(path);
    }

    /// Store a binary value, creating the key path as needed
    pub fn insert_value(&mut self, path: &str, name: &str, data: Vec<u8>) {
        self.node_mut(path).values.insert(name.to_string(), data);
    }

    /// Record a modification time for a key
    pub fn set_modified(&mut self, path: &str, when: SystemTime) {
        self.node_mut(path).modified = Some(when);
    }

    fn node_mut(&mut self, path: &str) -> &mut Node {
        split_key(path).fold(&mut self.root, |node, key| {
            node.subkeys.entry(key.to_string()).or_default()
        })
    }

    fn node(&self, path: &str) -> Result<&Node> {
        let mut node = &self.root;
        for key in split_key(path) {
            node = node
                .subkeys
                .get(key)
                .ok_or_else(|| MonitorError::KeyNotFound(path.to_string()))?;
        }
        Ok(node)
    }
}

impl RegistryStore for MemoryRegistry {
    fn subkeys(&self, path: &str) -> Result<Vec<String>> {
        Ok(self.node(path)?.subkeys.keys().cloned().collect())
    }

    fn value_names(&self, path: &str) -> Result<Vec<String>> {
        Ok(self.node(path)?.values.keys().cloned().collect())
    }

    fn read_binary(&self, path: &str, name: &str) -> Result<Vec<u8>> {
        self.node(path)?
            .values
            .get(name)
            .cloned()
            .ok_or_else(|| MonitorError::ValueNotFound {
                key: path.to_string(),
                name: name.to_string(),
            })
    }

    fn modified(&self, path: &str) -> Option<SystemTime> {
        self.node(path).ok().and_then(|node| node.modified)
    }
}
