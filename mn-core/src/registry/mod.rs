//! Registry EDID storage
//!
//! Operating systems keep one EDID record per monitor *instance* they have
//! ever seen, under `<hardware key>\<instance key>\Device Parameters\EDID`.
//! Stale and partially written records are normal, so enumeration validates
//! each blob and silently skips anything that is not a usable EDID.
//!
//! # Layout
//!
//! ```text
//! <root>
//! └── DEL4123                      hardware key (PNP id + product)
//!     ├── 5&2b3c4d&0&UID4353       instance key
//!     │   ├── <values ...>
//!     │   └── Device Parameters
//!     │       └── EDID             raw 128+ byte blob
//!     └── 5&9e8f7a&0&UID4357
//! ```
//!
//! Stores are abstracted by [`RegistryStore`]; [`MemoryRegistry`] and
//! [`FsRegistry`] are provided, and `hw::SysfsEdidStore` exposes sysfs as one.

mod fs;
mod memory;
mod repository;

pub use fs::FsRegistry;
pub use memory::MemoryRegistry;
pub use repository::{group_by_hardware_key, Recency, RegistryEdidEntry, RegistryEdidRepository};

use std::time::SystemTime;

use crate::error::Result;

/// Separator between key names in a registry path
pub const KEY_SEPARATOR: char = '\\';

/// A hierarchical key-value store holding binary values
///
/// Paths are key names joined with [`KEY_SEPARATOR`]; the empty path is the root.
pub trait RegistryStore {
    /// Names of the direct subkeys of `path`
    fn subkeys(&self, path: &str) -> Result<Vec<String>>;

    /// Names of the values stored directly under `path`
    fn value_names(&self, path: &str) -> Result<Vec<String>>;

    /// Raw bytes of value `name` under `path`
    fn read_binary(&self, path: &str, name: &str) -> Result<Vec<u8>>;

    /// Last modification time of a key, when the store records one
    fn modified(&self, _path: &str) -> Option<SystemTime> {
        None
    }
}

impl<T: RegistryStore + ?Sized> RegistryStore for &T {
    fn subkeys(&self, path: &str) -> Result<Vec<String>> {
        (**self).subkeys(path)
    }

    fn value_names(&self, path: &str) -> Result<Vec<String>> {
        (**self).value_names(path)
    }

    fn read_binary(&self, path: &str, name: &str) -> Result<Vec<u8>> {
        (**self).read_binary(path, name)
    }

    fn modified(&self, path: &str) -> Option<SystemTime> {
        (**self).modified(path)
    }
}

/// Join a parent path and a child key name
pub fn join_key(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{}{}{}", parent, KEY_SEPARATOR, child)
    }
}

/// Split a path into its key names, ignoring empty segments
pub fn split_key(path: &str) -> impl Iterator<Item = &str> {
    path.split(KEY_SEPARATOR).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_and_split() {
        assert_eq!(join_key("", "DEL4123"), "DEL4123");
        assert_eq!(join_key("DEL4123", "inst"), "DEL4123\\inst");
        let parts: Vec<&str> = split_key("\\DEL4123\\\\inst\\").collect();
        assert_eq!(parts, vec!["DEL4123", "inst"]);
    }
}
