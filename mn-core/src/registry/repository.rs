//! Enumeration of registry EDID records
//!
//! # Recency heuristic
//!
//! Registries rarely expose a trustworthy "last written" time, so each entry
//! carries an approximate recency score:
//!
//! ```text
//! score = subkeys(instance) + values(instance) + values(instance\Device Parameters)
//! ```
//!
//! An instance the OS has touched recently tends to have accumulated more
//! child records (driver binding, `Control` key, extra parameters) than a stale
//! one. It is a best-effort tie-breaker, not ground truth. When the store
//! reports a real modification time it is recorded as well and ranks first.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, trace};

use super::{join_key, RegistryStore};
use crate::constants::registry as reg;
use crate::edid::{self, DecodedEdid, RawEdidBlock};

/// Approximate recency of a registry instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Recency {
    /// Child-count heuristic score; larger means more recently touched
    pub score: u32,
    /// Real modification time, when the store provides one
    pub modified: Option<SystemTime>,
}

impl Recency {
    pub fn from_score(score: u32) -> Self {
        Self { score, modified: None }
    }

    pub fn with_modified(score: u32, modified: SystemTime) -> Self {
        Self {
            score,
            modified: Some(modified),
        }
    }

    /// Whether the entry was touched within `window` before `now`.
    ///
    /// Only real timestamps can place an entry inside a time window; the
    /// heuristic score never does. Timestamps in the future count as recent.
    pub fn is_within(&self, now: SystemTime, window: Duration) -> bool {
        match self.modified {
            Some(modified) => now
                .duration_since(modified)
                .map(|age| age <= window)
                .unwrap_or(true),
            None => false,
        }
    }
}

impl PartialOrd for Recency {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Timestamped entries rank above heuristic-only ones, then by time, then by score
impl Ord for Recency {
    fn cmp(&self, other: &Self) -> Ordering {
        self.modified
            .cmp(&other.modified)
            .then(self.score.cmp(&other.score))
    }
}

/// One EDID record found in the registry
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEdidEntry {
    /// Hardware identifier key, e.g. `DEL4123`
    pub hardware_key: String,
    /// Instance key under the hardware key
    pub instance_key: String,
    /// Full path of the key holding the EDID value
    pub path: String,
    pub edid: RawEdidBlock,
    pub recency: Recency,
    /// Set only on the entry a resolver picked for a live monitor
    pub active: bool,
}

impl RegistryEdidEntry {
    pub fn decode(&self) -> DecodedEdid {
        // The block was validated on construction, so decoding cannot fail
        edid::decode(self.edid.as_bytes()).decoded().unwrap_or_default()
    }

    /// Copy of this entry marked as the active record
    pub fn activated(&self) -> Self {
        Self {
            active: true,
            ..self.clone()
        }
    }
}

/// Reads EDID records out of a [`RegistryStore`]
pub struct RegistryEdidRepository<S> {
    store: S,
}

impl<S: RegistryStore> RegistryEdidRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// All hardware keys at the root, sorted
    pub fn hardware_keys(&self) -> Vec<String> {
        match self.store.subkeys("") {
            Ok(mut keys) => {
                keys.sort();
                keys
            }
            Err(e) => {
                debug!(error = %e, "Registry root not readable");
                Vec::new()
            }
        }
    }

    /// Every valid EDID record, ordered by hardware key then instance key
    pub fn enumerate(&self) -> Vec<RegistryEdidEntry> {
        let entries: Vec<RegistryEdidEntry> = self
            .hardware_keys()
            .iter()
            .flat_map(|key| self.enumerate_hardware(key))
            .collect();

        info!(count = entries.len(), "Enumerated registry EDID records");
        entries
    }

    /// Valid EDID records of a single hardware key
    pub fn enumerate_hardware(&self, hardware_key: &str) -> Vec<RegistryEdidEntry> {
        let mut instances = match self.store.subkeys(hardware_key) {
            Ok(keys) => keys,
            Err(e) => {
                debug!(key = hardware_key, error = %e, "Skipping unreadable hardware key");
                return Vec::new();
            }
        };
        instances.sort();

        instances
            .iter()
            .filter_map(|instance| self.read_instance(hardware_key, instance))
            .collect()
    }

    fn read_instance(&self, hardware_key: &str, instance_key: &str) -> Option<RegistryEdidEntry> {
        let instance_path = join_key(hardware_key, instance_key);
        let params_path = join_key(&instance_path, reg::DEVICE_PARAMETERS);

        let bytes = match self.store.read_binary(&params_path, reg::EDID_VALUE) {
            Ok(bytes) => bytes,
            Err(e) => {
                trace!(path = %params_path, error = %e, "No EDID value");
                return None;
            }
        };

        let Some(block) = RawEdidBlock::new(bytes) else {
            debug!(path = %params_path, "Skipping invalid EDID blob");
            return None;
        };

        let recency = self.recency_of(&instance_path, &params_path);
        trace!(path = %params_path, score = recency.score, "Found EDID record");

        Some(RegistryEdidEntry {
            hardware_key: hardware_key.to_string(),
            instance_key: instance_key.to_string(),
            path: params_path,
            edid: block,
            recency,
            active: false,
        })
    }

    fn recency_of(&self, instance_path: &str, params_path: &str) -> Recency {
        let count = |result: crate::error::Result<Vec<String>>| -> u32 {
            result.map(|v| v.len() as u32).unwrap_or(0)
        };
        let score = count(self.store.subkeys(instance_path))
            + count(self.store.value_names(instance_path))
            + count(self.store.value_names(params_path));

        Recency {
            score,
            modified: self.store.modified(instance_path),
        }
    }
}

/// Group entries by hardware key, preserving enumeration order within a group
pub fn group_by_hardware_key(
    entries: Vec<RegistryEdidEntry>,
) -> BTreeMap<String, Vec<RegistryEdidEntry>> {
    let mut groups: BTreeMap<String, Vec<RegistryEdidEntry>> = BTreeMap::new();
    for entry in entries {
        groups.entry(entry.hardware_key.clone()).or_default().push(entry);
    }
    groups
}
