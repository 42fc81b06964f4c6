//! DRM connector discovery through sysfs
//!
//! Each `/sys/class/drm/cardN-<connector>` directory exposes `status`, the raw
//! `edid` blob and, for most drivers, the DDC channel either as a `ddc`
//! symlink or as an `i2c-N` child directory.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, trace};

use crate::registry::{join_key, split_key, RegistryStore};
use crate::constants::{paths, registry as reg};
use crate::edid::{self, DecodedEdid, RawEdidBlock};
use crate::error::{MonitorError, Result};

/// `card<N>-<connector>`, e.g. `card0-DP-1` or `card1-HDMI-A-2`
fn connector_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^card(\d+)-(.+)$").ok())
        .as_ref()
}

fn i2c_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"i2c-(\d+)$").ok()).as_ref()
}

/// One DRM connector
#[derive(Debug, Clone, PartialEq)]
pub struct DrmConnector {
    /// Directory name, e.g. `card0-DP-1`
    pub name: String,
    pub path: PathBuf,
    pub card: u32,
    pub connected: bool,
    pub edid: Option<RawEdidBlock>,
    pub i2c_bus: Option<u32>,
}

impl DrmConnector {
    pub fn decode(&self) -> Option<DecodedEdid> {
        self.edid
            .as_ref()
            .and_then(|block| edid::decode(block.as_bytes()).decoded())
    }

    /// `<PNP id><product code hex>`, the key a Windows registry would file this EDID under
    pub fn hardware_key(&self) -> Option<String> {
        self.decode().as_ref().and_then(hardware_key_for)
    }
}

/// Registry-style hardware key for decoded EDID, e.g. `DEL4123`
pub fn hardware_key_for(edid: &DecodedEdid) -> Option<String> {
    let id = edid.manufacturer_id?;
    let product = edid.product_code?;
    Some(format!("{}{:04X}", id, product))
}

/// Scan a DRM class directory for connectors, sorted by name
pub fn scan_connectors(drm_root: &Path) -> Result<Vec<DrmConnector>> {
    let entries = fs::read_dir(drm_root).map_err(|e| {
        MonitorError::Enumeration(format!("Cannot read {}: {}", drm_root.display(), e))
    })?;

    let mut connectors: Vec<DrmConnector> = entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            let caps = connector_pattern()?.captures(&name)?;
            let card = caps[1].parse().ok()?;
            Some(read_connector(entry.path(), name, card))
        })
        .collect();

    connectors.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(count = connectors.len(), root = ?drm_root, "Scanned DRM connectors");
    Ok(connectors)
}

fn read_connector(path: PathBuf, name: String, card: u32) -> DrmConnector {
    let connected = fs::read_to_string(path.join("status"))
        .map(|s| s.trim() == "connected")
        .unwrap_or(false);

    let edid = fs::read(path.join("edid"))
        .ok()
        .filter(|bytes| !bytes.is_empty())
        .and_then(|bytes| {
            let block = RawEdidBlock::new(bytes);
            if block.is_none() {
                debug!(connector = %name, "Ignoring invalid EDID");
            }
            block
        });

    let i2c_bus = find_i2c_bus(&path);
    trace!(connector = %name, connected, ?i2c_bus, has_edid = edid.is_some(), "Read connector");

    DrmConnector {
        name,
        path,
        card,
        connected,
        edid,
        i2c_bus,
    }
}

/// DDC bus number from the `ddc` symlink or an `i2c-N` child
fn find_i2c_bus(connector: &Path) -> Option<u32> {
    let bus_of = |name: &str| -> Option<u32> {
        i2c_pattern()?
            .captures(name)
            .and_then(|caps| caps[1].parse().ok())
    };

    if let Ok(target) = fs::read_link(connector.join("ddc")) {
        if let Some(bus) = target.file_name().and_then(|n| bus_of(&n.to_string_lossy())) {
            return Some(bus);
        }
    }

    let mut buses: Vec<u32> = fs::read_dir(connector)
        .ok()?
        .flatten()
        .filter_map(|entry| bus_of(&entry.file_name().to_string_lossy()))
        .collect();
    buses.sort_unstable();
    buses.first().copied()
}

/// Connected monitors' EDID presented as a registry hierarchy
///
/// Layout: `<hardware key>\<connector>\Device Parameters\EDID`. Only one
/// instance per connector exists, so the resolver sees the live EDID.
#[derive(Debug, Clone)]
pub struct SysfsEdidStore {
    drm_root: PathBuf,
}

impl Default for SysfsEdidStore {
    fn default() -> Self {
        Self::new(paths::DRM_CLASS)
    }
}

impl SysfsEdidStore {
    pub fn new(drm_root: impl Into<PathBuf>) -> Self {
        Self {
            drm_root: drm_root.into(),
        }
    }

    fn connected(&self) -> Result<Vec<(String, DrmConnector)>> {
        Ok(scan_connectors(&self.drm_root)?
            .into_iter()
            .filter(|c| c.connected)
            .filter_map(|c| c.hardware_key().map(|key| (key, c)))
            .collect())
    }

    fn find(&self, hardware_key: &str, connector: &str) -> Result<DrmConnector> {
        self.connected()?
            .into_iter()
            .find(|(key, c)| key == hardware_key && c.name == connector)
            .map(|(_, c)| c)
            .ok_or_else(|| MonitorError::KeyNotFound(join_key(hardware_key, connector)))
    }
}

impl RegistryStore for SysfsEdidStore {
    fn subkeys(&self, path: &str) -> Result<Vec<String>> {
        let parts: Vec<&str> = split_key(path).collect();
        match parts.as_slice() {
            [] => {
                let mut keys: Vec<String> = self.connected()?.into_iter().map(|(k, _)| k).collect();
                keys.sort();
                keys.dedup();
                Ok(keys)
            }
            [hardware_key] => {
                let names: Vec<String> = self
                    .connected()?
                    .into_iter()
                    .filter(|(key, _)| key.as_str() == *hardware_key)
                    .map(|(_, c)| c.name)
                    .collect();
                if names.is_empty() {
                    return Err(MonitorError::KeyNotFound(path.to_string()));
                }
                Ok(names)
            }
            [hardware_key, connector] => {
                self.find(hardware_key, connector)?;
                Ok(vec![reg::DEVICE_PARAMETERS.to_string()])
            }
            [hardware_key, connector, params] if *params == reg::DEVICE_PARAMETERS => {
                self.find(hardware_key, connector)?;
                Ok(Vec::new())
            }
            _ => Err(MonitorError::KeyNotFound(path.to_string())),
        }
    }

    fn value_names(&self, path: &str) -> Result<Vec<String>> {
        let parts: Vec<&str> = split_key(path).collect();
        match parts.as_slice() {
            [hardware_key, connector, params] if *params == reg::DEVICE_PARAMETERS => {
                self.find(hardware_key, connector)?;
                Ok(vec![reg::EDID_VALUE.to_string()])
            }
            _ => self.subkeys(path).map(|_| Vec::new()),
        }
    }

    fn read_binary(&self, path: &str, name: &str) -> Result<Vec<u8>> {
        let parts: Vec<&str> = split_key(path).collect();
        let not_found = || MonitorError::ValueNotFound {
            key: path.to_string(),
            name: name.to_string(),
        };
        match parts.as_slice() {
            [hardware_key, connector, params]
                if *params == reg::DEVICE_PARAMETERS && name == reg::EDID_VALUE =>
            {
                let connector = self.find(hardware_key, connector)?;
                connector
                    .edid
                    .map(|block| block.as_bytes().to_vec())
                    .ok_or_else(not_found)
            }
            _ => Err(not_found()),
        }
    }
}
