//! Engine Settings
//!
//! Persistent settings stored as JSON in `~/.config/monid/settings.json`,
//! or wherever `$MONID_CONFIG` points.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::debug;

use crate::constants::{paths, registry as reg, timing, vcp};
use crate::display::default_generic_names;
use crate::error::{MonitorError, Result};
use crate::hw::SysfsEdidStore;
use crate::registry::{FsRegistry, RegistryStore};

/// All engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EngineSettings {
    #[serde(default)]
    pub probe: ProbeSettings,

    #[serde(default)]
    pub resolver: ResolverSettings,

    #[serde(default)]
    pub registry: RegistrySettings,
}

/// Capability probe behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeSettings {
    /// Tries per VCP code (at least 1)
    #[serde(default = "default_attempts")]
    pub attempts: u8,

    /// Pause between tries of the same code
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// VCP codes queried by a default probe
    #[serde(default = "default_codes")]
    pub codes: Vec<u8>,

    /// Upper bound on a whole probe; remaining codes are skipped once exceeded
    #[serde(default)]
    pub budget_ms: Option<u64>,
}

/// Conflict resolution behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverSettings {
    /// Entries modified within this many days count as recent
    #[serde(default = "default_recent_window_days")]
    pub recent_window_days: u64,

    /// OS descriptions treated as carrying no identity
    #[serde(default = "default_generic_names")]
    pub generic_names: Vec<String>,
}

/// Where registry EDID records come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RegistrySettings {
    /// Directory mirror of a registry hierarchy; the platform store is used when unset
    #[serde(default)]
    pub root: Option<PathBuf>,
}

fn default_attempts() -> u8 { timing::PROBE_ATTEMPTS }
fn default_retry_delay_ms() -> u64 { timing::PROBE_RETRY_DELAY_MS }
fn default_codes() -> Vec<u8> { vcp::DEFAULT_PROBE_CODES.to_vec() }
fn default_recent_window_days() -> u64 { reg::RECENT_WINDOW_DAYS }

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            codes: default_codes(),
            budget_ms: None,
        }
    }
}

impl ProbeSettings {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn budget(&self) -> Option<Duration> {
        self.budget_ms.map(Duration::from_millis)
    }
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            recent_window_days: default_recent_window_days(),
            generic_names: default_generic_names(),
        }
    }
}

impl ResolverSettings {
    pub fn recent_window(&self) -> Duration {
        Duration::from_secs(self.recent_window_days.saturating_mul(24 * 60 * 60))
    }
}

impl RegistrySettings {
    /// Store named by these settings: the directory mirror, else live sysfs EDIDs
    pub fn store(&self) -> ConfiguredStore {
        match &self.root {
            Some(root) => {
                debug!(root = ?root, "Using directory registry");
                ConfiguredStore::Directory(FsRegistry::new(root))
            }
            None => ConfiguredStore::Sysfs(SysfsEdidStore::default()),
        }
    }
}

/// Registry store chosen by [`RegistrySettings::store`]
#[derive(Debug, Clone)]
pub enum ConfiguredStore {
    Directory(FsRegistry),
    Sysfs(SysfsEdidStore),
}

impl ConfiguredStore {
    fn inner(&self) -> &dyn RegistryStore {
        match self {
            Self::Directory(store) => store,
            Self::Sysfs(store) => store,
        }
    }
}

impl RegistryStore for ConfiguredStore {
    fn subkeys(&self, path: &str) -> Result<Vec<String>> {
        self.inner().subkeys(path)
    }

    fn value_names(&self, path: &str) -> Result<Vec<String>> {
        self.inner().value_names(path)
    }

    fn read_binary(&self, path: &str, name: &str) -> Result<Vec<u8>> {
        self.inner().read_binary(path, name)
    }

    fn modified(&self, path: &str) -> Option<SystemTime> {
        self.inner().modified(path)
    }
}

impl EngineSettings {
    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.probe.attempts == 0 {
            return Err(MonitorError::invalid_config("probe.attempts", "must be at least 1"));
        }
        if self.probe.retry_delay_ms > 10_000 {
            return Err(MonitorError::invalid_config(
                "probe.retry_delay_ms",
                "must not exceed 10000",
            ));
        }
        if self.resolver.recent_window_days > reg::MAX_RECENT_WINDOW_DAYS {
            return Err(MonitorError::invalid_config(
                "resolver.recent_window_days",
                format!("must not exceed {}", reg::MAX_RECENT_WINDOW_DAYS),
            ));
        }
        Ok(())
    }
}

/// Get the settings file path
///
/// `$MONID_CONFIG` wins; otherwise `<config dir>/monid/settings.json`.
pub fn get_settings_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(paths::CONFIG_ENV) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| MonitorError::config("Could not determine config directory"))?;
    Ok(config_dir.join(paths::APP_DIR).join(paths::SETTINGS_FILE))
}

/// Load settings from the default location
pub fn load_settings() -> Result<EngineSettings> {
    load_settings_from(&get_settings_path()?)
}

/// Load settings from a JSON file; a missing file yields defaults
pub fn load_settings_from(path: &Path) -> Result<EngineSettings> {
    if !path.exists() {
        debug!(path = ?path, "No settings file, using defaults");
        return Ok(EngineSettings::default());
    }

    let content = fs::read_to_string(path).map_err(|e| MonitorError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let settings: EngineSettings = serde_json::from_str(&content).map_err(|e| {
        MonitorError::config(format!("Failed to parse settings JSON: {}", e))
    })?;
    settings.validate()?;

    debug!(path = ?path, "Loaded settings");
    Ok(settings)
}

/// Save settings to the default location
pub fn save_settings(settings: &EngineSettings) -> Result<()> {
    save_settings_to(settings, &get_settings_path()?)
}

/// Save settings as pretty JSON, writing a temp file and renaming it into place
pub fn save_settings_to(settings: &EngineSettings, path: &Path) -> Result<()> {
    use std::io::Write;

    settings.validate()?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| MonitorError::FileWrite {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    let json = serde_json::to_string_pretty(settings)?;
    let temp_path = path.with_extension("json.tmp");
    let write_err = |e| MonitorError::FileWrite {
        path: temp_path.clone(),
        source: e,
    };

    let mut file = fs::File::create(&temp_path).map_err(write_err)?;
    file.write_all(json.as_bytes()).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;
    drop(file);

    fs::rename(&temp_path, path).map_err(|e| MonitorError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}
