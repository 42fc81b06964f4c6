//! Display Access Layer contract
//!
//! The engine never talks to the OS directly. A [`DisplayAccess`]
//! implementation enumerates live monitors and performs raw VCP feature
//! queries; registry EDID records come through [`crate::registry::RegistryStore`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::registry::GENERIC_MONITOR_NAMES;
use crate::error::Result;

/// Opaque handle to a physical monitor's control channel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonitorHandle(pub String);

impl MonitorHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MonitorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A currently connected monitor as reported by the OS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveMonitor {
    pub handle: MonitorHandle,
    /// OS device name (e.g. `\\.\DISPLAY1` or `card0-DP-1`)
    pub device_name: String,
    /// OS-assigned human-readable description
    pub description: String,
    /// Registry hardware key (e.g. `DEL4123`), when the OS exposes it
    pub hardware_key: Option<String>,
}

impl LiveMonitor {
    /// True when the description carries no identifying information
    pub fn has_generic_description(&self, generic_names: &[String]) -> bool {
        is_generic_name(&self.description, generic_names)
    }
}

/// Whether an OS-supplied name is empty or one of the placeholders for unnamed monitors
pub fn is_generic_name(name: &str, generic_names: &[String]) -> bool {
    let name = name.trim();
    name.is_empty() || generic_names.iter().any(|g| g.eq_ignore_ascii_case(name))
}

/// Default placeholder list as owned strings (for settings)
pub fn default_generic_names() -> Vec<String> {
    GENERIC_MONITOR_NAMES.iter().map(|s| s.to_string()).collect()
}

/// Successful reply to a VCP feature query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureReply {
    pub current: u16,
    pub max: u16,
}

impl FeatureReply {
    /// The reply folded into the 32-bit form used for vendor identity decoding
    pub fn raw(&self) -> u32 {
        (u32::from(self.max) << 16) | u32::from(self.current)
    }
}

/// Why a VCP feature query did not produce a value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryError {
    /// The monitor answered but does not implement the feature
    Unsupported,
    /// The control channel itself failed (bus error, timeout, bad checksum)
    Fault { code: u32, message: String },
}

impl QueryError {
    pub fn fault(code: u32, message: impl Into<String>) -> Self {
        Self::Fault {
            code,
            message: message.into(),
        }
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault { .. })
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported => write!(f, "feature not supported"),
            Self::Fault { code, message } => write!(f, "fault 0x{:08X}: {}", code, message),
        }
    }
}

impl std::error::Error for QueryError {}

/// Access to live monitors and their DDC/CI control channel
///
/// Implementations must not be called concurrently for the same handle.
#[cfg_attr(test, mockall::automock)]
pub trait DisplayAccess {
    /// Enumerate connected monitors
    fn monitors(&self) -> Result<Vec<LiveMonitor>>;

    /// Issue a single Get VCP Feature query
    fn query_feature(
        &self,
        handle: &MonitorHandle,
        code: u8,
    ) -> std::result::Result<FeatureReply, QueryError>;
}
