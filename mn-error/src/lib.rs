//! Unified error handling for monid
//!
//! A single error type shared by the engine and the display access backends.
//! Only the fallible boundaries use it: enumerating monitors, reading a
//! registry store, talking to a DDC/CI bus and loading configuration. Decoding
//! and resolution never fail; they return absent values instead.

use std::io;
use std::path::PathBuf;

/// Result type alias using MonitorError
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Unified error type for all monid operations
#[derive(thiserror::Error, Debug)]
pub enum MonitorError {
    // ============================================================================
    // I/O and File System Errors
    // ============================================================================
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: io::Error,
    },

    // ============================================================================
    // Registry Errors
    // ============================================================================
    #[error("Registry key not found: {0}")]
    KeyNotFound(String),

    #[error("Registry value {name} not found under {key}")]
    ValueNotFound {
        key: String,
        name: String,
    },

    #[error("Failed to read registry key {key}: {reason}")]
    RegistryRead {
        key: String,
        reason: String,
    },

    // ============================================================================
    // Display Access Errors
    // ============================================================================
    #[error("Display enumeration failed: {0}")]
    Enumeration(String),

    #[error("DDC/CI bus {bus} unavailable: {reason}")]
    BusUnavailable {
        bus: u32,
        reason: String,
    },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidConfig {
        field: String,
        reason: String,
    },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Generic(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

impl MonitorError {
    /// Create a generic error from a string
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic(msg.into())
    }

    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a registry read error
    pub fn registry(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RegistryRead {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a bus error for a DDC/CI adapter
    pub fn bus(bus: u32, reason: impl Into<String>) -> Self {
        Self::BusUnavailable {
            bus,
            reason: reason.into(),
        }
    }

    /// Whether this error means "the thing is simply not there"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound(_) | Self::ValueNotFound { .. }) || matches!(self, Self::Io(e) if e.kind() == io::ErrorKind::NotFound)
    }
}

// Allow converting from String to MonitorError
impl From<String> for MonitorError {
    fn from(s: String) -> Self {
        Self::Generic(s)
    }
}

// Allow converting from &str to MonitorError
impl From<&str> for MonitorError {
    fn from(s: &str) -> Self {
        Self::Generic(s.to_string())
    }
}
