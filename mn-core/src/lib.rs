//! monid Core Library
//!
//! Resolves which physical monitor is which: decodes EDID, picks the right
//! record out of a cluttered EDID registry, probes the DDC/CI control channel
//! and settles on a display name.
//!
//! # Features
//!
//! - **EDID Decoding**: Pure, total decoding of the 128-byte base block
//! - **Registry Enumeration**: Every stored EDID record with a recency estimate
//! - **Conflict Resolution**: Deterministic heuristic chain from many records to one
//! - **Capability Probing**: Retried VCP queries, responsiveness classification
//!   and vendor identity decoding
//! - **Name Resolution**: Live probe, then EDID, then OS name
//!
//! # Module Structure
//!
//! - `edid/` - EDID block types and decoder
//! - `registry/` - Registry stores and EDID record enumeration
//! - `resolve/` - Conflict resolution
//! - `probe/` - DDC/CI capability probing
//! - `hw/` - DDC packet codec, sysfs discovery, Linux backend
//!
//! # Example
//!
//! ```no_run
//! use mn_core::{ConflictResolver, FsRegistry, RegistryEdidRepository};
//! # let target = mn_core::LiveMonitor {
//! #     handle: mn_core::MonitorHandle::new("m1"),
//! #     device_name: "DISPLAY1".into(),
//! #     description: "Generic PnP Monitor".into(),
//! #     hardware_key: Some("DEL4123".into()),
//! # };
//!
//! let repository = RegistryEdidRepository::new(FsRegistry::new("/srv/edid-export"));
//! let entries = repository.enumerate();
//! let resolution = ConflictResolver::default().resolve(&entries, &target, &[]);
//! ```

// Grouped modules
pub mod edid;
pub mod hw;
pub mod probe;
pub mod registry;
pub mod resolve;

// Standalone modules
pub mod constants;
pub mod display;
pub mod error;
pub mod identity;
pub mod naming;
pub mod settings;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export error types
pub use error::{MonitorError, Result};

// Re-export EDID types
pub use edid::{decode, DecodedEdid, EdidDecode, InvalidEdid, ManufacturerId, RawEdidBlock};

// Re-export display access contract
pub use display::{DisplayAccess, FeatureReply, LiveMonitor, MonitorHandle, QueryError};

// Re-export registry types
pub use registry::{
    FsRegistry, MemoryRegistry, Recency, RegistryEdidEntry, RegistryEdidRepository,
    RegistryStore,
};

// Re-export resolution and probing
pub use probe::{CapabilityProber, CapabilityReport, ProbeResult, Responsiveness, VendorIdentity};
pub use resolve::{ConflictResolver, Resolution, ResolveReason};

// Re-export naming and orchestration
pub use identity::{EdidLookup, IdentityEngine, MonitorIdentity, MonitorRecord};
pub use naming::{resolve_name, NameSource, ResolvedName};

// Re-export settings
pub use settings::{
    load_settings, load_settings_from, save_settings, save_settings_to, EngineSettings,
    ConfiguredStore, ProbeSettings, RegistrySettings, ResolverSettings,
};

#[cfg(target_os = "linux")]
pub use hw::LinuxDisplayAccess;
pub use hw::SysfsEdidStore;
