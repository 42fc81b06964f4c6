//! Hardware access
//!
//! DDC/CI packet handling, DRM connector discovery and the Linux
//! implementation of [`DisplayAccess`](crate::display::DisplayAccess).

pub mod ddc;
#[cfg(target_os = "linux")]
mod linux;
mod sysfs;

#[cfg(target_os = "linux")]
pub use linux::LinuxDisplayAccess;
pub use sysfs::{hardware_key_for, scan_connectors, DrmConnector, SysfsEdidStore};
