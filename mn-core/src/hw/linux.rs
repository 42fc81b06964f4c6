//! Linux Display Access Layer
//!
//! Monitors come from DRM connectors in sysfs; VCP queries go over the
//! connector's DDC bus through `/dev/i2c-N`. The i2c-dev module must be
//! loaded and the user needs access to the device nodes.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tracing::{debug, trace};

use super::ddc;
use super::sysfs::{scan_connectors, DrmConnector};
use crate::constants::{ddc as ddc_consts, paths, registry as reg, timing};
use crate::display::{DisplayAccess, FeatureReply, LiveMonitor, MonitorHandle, QueryError};
use crate::error::{MonitorError, Result};

/// An i2c device bound to the DDC/CI address, opened on first use
#[derive(Debug)]
struct DdcChannel {
    bus: u32,
    device: Option<File>,
}

impl DdcChannel {
    fn new(bus: u32) -> Self {
        Self { bus, device: None }
    }

    fn open(&mut self, dev_prefix: &str) -> Result<&mut File> {
        if self.device.is_none() {
            let path = PathBuf::from(format!("{}{}", dev_prefix, self.bus));
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .open(&path)
                .map_err(|e| match e.kind() {
                    std::io::ErrorKind::PermissionDenied => {
                        MonitorError::PermissionDenied(path.display().to_string())
                    }
                    _ => MonitorError::bus(self.bus, e.to_string()),
                })?;

            // SAFETY: the fd belongs to `file`, which outlives the call, and
            // I2C_SLAVE takes the 7-bit address by value.
            let rc = unsafe {
                libc::ioctl(
                    file.as_raw_fd(),
                    ddc_consts::I2C_SLAVE as _,
                    libc::c_ulong::from(ddc_consts::I2C_ADDRESS),
                )
            };
            if rc < 0 {
                return Err(MonitorError::bus(
                    self.bus,
                    format!("I2C_SLAVE failed: {}", std::io::Error::last_os_error()),
                ));
            }
            debug!(bus = self.bus, "Opened DDC channel");
            self.device = Some(file);
        }

        self.device
            .as_mut()
            .ok_or_else(|| MonitorError::bus(self.bus, "channel not open"))
    }

    fn get_vcp(&mut self, dev_prefix: &str, code: u8) -> std::result::Result<FeatureReply, QueryError> {
        let bus = self.bus;
        let device = self
            .open(dev_prefix)
            .map_err(|e| QueryError::fault(0, e.to_string()))?;

        let io_fault = |e: std::io::Error| {
            QueryError::fault(e.raw_os_error().unwrap_or(0) as u32, format!("i2c-{}: {}", bus, e))
        };

        device.write_all(&ddc::encode_get_vcp(code)).map_err(io_fault)?;
        thread::sleep(timing::DDC_REPLY_DELAY);

        let mut reply = [0u8; ddc_consts::GET_VCP_REPLY_LEN];
        device.read_exact(&mut reply).map_err(io_fault)?;
        trace!(bus, code = format_args!("0x{:02X}", code), reply = ?reply, "DDC reply");

        ddc::decode_get_vcp_reply(&reply, code)
    }
}

/// DRM + i2c-dev backed [`DisplayAccess`]
pub struct LinuxDisplayAccess {
    drm_root: PathBuf,
    dev_prefix: String,
    channels: Mutex<HashMap<MonitorHandle, Arc<Mutex<DdcChannel>>>>,
}

impl Default for LinuxDisplayAccess {
    fn default() -> Self {
        Self::new(paths::DRM_CLASS, paths::I2C_DEV_PREFIX)
    }
}

impl LinuxDisplayAccess {
    pub fn new(drm_root: impl Into<PathBuf>, dev_prefix: impl Into<String>) -> Self {
        Self {
            drm_root: drm_root.into(),
            dev_prefix: dev_prefix.into(),
            channels: Mutex::new(HashMap::new()),
        }
    }

    fn live_monitor(connector: &DrmConnector) -> LiveMonitor {
        let edid = connector.decode();
        let description = edid
            .as_ref()
            .and_then(|e| e.model_name.clone())
            .unwrap_or_else(|| reg::GENERIC_MONITOR_NAMES[0].to_string());

        LiveMonitor {
            handle: MonitorHandle::new(connector.name.clone()),
            device_name: connector.name.clone(),
            description,
            hardware_key: connector.hardware_key(),
        }
    }

    fn channel(&self, handle: &MonitorHandle) -> Option<Arc<Mutex<DdcChannel>>> {
        self.channels.lock().get(handle).cloned()
    }
}

impl DisplayAccess for LinuxDisplayAccess {
    fn monitors(&self) -> Result<Vec<LiveMonitor>> {
        let connectors: Vec<DrmConnector> = scan_connectors(&self.drm_root)?
            .into_iter()
            .filter(|c| c.connected)
            .collect();

        let mut channels = self.channels.lock();
        for connector in &connectors {
            let handle = MonitorHandle::new(connector.name.clone());
            match connector.i2c_bus {
                Some(bus) => {
                    let stale = channels
                        .get(&handle)
                        .map_or(true, |channel| channel.lock().bus != bus);
                    if stale {
                        channels.insert(handle, Arc::new(Mutex::new(DdcChannel::new(bus))));
                    }
                }
                None => {
                    channels.remove(&handle);
                }
            }
        }

        Ok(connectors.iter().map(Self::live_monitor).collect())
    }

    fn query_feature(
        &self,
        handle: &MonitorHandle,
        code: u8,
    ) -> std::result::Result<FeatureReply, QueryError> {
        let channel = self
            .channel(handle)
            .ok_or_else(|| QueryError::fault(0, format!("no DDC channel for {}", handle)))?;
        // Holding the per-handle lock serializes queries on one bus
        let mut channel = channel.lock();
        channel.get_vcp(&self.dev_prefix, code)
    }
}
