//! Test utilities for building EDID blocks and registry fixtures
//!
//! Built for unit tests and, through the `test-utils` feature, for the
//! workspace integration tests.

use crate::constants::edid::{self as layout, tags};
use crate::edid::ManufacturerId;
use crate::display::{LiveMonitor, MonitorHandle};
use crate::edid::RawEdidBlock;
use crate::registry::{MemoryRegistry, Recency, RegistryEdidEntry};

/// Builder for synthetic 128-byte EDID base blocks with a valid checksum
#[derive(Debug, Clone)]
pub struct EdidBuilder {
    bytes: [u8; layout::BLOCK_LEN],
}

impl Default for EdidBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EdidBuilder {
    /// Header, manufacturer "DEL", EDID 1.4, digital input, week 10 of 2020.
    /// Product code and serial are zero and no descriptors are present.
    pub fn new() -> Self {
        let mut bytes = [0u8; layout::BLOCK_LEN];
        bytes[..8].copy_from_slice(&layout::HEADER);
        let mut builder = Self { bytes };
        builder = builder.manufacturer("DEL");
        builder.bytes[layout::MANUFACTURE_WEEK] = 10;
        builder.bytes[layout::MANUFACTURE_YEAR] = 30;
        builder.bytes[layout::VERSION] = 1;
        builder.bytes[layout::REVISION] = 4;
        builder.bytes[layout::VIDEO_INPUT] = 0xA5;
        builder.bytes[layout::SCREEN_WIDTH_CM] = 60;
        builder.bytes[layout::SCREEN_HEIGHT_CM] = 34;
        builder.bytes[layout::GAMMA] = 120;
        builder.bytes[layout::FEATURES] = 0x3A;
        // sRGB primaries
        builder.bytes[25..35]
            .copy_from_slice(&[0xEE, 0x91, 0xA3, 0x54, 0x4C, 0x99, 0x26, 0x0F, 0x50, 0x54]);
        builder
    }

    /// Set the manufacturer code. Panics on anything but three uppercase letters.
    pub fn manufacturer(mut self, code: &str) -> Self {
        let id = ManufacturerId::parse(code).expect("three uppercase letters");
        self.bytes[layout::MANUFACTURER_ID..layout::MANUFACTURER_ID + 2]
            .copy_from_slice(&id.packed().to_be_bytes());
        self
    }

    pub fn product_code(mut self, code: u16) -> Self {
        self.bytes[layout::PRODUCT_CODE..layout::PRODUCT_CODE + 2]
            .copy_from_slice(&code.to_le_bytes());
        self
    }

    pub fn serial_number(mut self, serial: u32) -> Self {
        self.bytes[layout::SERIAL_NUMBER..layout::SERIAL_NUMBER + 4]
            .copy_from_slice(&serial.to_le_bytes());
        self
    }

    pub fn week_year(mut self, week: u8, year_offset: u8) -> Self {
        self.bytes[layout::MANUFACTURE_WEEK] = week;
        self.bytes[layout::MANUFACTURE_YEAR] = year_offset;
        self
    }

    /// Put a monitor name descriptor into `slot` (0..4)
    pub fn name_descriptor(self, slot: usize, text: &[u8]) -> Self {
        self.text_descriptor(slot, tags::NAME, text)
    }

    /// Put a serial string descriptor into `slot` (0..4)
    pub fn serial_descriptor(self, slot: usize, text: &[u8]) -> Self {
        self.text_descriptor(slot, tags::SERIAL, text)
    }

    pub fn text_descriptor(mut self, slot: usize, tag: u8, text: &[u8]) -> Self {
        let offset = layout::DESCRIPTOR_SLOTS[slot];
        let descriptor = &mut self.bytes[offset..offset + layout::DESCRIPTOR_LEN];
        descriptor.fill(0);
        descriptor[3] = tag;
        let payload = &mut descriptor[layout::DESCRIPTOR_TEXT..];
        // Unused payload bytes are padded with spaces after the newline
        payload.fill(b' ');
        let len = text.len().min(layout::DESCRIPTOR_TEXT_MAX);
        payload[..len].copy_from_slice(&text[..len]);
        if len < layout::DESCRIPTOR_TEXT_MAX && !text.contains(&b'\n') {
            payload[len] = b'\n';
        }
        self
    }

    /// 1920x1080@60 detailed timing in slot 0
    pub fn timing_1080p(mut self) -> Self {
        let offset = layout::DESCRIPTOR_SLOTS[0];
        self.bytes[offset..offset + layout::DESCRIPTOR_LEN].copy_from_slice(&[
            0x02, 0x3A, 0x80, 0x18, 0x71, 0x38, 0x2D, 0x40, 0x58, 0x2C, 0x45, 0x00, 0x56, 0x50,
            0x21, 0x00, 0x00, 0x1E,
        ]);
        self
    }

    /// Finish the block, fixing up the checksum byte
    pub fn build(mut self) -> Vec<u8> {
        let sum = self.bytes[..layout::BLOCK_LEN - 1]
            .iter()
            .fold(0u8, |acc, &b| acc.wrapping_add(b));
        self.bytes[layout::BLOCK_LEN - 1] = 0u8.wrapping_sub(sum);
        self.bytes.to_vec()
    }
}

/// A complete, realistic EDID: Dell U2720Q with timing, name and serial descriptors
pub fn sample_edid() -> Vec<u8> {
    EdidBuilder::new()
        .manufacturer("DEL")
        .product_code(0xA0FB)
        .serial_number(0x4C39_4B30)
        .timing_1080p()
        .name_descriptor(1, b"DELL U2720Q")
        .serial_descriptor(2, b"7XJ2K83")
        .build()
}

/// Registry path of an EDID value for a hardware/instance key pair
pub fn edid_value_path(hardware_key: &str, instance_key: &str) -> String {
    format!(
        "{}\\{}\\{}",
        hardware_key,
        instance_key,
        crate::constants::registry::DEVICE_PARAMETERS
    )
}

/// Add an instance with an EDID value and `extra_children` filler values to a memory registry
pub fn add_registry_instance(
    registry: &mut MemoryRegistry,
    hardware_key: &str,
    instance_key: &str,
    edid: &[u8],
    extra_children: usize,
) {
    let params = edid_value_path(hardware_key, instance_key);
    registry.insert_value(&params, crate::constants::registry::EDID_VALUE, edid.to_vec());
    let instance = format!("{}\\{}", hardware_key, instance_key);
    for i in 0..extra_children {
        registry.insert_value(&instance, &format!("Value{}", i), vec![i as u8]);
    }
}

/// A registry entry built directly, bypassing a store
///
/// Panics when `edid` is not a valid block.
pub fn registry_entry(
    hardware_key: &str,
    instance_key: &str,
    edid: &[u8],
    recency: Recency,
) -> RegistryEdidEntry {
    RegistryEdidEntry {
        hardware_key: hardware_key.to_string(),
        instance_key: instance_key.to_string(),
        path: edid_value_path(hardware_key, instance_key),
        edid: RawEdidBlock::new(edid.to_vec()).expect("fixture EDID must be valid"),
        recency,
        active: false,
    }
}

/// A live monitor whose handle and device name derive from `id`
pub fn live_monitor(id: &str, description: &str, hardware_key: Option<&str>) -> LiveMonitor {
    LiveMonitor {
        handle: MonitorHandle::new(id),
        device_name: format!("\\\\.\\{}", id),
        description: description.to_string(),
        hardware_key: hardware_key.map(str::to_string),
    }
}
