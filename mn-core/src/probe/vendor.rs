//! Vendor identity decoding from VCP query results
//!
//! Identity codes (display controller type, firmware level, MCCS version)
//! come back as plain numbers whose meaning varies by vendor. A 32-bit value
//! `(max << 16) | current` is interpreted, in order, as:
//!
//! 1. printable ASCII, most significant byte first
//! 2. BCD `major.minor` from the current value (every nibble <= 9)
//! 3. plain `major.minor` from the current value (each byte <= 99)
//! 4. a hexadecimal literal of the whole value

use serde::{Deserialize, Serialize};

use super::ProbeResult;
use crate::constants::vcp;

/// Which interpretation produced a field's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Ascii,
    Bcd,
    Numeric,
    Hex,
}

/// A decoded identity value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorField {
    pub raw: u32,
    pub text: String,
    pub kind: FieldKind,
}

impl VendorField {
    /// Text interpretations identify a vendor; version numbers and hex do not
    pub fn is_informative(&self) -> bool {
        self.kind == FieldKind::Ascii
    }
}

/// Identity strings decoded from a probe
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorIdentity {
    /// VCP 0xC8, display controller type
    pub controller: Option<VendorField>,
    /// VCP 0xC9, firmware level
    pub firmware: Option<VendorField>,
    /// VCP 0xDF, MCCS version
    pub mccs_version: Option<VendorField>,
}

impl VendorIdentity {
    /// Collect identity fields from successful probe results
    pub fn from_results(results: &[ProbeResult]) -> Self {
        let field = |code: u8| {
            results
                .iter()
                .find(|r| r.code == code && r.success)
                .and_then(|r| r.raw())
                .and_then(decode_vendor_field)
        };

        Self {
            controller: field(vcp::DISPLAY_CONTROLLER_TYPE),
            firmware: field(vcp::FIRMWARE_LEVEL),
            mccs_version: field(vcp::VCP_VERSION),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.controller.is_none() && self.firmware.is_none() && self.mccs_version.is_none()
    }

    /// Whether any field decoded as vendor text
    pub fn is_informative(&self) -> bool {
        self.fields().any(VendorField::is_informative)
    }

    /// Text of the informative fields, joined by spaces
    pub fn label(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .fields()
            .filter(|f| f.is_informative())
            .map(|f| f.text.as_str())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }

    fn fields(&self) -> impl Iterator<Item = &VendorField> {
        [&self.controller, &self.firmware, &self.mccs_version]
            .into_iter()
            .flatten()
    }
}

/// Interpret a raw 32-bit identity value. Zero carries no information.
pub fn decode_vendor_field(raw: u32) -> Option<VendorField> {
    if raw == 0 {
        return None;
    }

    let (text, kind) = if let Some(text) = decode_ascii(raw) {
        (text, FieldKind::Ascii)
    } else if let Some(text) = decode_bcd_version(raw as u16) {
        (text, FieldKind::Bcd)
    } else if let Some(text) = decode_numeric_version(raw as u16) {
        (text, FieldKind::Numeric)
    } else {
        (format!("0x{:X}", raw), FieldKind::Hex)
    };

    Some(VendorField { raw, text, kind })
}

/// Printable ASCII from the four bytes, MSB first, ignoring zero padding.
/// Needs at least two characters and one alphanumeric.
pub fn decode_ascii(raw: u32) -> Option<String> {
    let bytes: Vec<u8> = raw.to_be_bytes().into_iter().filter(|&b| b != 0).collect();
    if bytes.len() < 2 || !bytes.iter().all(|b| (0x20..=0x7E).contains(b)) {
        return None;
    }
    if !bytes.iter().any(u8::is_ascii_alphanumeric) {
        return None;
    }
    let text = String::from_utf8(bytes).ok()?;
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// BCD `major.minor` from a 16-bit word, e.g. 0x0110 -> "1.10"
pub fn decode_bcd_version(word: u16) -> Option<String> {
    if word == 0 {
        return None;
    }
    let nibbles = [word >> 12, (word >> 8) & 0xF, (word >> 4) & 0xF, word & 0xF];
    if nibbles.iter().any(|&n| n > 9) {
        return None;
    }
    let major = nibbles[0] * 10 + nibbles[1];
    let minor = nibbles[2] * 10 + nibbles[3];
    Some(format!("{}.{}", major, minor))
}

/// Plain `major.minor` from the two bytes of a 16-bit word, each at most 99
pub fn decode_numeric_version(word: u16) -> Option<String> {
    if word == 0 {
        return None;
    }
    let major = word >> 8;
    let minor = word & 0xFF;
    (major <= 99 && minor <= 99).then(|| format!("{}.{}", major, minor))
}
