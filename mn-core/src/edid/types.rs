//! EDID data types
//!
//! Every decoded field is an `Option`: `None` means the buffer did not cover
//! the field or the stored value is the standard's "unknown" marker. A decoded
//! zero is always `Some(0)`.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::constants::edid as layout;

/// A validated EDID base block: at least 128 bytes with the fixed header
#[derive(Clone, PartialEq, Eq)]
pub struct RawEdidBlock(Vec<u8>);

impl RawEdidBlock {
    /// Validate and wrap a byte buffer. Returns `None` for short buffers or a bad header.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Option<Self> {
        let bytes = bytes.into();
        if bytes.len() < layout::BLOCK_LEN || !has_valid_header(&bytes) {
            return None;
        }
        Some(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// SHA-256 of the base block as lowercase hex, a stable key for the physical panel
    pub fn hash_hex(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.0[..layout::BLOCK_LEN]);
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }
}

impl fmt::Debug for RawEdidBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawEdidBlock({} bytes)", self.0.len())
    }
}

/// True when the buffer starts with `00 FF FF FF FF FF FF 00`
pub fn has_valid_header(bytes: &[u8]) -> bool {
    bytes.len() >= layout::HEADER.len() && bytes[..layout::HEADER.len()] == layout::HEADER
}

/// Three-letter PNP manufacturer code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ManufacturerId([u8; 3]);

impl ManufacturerId {
    /// Unpack a big-endian 16-bit field. Each 5-bit group must map to A..=Z.
    pub fn from_packed(packed: u16) -> Option<Self> {
        let letters = [(packed >> 10) & 0x1F, (packed >> 5) & 0x1F, packed & 0x1F];
        let mut code = [0u8; 3];
        for (slot, value) in code.iter_mut().zip(letters) {
            if !(1..=26).contains(&value) {
                return None;
            }
            *slot = b'A' - 1 + value as u8;
        }
        Some(Self(code))
    }

    /// Parse a three-letter code such as "DEL"
    pub fn parse(code: &str) -> Option<Self> {
        let bytes = code.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(|b| b.is_ascii_uppercase()) {
            return None;
        }
        Some(Self([bytes[0], bytes[1], bytes[2]]))
    }

    /// Pack back into the big-endian EDID representation
    pub fn packed(&self) -> u16 {
        self.0
            .iter()
            .fold(0u16, |acc, &c| (acc << 5) | u16::from(c - (b'A' - 1)))
    }

    pub fn as_str(&self) -> &str {
        // Always ASCII uppercase by construction
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl fmt::Display for ManufacturerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ManufacturerId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ManufacturerId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid manufacturer code: {}", s)))
    }
}

/// EDID structure version and revision (bytes 18, 19)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdidVersion {
    pub version: u8,
    pub revision: u8,
}

impl fmt::Display for EdidVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.version, self.revision)
    }
}

/// Video input definition (byte 20)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoInput {
    pub digital: bool,
    pub raw: u8,
}

/// Display colour type from the supported-features byte (bits 4-3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayType {
    Monochrome,
    Rgb,
    NonRgb,
    Undefined,
}

impl DisplayType {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::Monochrome,
            0b01 => Self::Rgb,
            0b10 => Self::NonRgb,
            _ => Self::Undefined,
        }
    }
}

/// Supported features bitfield (byte 24)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedFeatures {
    pub dpms_standby: bool,
    pub dpms_suspend: bool,
    pub dpms_active_off: bool,
    pub display_type: DisplayType,
    /// sRGB is the default colour space
    pub default_color_space: bool,
    /// Preferred timing mode is in the first detailed timing descriptor
    pub preferred_timing: bool,
    pub continuous_frequency: bool,
    pub raw: u8,
}

/// A CIE 1931 chromaticity point as two raw 10-bit values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChromaPoint {
    pub x_raw: u16,
    pub y_raw: u16,
}

impl ChromaPoint {
    pub fn x(&self) -> f64 {
        f64::from(self.x_raw) / layout::CHROMA_DIVISOR
    }

    pub fn y(&self) -> f64 {
        f64::from(self.y_raw) / layout::CHROMA_DIVISOR
    }
}

/// Red, green, blue and white reference points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chromaticity {
    pub red: ChromaPoint,
    pub green: ChromaPoint,
    pub blue: ChromaPoint,
    pub white: ChromaPoint,
}

/// Preferred detailed timing (first descriptor slot with a nonzero pixel clock)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedTiming {
    pub pixel_clock_khz: u32,
    pub h_active: u16,
    pub h_blank: u16,
    pub v_active: u16,
    pub v_blank: u16,
}

impl DetailedTiming {
    /// Vertical refresh rate; `None` when the totals are zero
    pub fn refresh_hz(&self) -> Option<f64> {
        let h_total = u64::from(self.h_active) + u64::from(self.h_blank);
        let v_total = u64::from(self.v_active) + u64::from(self.v_blank);
        if h_total == 0 || v_total == 0 {
            return None;
        }
        Some(f64::from(self.pixel_clock_khz) * 1000.0 / (h_total * v_total) as f64)
    }
}

/// Structured monitor attributes decoded from an EDID buffer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodedEdid {
    pub manufacturer_id: Option<ManufacturerId>,
    pub product_code: Option<u16>,
    pub serial_number: Option<u32>,
    pub manufacture_week: Option<u8>,
    pub manufacture_year: Option<u16>,
    pub version: Option<EdidVersion>,
    pub video_input: Option<VideoInput>,
    pub screen_size_cm: Option<(u8, u8)>,
    pub gamma: Option<f32>,
    pub features: Option<SupportedFeatures>,
    pub chromaticity: Option<Chromaticity>,
    pub model_name: Option<String>,
    pub serial_string: Option<String>,
    pub unspecified_text: Option<String>,
    pub preferred_timing: Option<DetailedTiming>,
    pub extension_count: Option<u8>,
    /// `None` when the buffer is shorter than a full block
    pub checksum_valid: Option<bool>,
}

impl DecodedEdid {
    /// Complete means: manufacturer code present, product code present and nonzero,
    /// and either a model name or a nonzero numeric serial.
    pub fn is_complete(&self) -> bool {
        self.manufacturer_id.is_some()
            && matches!(self.product_code, Some(code) if code != 0)
            && (self.model_name.is_some() || matches!(self.serial_number, Some(s) if s != 0))
    }

    /// Deduplication signature
    pub fn signature(&self) -> (Option<ManufacturerId>, Option<u16>) {
        (self.manufacturer_id, self.product_code)
    }

    /// Full vendor name from the PNP table, if known
    pub fn manufacturer_name(&self) -> Option<&'static str> {
        self.manufacturer_id
            .and_then(|id| super::pnp::manufacturer_name(id.as_str()))
    }
}

/// Why a buffer could not be decoded at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidEdid {
    TooShort { len: usize },
    BadHeader,
}

impl fmt::Display for InvalidEdid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { len } => write!(f, "EDID buffer too short ({} bytes)", len),
            Self::BadHeader => write!(f, "EDID header mismatch"),
        }
    }
}

/// Result of decoding a buffer
#[derive(Debug, Clone, PartialEq)]
pub enum EdidDecode {
    Decoded(DecodedEdid),
    Invalid(InvalidEdid),
}

impl EdidDecode {
    pub fn decoded(self) -> Option<DecodedEdid> {
        match self {
            Self::Decoded(edid) => Some(edid),
            Self::Invalid(_) => None,
        }
    }

    pub fn as_decoded(&self) -> Option<&DecodedEdid> {
        match self {
            Self::Decoded(edid) => Some(edid),
            Self::Invalid(_) => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Decoded(_))
    }
}
