//! EDID decoding
//!
//! Turns the 128-byte EDID base block into [`DecodedEdid`]. Decoding is pure
//! and deterministic; a buffer is rejected only when it is shorter than the
//! header or the header magic does not match.

mod decoder;
pub mod pnp;
mod types;

pub use decoder::{
    chroma_value, decode, decode_chromaticity, decode_descriptor_text, decode_features,
    decode_gamma, decode_manufacture_week, decode_manufacture_year, decode_manufacturer_id,
    decode_preferred_timing, decode_product_code, decode_screen_size, decode_serial_number,
    decode_text_payload, decode_version, decode_video_input, verify_checksum,
};
pub use pnp::manufacturer_name;
pub use types::{
    has_valid_header, ChromaPoint, Chromaticity, DecodedEdid, DetailedTiming, DisplayType,
    EdidDecode, EdidVersion, InvalidEdid, ManufacturerId, RawEdidBlock, SupportedFeatures,
    VideoInput,
};
