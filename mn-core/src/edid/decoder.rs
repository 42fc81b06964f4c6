//! EDID base block decoder
//!
//! Pure functions over byte slices. The only hard failure is a buffer that
//! cannot be an EDID at all (shorter than the header, or wrong header); every
//! other field is decoded independently and comes back `None` when the buffer
//! is too short for it or the stored value means "unknown".

use tracing::trace;

use super::types::*;
use crate::constants::edid::{self as layout, tags};

// ============================================================================
// Whole-block decoding
// ============================================================================

/// Decode a buffer into structured monitor attributes
pub fn decode(bytes: &[u8]) -> EdidDecode {
    if bytes.len() < layout::HEADER.len() {
        return EdidDecode::Invalid(InvalidEdid::TooShort { len: bytes.len() });
    }
    if !has_valid_header(bytes) {
        return EdidDecode::Invalid(InvalidEdid::BadHeader);
    }

    let edid = DecodedEdid {
        manufacturer_id: decode_manufacturer_id(bytes),
        product_code: decode_product_code(bytes),
        serial_number: decode_serial_number(bytes),
        manufacture_week: decode_manufacture_week(bytes),
        manufacture_year: decode_manufacture_year(bytes),
        version: decode_version(bytes),
        video_input: decode_video_input(bytes),
        screen_size_cm: decode_screen_size(bytes),
        gamma: decode_gamma(bytes),
        features: decode_features(bytes),
        chromaticity: decode_chromaticity(bytes),
        model_name: decode_descriptor_text(bytes, tags::NAME),
        serial_string: decode_descriptor_text(bytes, tags::SERIAL),
        unspecified_text: decode_descriptor_text(bytes, tags::TEXT),
        preferred_timing: decode_preferred_timing(bytes),
        extension_count: bytes.get(layout::EXTENSION_COUNT).copied(),
        checksum_valid: verify_checksum(bytes),
    };

    trace!(
        manufacturer = ?edid.manufacturer_id,
        product = ?edid.product_code,
        model = ?edid.model_name,
        "Decoded EDID"
    );

    EdidDecode::Decoded(edid)
}

// ============================================================================
// Vendor / product section (bytes 8-17)
// ============================================================================

/// Three-letter manufacturer code from the packed big-endian field at bytes 8..9
pub fn decode_manufacturer_id(bytes: &[u8]) -> Option<ManufacturerId> {
    let packed = read_u16_be(bytes, layout::MANUFACTURER_ID)?;
    ManufacturerId::from_packed(packed)
}

pub fn decode_product_code(bytes: &[u8]) -> Option<u16> {
    read_u16_le(bytes, layout::PRODUCT_CODE)
}

pub fn decode_serial_number(bytes: &[u8]) -> Option<u32> {
    let raw = bytes.get(layout::SERIAL_NUMBER..layout::SERIAL_NUMBER + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

/// Week of manufacture, 1..=53. Zero and 0xFF mean unknown.
pub fn decode_manufacture_week(bytes: &[u8]) -> Option<u8> {
    let week = *bytes.get(layout::MANUFACTURE_WEEK)?;
    (1..=layout::WEEK_MAX).contains(&week).then_some(week)
}

pub fn decode_manufacture_year(bytes: &[u8]) -> Option<u16> {
    let year = layout::YEAR_BASE + u16::from(*bytes.get(layout::MANUFACTURE_YEAR)?);
    (year <= layout::YEAR_MAX).then_some(year)
}

pub fn decode_version(bytes: &[u8]) -> Option<EdidVersion> {
    Some(EdidVersion {
        version: *bytes.get(layout::VERSION)?,
        revision: *bytes.get(layout::REVISION)?,
    })
}

// ============================================================================
// Basic display parameters (bytes 20-24)
// ============================================================================

pub fn decode_video_input(bytes: &[u8]) -> Option<VideoInput> {
    let raw = *bytes.get(layout::VIDEO_INPUT)?;
    Some(VideoInput {
        digital: raw & 0x80 != 0,
        raw,
    })
}

/// Physical size in centimetres. Zero in either axis means undefined (or an aspect ratio).
pub fn decode_screen_size(bytes: &[u8]) -> Option<(u8, u8)> {
    let width = *bytes.get(layout::SCREEN_WIDTH_CM)?;
    let height = *bytes.get(layout::SCREEN_HEIGHT_CM)?;
    (width != 0 && height != 0).then_some((width, height))
}

/// Display gamma; 0xFF means it is defined in an extension block
pub fn decode_gamma(bytes: &[u8]) -> Option<f32> {
    let raw = *bytes.get(layout::GAMMA)?;
    (raw != 0xFF).then(|| (f32::from(raw) + 100.0) / 100.0)
}

pub fn decode_features(bytes: &[u8]) -> Option<SupportedFeatures> {
    let raw = *bytes.get(layout::FEATURES)?;
    Some(SupportedFeatures {
        dpms_standby: raw & 0x80 != 0,
        dpms_suspend: raw & 0x40 != 0,
        dpms_active_off: raw & 0x20 != 0,
        display_type: DisplayType::from_bits(raw >> 3),
        default_color_space: raw & 0x04 != 0,
        preferred_timing: raw & 0x02 != 0,
        continuous_frequency: raw & 0x01 != 0,
        raw,
    })
}

// ============================================================================
// Chromaticity (bytes 25-34)
// ============================================================================

/// Decode the four chromaticity points.
///
/// Byte 25 carries the two low bits of red x (7-6), red y (5-4), green x (3-2)
/// and green y (1-0); byte 26 does the same for blue and white. Bytes 27..=34
/// hold the high eight bits in the order red x, red y, green x, green y,
/// blue x, blue y, white x, white y.
pub fn decode_chromaticity(bytes: &[u8]) -> Option<Chromaticity> {
    if bytes.len() < layout::CHROMA_MIN_LEN {
        return None;
    }
    let low_rg = bytes[layout::CHROMA_LOW_RG];
    let low_bw = bytes[layout::CHROMA_LOW_BW];
    let high = &bytes[layout::CHROMA_HIGH..layout::CHROMA_HIGH + 8];

    Some(Chromaticity {
        red: ChromaPoint {
            x_raw: chroma_value(high[0], low_rg, 6),
            y_raw: chroma_value(high[1], low_rg, 4),
        },
        green: ChromaPoint {
            x_raw: chroma_value(high[2], low_rg, 2),
            y_raw: chroma_value(high[3], low_rg, 0),
        },
        blue: ChromaPoint {
            x_raw: chroma_value(high[4], low_bw, 6),
            y_raw: chroma_value(high[5], low_bw, 4),
        },
        white: ChromaPoint {
            x_raw: chroma_value(high[6], low_bw, 2),
            y_raw: chroma_value(high[7], low_bw, 0),
        },
    })
}

/// Combine a high byte with the 2-bit fragment at `shift` of a low-bits byte
pub fn chroma_value(high: u8, low_bits: u8, shift: u8) -> u16 {
    (u16::from(high) << 2) | u16::from((low_bits >> shift) & 0b11)
}

// ============================================================================
// Descriptors (bytes 54-125)
// ============================================================================

/// Find the first display descriptor with `tag` and decode its text payload
pub fn decode_descriptor_text(bytes: &[u8], tag: u8) -> Option<String> {
    layout::DESCRIPTOR_SLOTS.iter().find_map(|&offset| {
        let slot = bytes.get(offset..offset + layout::DESCRIPTOR_LEN)?;
        if slot[..4] != [0x00, 0x00, 0x00, tag] {
            return None;
        }
        decode_text_payload(&slot[layout::DESCRIPTOR_TEXT..])
    })
}

/// Printable ASCII up to a newline/NUL or 13 bytes, trimmed. Empty is `None`.
pub fn decode_text_payload(payload: &[u8]) -> Option<String> {
    let text: String = payload
        .iter()
        .take(layout::DESCRIPTOR_TEXT_MAX)
        .take_while(|&&b| b != b'\n' && b != 0x00)
        .filter(|&&b| (0x20..=0x7E).contains(&b))
        .map(|&b| b as char)
        .collect();

    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Preferred timing from the first slot when it holds a detailed timing
pub fn decode_preferred_timing(bytes: &[u8]) -> Option<DetailedTiming> {
    let offset = layout::DESCRIPTOR_SLOTS[0];
    let d = bytes.get(offset..offset + layout::DESCRIPTOR_LEN)?;
    let clock = u16::from_le_bytes([d[0], d[1]]);
    if clock == 0 {
        return None;
    }
    Some(DetailedTiming {
        pixel_clock_khz: u32::from(clock) * 10,
        h_active: u16::from(d[2]) | (u16::from(d[4] & 0xF0) << 4),
        h_blank: u16::from(d[3]) | (u16::from(d[4] & 0x0F) << 8),
        v_active: u16::from(d[5]) | (u16::from(d[7] & 0xF0) << 4),
        v_blank: u16::from(d[6]) | (u16::from(d[7] & 0x0F) << 8),
    })
}

/// The 128 bytes of the base block must sum to zero mod 256
pub fn verify_checksum(bytes: &[u8]) -> Option<bool> {
    let block = bytes.get(..layout::BLOCK_LEN)?;
    Some(block.iter().fold(0u8, |acc, &b| acc.wrapping_add(b)) == 0)
}

// ============================================================================
// Helpers
// ============================================================================

fn read_u16_be(bytes: &[u8], offset: usize) -> Option<u16> {
    let raw = bytes.get(offset..offset + 2)?;
    Some(u16::from_be_bytes([raw[0], raw[1]]))
}

fn read_u16_le(bytes: &[u8], offset: usize) -> Option<u16> {
    let raw = bytes.get(offset..offset + 2)?;
    Some(u16::from_le_bytes([raw[0], raw[1]]))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{sample_edid, EdidBuilder};

    #[test]
    fn test_short_and_bad_header_are_invalid() {
        for len in 0..8 {
            let buf = vec![0u8; len];
            assert_eq!(
                decode(&buf),
                EdidDecode::Invalid(InvalidEdid::TooShort { len })
            );
        }

        let mut buf = sample_edid();
        buf[3] = 0x00;
        assert_eq!(decode(&buf), EdidDecode::Invalid(InvalidEdid::BadHeader));
    }

    #[test]
    fn test_header_only_buffer_decodes_with_absent_fields() {
        let edid = decode(&layout::HEADER).decoded().unwrap();
        assert_eq!(edid, DecodedEdid::default());
    }

    #[test]
    fn test_35_byte_buffer_has_all_basic_fields() {
        let full = sample_edid();
        let edid = decode(&full[..35]).decoded().unwrap();

        assert!(edid.manufacturer_id.is_some());
        assert!(edid.product_code.is_some());
        assert!(edid.serial_number.is_some());
        assert!(edid.manufacture_week.is_some());
        assert!(edid.manufacture_year.is_some());
        assert!(edid.version.is_some());
        assert!(edid.video_input.is_some());
        assert!(edid.features.is_some());
        assert!(edid.chromaticity.is_some());

        // Descriptors and checksum need the full block
        assert_eq!(edid.model_name, None);
        assert_eq!(edid.checksum_valid, None);
    }

    #[test]
    fn test_chromaticity_needs_35_bytes() {
        let full = sample_edid();
        assert!(decode_chromaticity(&full[..34]).is_none());
        assert!(decode_chromaticity(&full[..35]).is_some());
    }

    #[test]
    fn test_manufacturer_round_trip_all_codes() {
        for a in b'A'..=b'Z' {
            for b in b'A'..=b'Z' {
                for c in b'A'..=b'Z' {
                    let code = String::from_utf8(vec![a, b, c]).unwrap();
                    let packed = ManufacturerId::parse(&code).unwrap().packed();
                    let mut buf = layout::HEADER.to_vec();
                    buf.extend_from_slice(&packed.to_be_bytes());
                    let decoded = decode_manufacturer_id(&buf).unwrap();
                    assert_eq!(decoded.as_str(), code);
                }
            }
        }
    }

    #[test]
    fn test_manufacturer_known_value() {
        // "DEL" packs to 0x10AC
        let mut buf = layout::HEADER.to_vec();
        buf.extend_from_slice(&[0x10, 0xAC]);
        assert_eq!(decode_manufacturer_id(&buf).unwrap().as_str(), "DEL");
    }

    #[test]
    fn test_manufacturer_out_of_range_letters_are_absent() {
        let mut buf = layout::HEADER.to_vec();
        buf.extend_from_slice(&[0x00, 0x00]);
        assert_eq!(decode_manufacturer_id(&buf), None);

        // 5-bit value 27 in the last letter
        buf[9] = 0x1B;
        assert_eq!(decode_manufacturer_id(&buf), None);
    }

    #[test]
    fn test_product_and_serial_little_endian() {
        let buf = EdidBuilder::new()
            .product_code(0xA0B1)
            .serial_number(0x0102_0304)
            .build();
        assert_eq!(decode_product_code(&buf), Some(0xA0B1));
        assert_eq!(decode_serial_number(&buf), Some(0x0102_0304));
        assert_eq!(&buf[10..16], &[0xB1, 0xA0, 0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_week_and_year() {
        let mut buf = sample_edid();
        buf[layout::MANUFACTURE_WEEK] = 0;
        assert_eq!(decode_manufacture_week(&buf), None);
        buf[layout::MANUFACTURE_WEEK] = 0xFF;
        assert_eq!(decode_manufacture_week(&buf), None);
        buf[layout::MANUFACTURE_WEEK] = 54;
        assert_eq!(decode_manufacture_week(&buf), None);
        buf[layout::MANUFACTURE_WEEK] = 53;
        assert_eq!(decode_manufacture_week(&buf), Some(53));

        buf[layout::MANUFACTURE_YEAR] = 34;
        assert_eq!(decode_manufacture_year(&buf), Some(2024));
        buf[layout::MANUFACTURE_YEAR] = 0;
        assert_eq!(decode_manufacture_year(&buf), Some(1990));
        buf[layout::MANUFACTURE_YEAR] = 110;
        assert_eq!(decode_manufacture_year(&buf), Some(2100));
        buf[layout::MANUFACTURE_YEAR] = 111;
        assert_eq!(decode_manufacture_year(&buf), None);
    }

    #[test]
    fn test_chromaticity_red_x_bit_exact() {
        let mut buf = sample_edid();
        buf[layout::CHROMA_LOW_RG] = 0b10_01_00_11;
        buf[27..31].copy_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD]);

        let chroma = decode_chromaticity(&buf).unwrap();
        assert_eq!(chroma.red.x_raw, (0xAA << 2) | 0b10);
        assert_eq!(chroma.red.y_raw, (0xBB << 2) | 0b01);
        assert_eq!(chroma.green.x_raw, (0xCC << 2) | 0b00);
        assert_eq!(chroma.green.y_raw, (0xDD << 2) | 0b11);
    }

    #[test]
    fn test_chromaticity_blue_white_layout() {
        let mut buf = sample_edid();
        buf[layout::CHROMA_LOW_BW] = 0b01_10_11_00;
        buf[31..35].copy_from_slice(&[0x26, 0x0F, 0x50, 0x54]);

        let chroma = decode_chromaticity(&buf).unwrap();
        assert_eq!(chroma.blue.x_raw, (0x26 << 2) | 0b01);
        assert_eq!(chroma.blue.y_raw, (0x0F << 2) | 0b10);
        assert_eq!(chroma.white.x_raw, (0x50 << 2) | 0b11);
        assert_eq!(chroma.white.y_raw, 0x54 << 2);

        // 0x140 / 1024 = 0.3125 (D65 white x is ~0.3127)
        assert!((chroma.white.x() - 323.0 / 1024.0).abs() < 1e-12);
        assert!(chroma.white.x() < 1.0);
    }

    #[test]
    fn test_chroma_value_max_is_below_one() {
        let v = chroma_value(0xFF, 0xFF, 6);
        assert_eq!(v, 1023);
        let point = ChromaPoint { x_raw: v, y_raw: 0 };
        assert!(point.x() < 1.0);
        assert_eq!(point.y(), 0.0);
    }

    #[test]
    fn test_features_bits() {
        let mut buf = sample_edid();
        buf[layout::FEATURES] = 0b1010_1101;
        let features = decode_features(&buf).unwrap();
        assert!(features.dpms_standby);
        assert!(!features.dpms_suspend);
        assert!(features.dpms_active_off);
        assert_eq!(features.display_type, DisplayType::Rgb);
        assert!(features.default_color_space);
        assert!(!features.preferred_timing);
        assert!(features.continuous_frequency);

        buf[layout::FEATURES] = 0b0001_1000;
        assert_eq!(decode_features(&buf).unwrap().display_type, DisplayType::Undefined);
        buf[layout::FEATURES] = 0b0001_0000;
        assert_eq!(decode_features(&buf).unwrap().display_type, DisplayType::NonRgb);
        buf[layout::FEATURES] = 0;
        assert_eq!(decode_features(&buf).unwrap().display_type, DisplayType::Monochrome);
    }

    #[test]
    fn test_video_input_digital_flag() {
        let mut buf = sample_edid();
        buf[layout::VIDEO_INPUT] = 0xA5;
        assert_eq!(
            decode_video_input(&buf),
            Some(VideoInput { digital: true, raw: 0xA5 })
        );
        buf[layout::VIDEO_INPUT] = 0x0E;
        assert!(!decode_video_input(&buf).unwrap().digital);
    }

    #[test]
    fn test_descriptor_strings() {
        let buf = EdidBuilder::new()
            .name_descriptor(1, b"DELL U2720Q\n  ")
            .serial_descriptor(2, b"ABC123")
            .build();
        let edid = decode(&buf).decoded().unwrap();
        assert_eq!(edid.model_name.as_deref(), Some("DELL U2720Q"));
        assert_eq!(edid.serial_string.as_deref(), Some("ABC123"));
        assert_eq!(edid.unspecified_text, None);
    }

    #[test]
    fn test_blank_descriptor_is_absent() {
        let buf = EdidBuilder::new().name_descriptor(3, b"   \n").build();
        assert_eq!(decode_descriptor_text(&buf, tags::NAME), None);
    }

    #[test]
    fn test_text_payload_rules() {
        assert_eq!(decode_text_payload(b"ABCDEFGHIJKLMNOP").as_deref(), Some("ABCDEFGHIJKLM"));
        assert_eq!(decode_text_payload(b"AB\0CD").as_deref(), Some("AB"));
        assert_eq!(decode_text_payload(b"A\x01B\n").as_deref(), Some("AB"));
        assert_eq!(decode_text_payload(b"\n"), None);
        assert_eq!(decode_text_payload(b""), None);
    }

    #[test]
    fn test_first_matching_slot_wins() {
        let buf = EdidBuilder::new()
            .name_descriptor(1, b"FIRST")
            .name_descriptor(3, b"SECOND")
            .build();
        assert_eq!(decode_descriptor_text(&buf, tags::NAME).as_deref(), Some("FIRST"));
    }

    #[test]
    fn test_preferred_timing_1080p60() {
        let buf = sample_edid();
        let timing = decode_preferred_timing(&buf).unwrap();
        assert_eq!(timing.pixel_clock_khz, 148_500);
        assert_eq!(timing.h_active, 1920);
        assert_eq!(timing.v_active, 1080);
        assert_eq!(timing.h_blank, 280);
        assert_eq!(timing.v_blank, 45);
        let refresh = timing.refresh_hz().unwrap();
        assert!((refresh - 60.0).abs() < 0.01);
    }

    #[test]
    fn test_checksum() {
        let mut buf = sample_edid();
        assert_eq!(verify_checksum(&buf), Some(true));
        buf[100] = buf[100].wrapping_add(1);
        assert_eq!(verify_checksum(&buf), Some(false));
        assert_eq!(verify_checksum(&buf[..64]), None);
    }

    #[test]
    fn test_gamma_and_screen_size() {
        let mut buf = sample_edid();
        buf[layout::GAMMA] = 120;
        assert!((decode_gamma(&buf).unwrap() - 2.2).abs() < 1e-6);
        buf[layout::GAMMA] = 0xFF;
        assert_eq!(decode_gamma(&buf), None);

        buf[layout::SCREEN_WIDTH_CM] = 60;
        buf[layout::SCREEN_HEIGHT_CM] = 34;
        assert_eq!(decode_screen_size(&buf), Some((60, 34)));
        buf[layout::SCREEN_HEIGHT_CM] = 0;
        assert_eq!(decode_screen_size(&buf), None);
    }

    #[test]
    fn test_decode_is_idempotent() {
        let buf = sample_edid();
        let first = decode(&buf);
        let second = decode(&buf);
        assert_eq!(first, second);
    }

    #[test]
    fn test_completeness() {
        let complete = decode(&sample_edid()).decoded().unwrap();
        assert!(complete.is_complete());

        let no_model = decode(&EdidBuilder::new().product_code(0x1234).serial_number(0).build())
            .decoded()
            .unwrap();
        assert!(!no_model.is_complete());

        let serial_only = decode(&EdidBuilder::new().product_code(0x1234).serial_number(7).build())
            .decoded()
            .unwrap();
        assert!(serial_only.is_complete());

        let zero_product = decode(&EdidBuilder::new().product_code(0).name_descriptor(1, b"X").build())
            .decoded()
            .unwrap();
        assert!(!zero_product.is_complete());
    }
}
