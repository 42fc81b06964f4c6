//! Constants and configuration defaults for monid
//!
//! Centralizes EDID offsets, VCP codes, timing and heuristic thresholds.
//! Never use magic numbers in other files - add them here first.

use std::time::Duration;

/// EDID block layout (VESA E-EDID 1.3 / 1.4 base block)
pub mod edid {
    /// Size of the base EDID block
    pub const BLOCK_LEN: usize = 128;

    /// Fixed 8-byte header
    pub const HEADER: [u8; 8] = [0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00];

    /// Packed manufacturer ID (big-endian)
    pub const MANUFACTURER_ID: usize = 8;
    /// Product code (little-endian u16)
    pub const PRODUCT_CODE: usize = 10;
    /// Serial number (little-endian u32)
    pub const SERIAL_NUMBER: usize = 12;
    pub const MANUFACTURE_WEEK: usize = 16;
    pub const MANUFACTURE_YEAR: usize = 17;
    pub const VERSION: usize = 18;
    pub const REVISION: usize = 19;
    pub const VIDEO_INPUT: usize = 20;
    pub const SCREEN_WIDTH_CM: usize = 21;
    pub const SCREEN_HEIGHT_CM: usize = 22;
    pub const GAMMA: usize = 23;
    pub const FEATURES: usize = 24;

    /// Chromaticity low bits: red/green
    pub const CHROMA_LOW_RG: usize = 25;
    /// Chromaticity low bits: blue/white
    pub const CHROMA_LOW_BW: usize = 26;
    /// First chromaticity high byte (red x); red y, green x, ... follow
    pub const CHROMA_HIGH: usize = 27;
    /// Minimum buffer length covering the chromaticity block
    pub const CHROMA_MIN_LEN: usize = 35;

    /// The four 18-byte descriptor slots
    pub const DESCRIPTOR_SLOTS: [usize; 4] = [54, 72, 90, 108];
    pub const DESCRIPTOR_LEN: usize = 18;
    /// Offset of the text payload inside a display descriptor
    pub const DESCRIPTOR_TEXT: usize = 5;
    /// Maximum text payload length
    pub const DESCRIPTOR_TEXT_MAX: usize = 13;

    pub const EXTENSION_COUNT: usize = 126;

    /// Display descriptor tags
    pub mod tags {
        pub const SERIAL: u8 = 0xFF;
        pub const TEXT: u8 = 0xFE;
        pub const NAME: u8 = 0xFC;
    }

    /// Years are stored as an offset from this base
    pub const YEAR_BASE: u16 = 1990;
    pub const YEAR_MAX: u16 = 2100;
    pub const WEEK_MAX: u8 = 53;

    /// Chromaticity values are 10-bit fractions of this divisor
    pub const CHROMA_DIVISOR: f64 = 1024.0;
}

/// MCCS VCP feature codes
pub mod vcp {
    pub const BRIGHTNESS: u8 = 0x10;
    pub const CONTRAST: u8 = 0x12;
    pub const COLOR_PRESET: u8 = 0x14;
    pub const INPUT_SOURCE: u8 = 0x60;
    pub const AUDIO_VOLUME: u8 = 0x62;
    pub const DISPLAY_CONTROLLER_TYPE: u8 = 0xC8;
    pub const FIRMWARE_LEVEL: u8 = 0xC9;
    pub const POWER_MODE: u8 = 0xD6;
    pub const VCP_VERSION: u8 = 0xDF;

    /// Codes probed when the caller does not supply its own list
    pub const DEFAULT_PROBE_CODES: [u8; 9] = [
        BRIGHTNESS,
        CONTRAST,
        COLOR_PRESET,
        INPUT_SOURCE,
        AUDIO_VOLUME,
        DISPLAY_CONTROLLER_TYPE,
        FIRMWARE_LEVEL,
        POWER_MODE,
        VCP_VERSION,
    ];
}

/// Probe timing
pub mod timing {
    use super::Duration;

    /// Attempts per VCP code
    pub const PROBE_ATTEMPTS: u8 = 3;

    /// Fixed delay between attempts of the same code, in milliseconds
    pub const PROBE_RETRY_DELAY_MS: u64 = 50;

    /// Delay the host must leave between a DDC/CI write and the read of its reply
    pub const DDC_REPLY_DELAY: Duration = Duration::from_millis(40);
}

/// Registry layout and conflict resolution heuristics
pub mod registry {
    /// Key holding the EDID value under an instance key
    pub const DEVICE_PARAMETERS: &str = "Device Parameters";

    /// Value name of the raw EDID blob
    pub const EDID_VALUE: &str = "EDID";

    /// Candidates touched within this many days count as recent
    pub const RECENT_WINDOW_DAYS: u64 = 30;

    /// Largest configurable recency window (about a century)
    pub const MAX_RECENT_WINDOW_DAYS: u64 = 36_500;

    /// Descriptions the OS gives monitors it could not name
    pub const GENERIC_MONITOR_NAMES: &[&str] = &["Generic PnP Monitor", "Generic Non-PnP Monitor"];
}

/// DDC/CI protocol framing
pub mod ddc {
    /// 7-bit I2C address of the DDC/CI endpoint
    pub const I2C_ADDRESS: u16 = 0x37;
    /// 8-bit destination address, used to seed request checksums
    pub const DEST_ADDRESS: u8 = 0x6E;
    /// Host source address
    pub const SOURCE_ADDRESS: u8 = 0x51;
    /// Virtual source address, used to seed reply checksums
    pub const REPLY_SEED: u8 = 0x50;
    /// Get VCP Feature request opcode
    pub const GET_VCP_REQUEST: u8 = 0x01;
    /// Get VCP Feature reply opcode
    pub const GET_VCP_REPLY: u8 = 0x02;
    /// Length byte flag
    pub const LENGTH_FLAG: u8 = 0x80;
    /// Full Get VCP Feature reply length, including address and checksum
    pub const GET_VCP_REPLY_LEN: usize = 11;
    /// ioctl request to select the slave address on an i2c-dev handle
    pub const I2C_SLAVE: u64 = 0x0703;
}

/// Linux sysfs paths
pub mod paths {
    /// DRM connector class directory
    pub const DRM_CLASS: &str = "/sys/class/drm";

    /// i2c character device prefix
    pub const I2C_DEV_PREFIX: &str = "/dev/i2c-";

    /// Environment variable overriding the settings file location
    pub const CONFIG_ENV: &str = "MONID_CONFIG";

    /// Application directory name under the user config dir
    pub const APP_DIR: &str = "monid";

    /// Settings file name
    pub const SETTINGS_FILE: &str = "settings.json";
}
