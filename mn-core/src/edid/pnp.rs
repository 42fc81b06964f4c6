//! PNP manufacturer ID to vendor name lookup
//!
//! Covers the display vendors seen in practice. Unknown codes return `None`
//! and callers fall back to the three-letter code.

const PNP_VENDORS: &[(&str, &str)] = &[
    ("AAC", "AcerView"),
    ("ACI", "ASUS"),
    ("ACR", "Acer"),
    ("AOC", "AOC"),
    ("AUO", "AU Optronics"),
    ("AUS", "ASUS"),
    ("BNQ", "BenQ"),
    ("BOE", "BOE"),
    ("CMN", "Chimei Innolux"),
    ("CMO", "Chi Mei Optoelectronics"),
    ("DEL", "Dell"),
    ("EIZ", "EIZO"),
    ("ENC", "EIZO"),
    ("FUS", "Fujitsu Siemens"),
    ("GBT", "Gigabyte"),
    ("GSM", "LG Electronics"),
    ("HKC", "HKC"),
    ("HPN", "HP"),
    ("HWP", "HP"),
    ("HSD", "HannStar"),
    ("HUN", "Huion"),
    ("IVM", "Iiyama"),
    ("LEN", "Lenovo"),
    ("LGD", "LG Display"),
    ("LPL", "LG Philips"),
    ("MEI", "Panasonic"),
    ("MSI", "MSI"),
    ("MST", "MStar"),
    ("NEC", "NEC"),
    ("PHL", "Philips"),
    ("SAM", "Samsung"),
    ("SDC", "Samsung Display"),
    ("SEC", "Seiko Epson"),
    ("SHP", "Sharp"),
    ("SNY", "Sony"),
    ("TOS", "Toshiba"),
    ("TSB", "Toshiba"),
    ("VIZ", "Vizio"),
    ("VSC", "ViewSonic"),
    ("XMI", "Xiaomi"),
];

/// Full vendor name for a three-letter PNP code
pub fn manufacturer_name(code: &str) -> Option<&'static str> {
    PNP_VENDORS
        .iter()
        .find(|(pnp, _)| pnp.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
}
