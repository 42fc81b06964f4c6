//! Display name resolution
//!
//! Priority: text the monitor reported over DDC/CI, then the EDID
//! manufacturer and model, then the OS description, then `Monitor N`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::display::is_generic_name;
use crate::edid::DecodedEdid;
use crate::probe::CapabilityReport;

/// Where a display name came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NameSource {
    FromLiveProbe,
    FromRegistry,
    FromOsFallback,
}

impl fmt::Display for NameSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::FromLiveProbe => "live probe",
            Self::FromRegistry => "registry",
            Self::FromOsFallback => "os",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedName {
    pub name: String,
    pub provenance: NameSource,
}

impl ResolvedName {
    fn new(name: impl Into<String>, provenance: NameSource) -> Self {
        Self {
            name: name.into(),
            provenance,
        }
    }
}

/// Pick a display name for the monitor at position `index` (zero-based)
pub fn resolve_name(
    capability: Option<&CapabilityReport>,
    edid: Option<&DecodedEdid>,
    os_name: &str,
    index: usize,
    generic_names: &[String],
) -> ResolvedName {
    if let Some(label) = capability.and_then(|c| c.vendor.label()) {
        return ResolvedName::new(label, NameSource::FromLiveProbe);
    }

    if let Some(name) = edid.and_then(edid_display_name) {
        return ResolvedName::new(name, NameSource::FromRegistry);
    }

    if !is_generic_name(os_name, generic_names) {
        return ResolvedName::new(os_name.trim(), NameSource::FromOsFallback);
    }

    ResolvedName::new(format!("Monitor {}", index + 1), NameSource::FromOsFallback)
}

/// `<manufacturer> <model>` from decoded EDID fields.
///
/// The full vendor name replaces the code when known. A model that already
/// starts with the vendor is used as is. Without a model the product code
/// stands in.
pub fn edid_display_name(edid: &DecodedEdid) -> Option<String> {
    let code = edid.manufacturer_id.map(|id| id.as_str().to_string());
    let vendor = edid
        .manufacturer_name()
        .map(str::to_string)
        .or_else(|| code.clone());

    let model = edid
        .model_name
        .clone()
        .or_else(|| edid.product_code.map(|p| format!("{:04X}", p)));

    match (vendor, model) {
        (Some(vendor), Some(model)) => {
            let lower = model.to_lowercase();
            let prefixed = lower.starts_with(&vendor.to_lowercase())
                || code.is_some_and(|c| lower.starts_with(&c.to_lowercase()));
            Some(if prefixed {
                model
            } else {
                format!("{} {}", vendor, model)
            })
        }
        (Some(vendor), None) => Some(vendor),
        (None, Some(model)) => edid.model_name.as_ref().map(|_| model),
        (None, None) => None,
    }
}
