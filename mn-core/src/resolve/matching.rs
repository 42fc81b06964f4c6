//! Description matching against decoded EDID fields

use serde::{Deserialize, Serialize};

use crate::edid::DecodedEdid;

/// EDID field a description matched, in matching priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchField {
    ModelName,
    ManufacturerName,
    ManufacturerCode,
}

impl MatchField {
    pub const PRIORITY: [MatchField; 3] = [
        MatchField::ModelName,
        MatchField::ManufacturerName,
        MatchField::ManufacturerCode,
    ];

    fn text(self, edid: &DecodedEdid) -> Option<String> {
        match self {
            Self::ModelName => edid.model_name.clone(),
            Self::ManufacturerName => edid.manufacturer_name().map(str::to_string),
            Self::ManufacturerCode => edid.manufacturer_id.map(|id| id.as_str().to_string()),
        }
    }
}

/// Whether the (lowercased) description contains the field, ignoring case
fn description_contains(description: &str, field: &str) -> bool {
    let field = field.trim().to_lowercase();
    !field.is_empty() && description.contains(&field)
}

/// Indices of `edids` whose fields match `description`.
///
/// Fields are tried in [`MatchField::PRIORITY`] order; the first field that
/// matches anything decides. `None` when nothing matches at any level.
pub fn match_description(
    edids: &[&DecodedEdid],
    description: &str,
) -> Option<(MatchField, Vec<usize>)> {
    let description = description.trim().to_lowercase();
    if description.is_empty() {
        return None;
    }

    MatchField::PRIORITY.into_iter().find_map(|field| {
        let matched: Vec<usize> = edids
            .iter()
            .enumerate()
            .filter(|(_, edid)| {
                field
                    .text(edid)
                    .is_some_and(|text| description_contains(&description, &text))
            })
            .map(|(i, _)| i)
            .collect();
        (!matched.is_empty()).then_some((field, matched))
    })
}
