//! Registry conflict resolution
//!
//! The registry keeps an EDID record for every monitor ever attached, so one
//! live monitor usually maps to several candidates. [`ConflictResolver`]
//! picks one with a fixed heuristic chain and reports why.

mod matching;
mod resolver;

pub use matching::{match_description, MatchField};
pub use resolver::ConflictResolver;

use serde::{Deserialize, Serialize};

use crate::registry::RegistryEdidEntry;

/// Which rule selected the winning candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolveReason {
    OnlyCandidate,
    DescriptionMatch(MatchField),
    Elimination,
    RecentWindow,
    MostRecentComplete,
    MostRecent,
}

/// Outcome of resolving one live monitor
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// `entry` is a copy of the winning candidate with `active` set
    Found {
        entry: RegistryEdidEntry,
        reason: ResolveReason,
    },
    /// Several generic monitors compete for these candidates
    Ambiguous { candidates: Vec<RegistryEdidEntry> },
    NotFound,
}

impl Resolution {
    pub fn entry(&self) -> Option<&RegistryEdidEntry> {
        match self {
            Self::Found { entry, .. } => Some(entry),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}
