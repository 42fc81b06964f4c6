//! The conflict resolution heuristic chain

use std::collections::{HashMap, HashSet};
use std::time::SystemTime;
use tracing::debug;

use super::{match_description, Resolution, ResolveReason};
use crate::display::LiveMonitor;
use crate::edid::DecodedEdid;
use crate::registry::RegistryEdidEntry;
use crate::settings::ResolverSettings;

/// A candidate with its EDID decoded once
struct Candidate<'a> {
    entry: &'a RegistryEdidEntry,
    edid: DecodedEdid,
}

/// Picks the registry record describing a live monitor
#[derive(Debug, Clone, Default)]
pub struct ConflictResolver {
    settings: ResolverSettings,
}

impl ConflictResolver {
    pub fn new(settings: ResolverSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Resolve `target` against `candidates`, using the current time for the recency window.
    ///
    /// `peers` are the other live monitors; their descriptions drive process
    /// of elimination when the target's own description is generic.
    pub fn resolve(
        &self,
        candidates: &[RegistryEdidEntry],
        target: &LiveMonitor,
        peers: &[LiveMonitor],
    ) -> Resolution {
        self.resolve_at(candidates, target, peers, SystemTime::now())
    }

    /// Same as [`resolve`](Self::resolve) with an explicit "now"
    pub fn resolve_at(
        &self,
        candidates: &[RegistryEdidEntry],
        target: &LiveMonitor,
        peers: &[LiveMonitor],
        now: SystemTime,
    ) -> Resolution {
        if candidates.is_empty() {
            debug!(monitor = %target.device_name, "No registry candidates");
            return Resolution::NotFound;
        }

        let pool = deduplicate(narrow_to_hardware_key(candidates, target));
        if let [only] = pool.as_slice() {
            return found(only, ResolveReason::OnlyCandidate, target);
        }

        let generic = &self.settings.generic_names;
        let pool = if target.has_generic_description(generic) {
            let others: Vec<&LiveMonitor> = peers
                .iter()
                .filter(|p| p.handle != target.handle)
                .collect();
            let remaining = eliminate(pool, &others, generic);

            match remaining {
                Elimination::Single(candidate) => {
                    return found(&candidate, ResolveReason::Elimination, target);
                }
                Elimination::Several(remaining) => {
                    let competing = others
                        .iter()
                        .filter(|p| p.has_generic_description(generic))
                        .filter(|p| shares_hardware(p, target))
                        .count();
                    if competing > 0 {
                        debug!(
                            monitor = %target.device_name,
                            candidates = remaining.len(),
                            "Several generic monitors compete for the same records"
                        );
                        return Resolution::Ambiguous {
                            candidates: remaining.iter().map(|c| c.entry.clone()).collect(),
                        };
                    }
                    remaining
                }
            }
        } else {
            let edids: Vec<&DecodedEdid> = pool.iter().map(|c| &c.edid).collect();
            match match_description(&edids, &target.description) {
                Some((field, matched)) => {
                    let keep: HashSet<usize> = matched.into_iter().collect();
                    let narrowed: Vec<Candidate> = pool
                        .into_iter()
                        .enumerate()
                        .filter(|(i, _)| keep.contains(i))
                        .map(|(_, c)| c)
                        .collect();
                    if let [only] = narrowed.as_slice() {
                        return found(only, ResolveReason::DescriptionMatch(field), target);
                    }
                    narrowed
                }
                None => pool,
            }
        };

        let window = self.settings.recent_window();
        let recent = pool.iter().filter(|c| c.entry.recency.is_within(now, window));
        if let Some(best) = most_recent(recent) {
            return found(best, ResolveReason::RecentWindow, target);
        }

        let complete = pool.iter().filter(|c| c.edid.is_complete());
        if let Some(best) = most_recent(complete) {
            return found(best, ResolveReason::MostRecentComplete, target);
        }

        match most_recent(pool.iter()) {
            Some(best) => found(best, ResolveReason::MostRecent, target),
            None => Resolution::NotFound,
        }
    }
}

enum Elimination<'a> {
    Single(Candidate<'a>),
    Several(Vec<Candidate<'a>>),
}

fn found(candidate: &Candidate, reason: ResolveReason, target: &LiveMonitor) -> Resolution {
    debug!(
        monitor = %target.device_name,
        path = %candidate.entry.path,
        ?reason,
        "Resolved registry record"
    );
    Resolution::Found {
        entry: candidate.entry.activated(),
        reason,
    }
}

/// Keep only the target's hardware key, when it reports one that exists among the candidates
fn narrow_to_hardware_key<'a>(
    candidates: &'a [RegistryEdidEntry],
    target: &LiveMonitor,
) -> Vec<Candidate<'a>> {
    let key = target
        .hardware_key
        .as_deref()
        .filter(|key| candidates.iter().any(|c| c.hardware_key.eq_ignore_ascii_case(key)));

    candidates
        .iter()
        .filter(|c| key.map_or(true, |key| c.hardware_key.eq_ignore_ascii_case(key)))
        .map(|entry| Candidate {
            entry,
            edid: entry.decode(),
        })
        .collect()
}

/// One candidate per `(manufacturer, product)` signature, the most recent one.
/// Enumeration order is preserved and the earlier entry wins a tie.
fn deduplicate(pool: Vec<Candidate>) -> Vec<Candidate> {
    let mut best: HashMap<_, usize> = HashMap::new();
    for (i, candidate) in pool.iter().enumerate() {
        let signature = candidate.edid.signature();
        match best.get(&signature) {
            Some(&j) if pool[j].entry.recency >= candidate.entry.recency => {}
            _ => {
                best.insert(signature, i);
            }
        }
    }

    let keep: HashSet<usize> = best.into_values().collect();
    pool.into_iter()
        .enumerate()
        .filter(|(i, _)| keep.contains(i))
        .map(|(_, c)| c)
        .collect()
}

/// Drop candidates claimed by another monitor's informative description
fn eliminate<'a>(
    pool: Vec<Candidate<'a>>,
    others: &[&LiveMonitor],
    generic: &[String],
) -> Elimination<'a> {
    let edids: Vec<&DecodedEdid> = pool.iter().map(|c| &c.edid).collect();
    let claimed: HashSet<usize> = others
        .iter()
        .filter(|p| !p.has_generic_description(generic))
        .filter_map(|p| match_description(&edids, &p.description))
        .flat_map(|(_, matched)| matched)
        .collect();

    if claimed.is_empty() || claimed.len() == pool.len() {
        return Elimination::Several(pool);
    }

    let mut remaining: Vec<Candidate> = pool
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !claimed.contains(i))
        .map(|(_, c)| c)
        .collect();

    if remaining.len() == 1 {
        Elimination::Single(remaining.remove(0))
    } else {
        Elimination::Several(remaining)
    }
}

/// Whether two monitors could map to the same records
fn shares_hardware(a: &LiveMonitor, b: &LiveMonitor) -> bool {
    match (&a.hardware_key, &b.hardware_key) {
        (Some(x), Some(y)) => x.eq_ignore_ascii_case(y),
        _ => true,
    }
}

/// Highest recency; the first candidate wins a tie
fn most_recent<'c, 'a: 'c>(
    pool: impl IntoIterator<Item = &'c Candidate<'a>>,
) -> Option<&'c Candidate<'a>> {
    pool.into_iter().fold(None, |best, candidate| match best {
        Some(b) if b.entry.recency >= candidate.entry.recency => Some(b),
        _ => Some(candidate),
    })
}
