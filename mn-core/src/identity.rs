//! Monitor identity aggregation and orchestration
//!
//! [`IdentityEngine`] ties the pieces together: enumerate live monitors,
//! resolve each against the registry, probe its control channel and pick a
//! display name.

use serde::{Deserialize, Serialize};
use std::thread;
use tracing::{debug, info};

use crate::display::{DisplayAccess, LiveMonitor};
use crate::edid::{Chromaticity, DecodedEdid, EdidVersion};
use crate::error::{MonitorError, Result};
use crate::naming::{resolve_name, NameSource};
use crate::probe::{CapabilityProber, CapabilityReport};
use crate::registry::{RegistryEdidEntry, RegistryEdidRepository, RegistryStore};
use crate::resolve::{ConflictResolver, Resolution, ResolveReason};
use crate::settings::{ConfiguredStore, EngineSettings};

/// How the registry lookup for a monitor ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdidLookup {
    Found { path: String, reason: ResolveReason },
    NotFound,
    Ambiguous { paths: Vec<String> },
}

impl From<&Resolution> for EdidLookup {
    fn from(resolution: &Resolution) -> Self {
        match resolution {
            Resolution::Found { entry, reason } => Self::Found {
                path: entry.path.clone(),
                reason: *reason,
            },
            Resolution::Ambiguous { candidates } => Self::Ambiguous {
                paths: candidates.iter().map(|c| c.path.clone()).collect(),
            },
            Resolution::NotFound => Self::NotFound,
        }
    }
}

/// Everything known about one monitor, ready for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorIdentity {
    pub device_name: String,
    pub description: String,
    pub edid_lookup: EdidLookup,
    pub manufacturer_code: Option<String>,
    pub manufacturer_name: Option<String>,
    pub model_name: Option<String>,
    pub serial_string: Option<String>,
    pub serial_number: Option<u32>,
    pub product_code: Option<u16>,
    pub version: Option<EdidVersion>,
    pub manufacture_week: Option<u8>,
    pub manufacture_year: Option<u16>,
    pub chromaticity: Option<Chromaticity>,
    /// SHA-256 of the winning EDID block
    pub edid_hash: Option<String>,
    pub name: String,
    pub provenance: NameSource,
}

impl MonitorIdentity {
    pub fn build(
        monitor: &LiveMonitor,
        resolution: &Resolution,
        capability: Option<&CapabilityReport>,
        index: usize,
        generic_names: &[String],
    ) -> Self {
        let entry: Option<&RegistryEdidEntry> = resolution.entry();
        let edid: Option<DecodedEdid> = entry.map(RegistryEdidEntry::decode);
        let resolved = resolve_name(
            capability,
            edid.as_ref(),
            &monitor.description,
            index,
            generic_names,
        );
        let edid = edid.unwrap_or_default();

        Self {
            device_name: monitor.device_name.clone(),
            description: monitor.description.clone(),
            edid_lookup: resolution.into(),
            manufacturer_code: edid.manufacturer_id.map(|id| id.to_string()),
            manufacturer_name: edid.manufacturer_name().map(str::to_string),
            model_name: edid.model_name,
            serial_string: edid.serial_string,
            serial_number: edid.serial_number,
            product_code: edid.product_code,
            version: edid.version,
            manufacture_week: edid.manufacture_week,
            manufacture_year: edid.manufacture_year,
            chromaticity: edid.chromaticity,
            edid_hash: entry.map(|e| e.edid.hash_hex()),
            name: resolved.name,
            provenance: resolved.provenance,
        }
    }
}

/// Identity plus the capability report it was built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorRecord {
    pub identity: MonitorIdentity,
    pub capability: CapabilityReport,
}

/// Resolves identities for all live monitors
pub struct IdentityEngine<D, S> {
    access: D,
    repository: RegistryEdidRepository<S>,
    resolver: ConflictResolver,
    prober: CapabilityProber,
    settings: EngineSettings,
}

impl<D: DisplayAccess, S: RegistryStore> IdentityEngine<D, S> {
    pub fn new(access: D, store: S, settings: EngineSettings) -> Self {
        Self {
            access,
            repository: RegistryEdidRepository::new(store),
            resolver: ConflictResolver::new(settings.resolver.clone()),
            prober: CapabilityProber::new(settings.probe.clone()),
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn access(&self) -> &D {
        &self.access
    }

    pub fn repository(&self) -> &RegistryEdidRepository<S> {
        &self.repository
    }

    /// Resolve one monitor. `peers` are all live monitors (the target may be among them).
    pub fn identify(
        &self,
        monitor: &LiveMonitor,
        peers: &[LiveMonitor],
        entries: &[RegistryEdidEntry],
        index: usize,
    ) -> MonitorRecord {
        let capability = self.prober.probe_default(&self.access, &monitor.handle);
        let resolution = self.resolver.resolve(entries, monitor, peers);
        let identity = MonitorIdentity::build(
            monitor,
            &resolution,
            Some(&capability),
            index,
            &self.settings.resolver.generic_names,
        );

        debug!(
            monitor = %monitor.device_name,
            name = %identity.name,
            provenance = %identity.provenance,
            responsiveness = ?capability.responsiveness,
            "Identified monitor"
        );

        MonitorRecord {
            identity,
            capability,
        }
    }

    /// Resolve every live monitor in enumeration order
    pub fn identify_all(&self) -> Result<Vec<MonitorRecord>> {
        let monitors = self.access.monitors()?;
        let entries = self.repository.enumerate();
        info!(monitors = monitors.len(), records = entries.len(), "Identifying monitors");

        Ok(monitors
            .iter()
            .enumerate()
            .map(|(index, monitor)| self.identify(monitor, &monitors, &entries, index))
            .collect())
    }
}

impl<D: DisplayAccess> IdentityEngine<D, ConfiguredStore> {
    /// Engine reading registry records from the store named in `settings.registry`
    pub fn from_settings(access: D, settings: EngineSettings) -> Self {
        let store = settings.registry.store();
        Self::new(access, store, settings)
    }
}

impl<D, S> IdentityEngine<D, S>
where
    D: DisplayAccess + Sync,
    S: RegistryStore + Sync,
{
    /// Like [`identify_all`](Self::identify_all), one scoped thread per monitor.
    ///
    /// Each thread only touches its own monitor's handle.
    pub fn identify_all_parallel(&self) -> Result<Vec<MonitorRecord>> {
        let monitors = self.access.monitors()?;
        let entries = self.repository.enumerate();
        info!(
            monitors = monitors.len(),
            records = entries.len(),
            "Identifying monitors in parallel"
        );

        thread::scope(|scope| {
            let handles: Vec<_> = monitors
                .iter()
                .enumerate()
                .map(|(index, monitor)| {
                    let monitors = &monitors;
                    let entries = &entries;
                    scope.spawn(move || self.identify(monitor, monitors, entries, index))
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .map_err(|_| MonitorError::generic("Monitor identification thread panicked"))
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::vcp;
    use crate::display::{FeatureReply, MockDisplayAccess, QueryError};
    use crate::probe::Responsiveness;
    use crate::registry::{MemoryRegistry, Recency};
    use crate::test_utils::{add_registry_instance, live_monitor, registry_entry, sample_edid};

    fn quick_settings() -> EngineSettings {
        let mut settings = EngineSettings::default();
        settings.probe.retry_delay_ms = 0;
        settings
    }

    #[test]
    fn test_identity_from_found_entry() {
        let monitor = live_monitor("m1", "Generic PnP Monitor", Some("DEL4123"));
        let entry = registry_entry("DEL4123", "inst", &sample_edid(), Recency::from_score(1));
        let resolution = Resolution::Found {
            entry: entry.activated(),
            reason: ResolveReason::OnlyCandidate,
        };

        let identity = MonitorIdentity::build(&monitor, &resolution, None, 0, &[]);
        assert_eq!(identity.manufacturer_code.as_deref(), Some("DEL"));
        assert_eq!(identity.manufacturer_name.as_deref(), Some("Dell"));
        assert_eq!(identity.model_name.as_deref(), Some("DELL U2720Q"));
        assert_eq!(identity.serial_string.as_deref(), Some("7XJ2K83"));
        assert_eq!(identity.product_code, Some(0xA0FB));
        assert_eq!(identity.edid_hash, Some(entry.edid.hash_hex()));
        assert_eq!(identity.name, "DELL U2720Q");
        assert_eq!(identity.provenance, NameSource::FromRegistry);
        assert!(matches!(identity.edid_lookup, EdidLookup::Found { .. }));
    }

    #[test]
    fn test_identity_without_edid_is_all_absent() {
        let monitor = live_monitor("m1", "", None);
        let identity = MonitorIdentity::build(&monitor, &Resolution::NotFound, None, 1, &[]);
        assert_eq!(identity.edid_lookup, EdidLookup::NotFound);
        assert_eq!(identity.manufacturer_code, None);
        assert_eq!(identity.serial_number, None);
        assert_eq!(identity.chromaticity, None);
        assert_eq!(identity.edid_hash, None);
        assert_eq!(identity.name, "Monitor 2");
    }

    #[test]
    fn test_identify_all_pipeline() {
        let mut store = MemoryRegistry::new();
        add_registry_instance(&mut store, "DEL4123", "inst", &sample_edid(), 0);

        let mut access = MockDisplayAccess::new();
        access
            .expect_monitors()
            .returning(|| Ok(vec![live_monitor("m1", "Generic PnP Monitor", Some("DEL4123"))]));
        access.expect_query_feature().returning(|_, code| {
            if code == vcp::BRIGHTNESS {
                Ok(FeatureReply { current: 40, max: 100 })
            } else {
                Err(QueryError::Unsupported)
            }
        });

        let engine = IdentityEngine::new(access, store, quick_settings());
        let records = engine.identify_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identity.name, "DELL U2720Q");
        assert_eq!(
            records[0].capability.responsiveness,
            Responsiveness::PartiallyResponsive
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut store = MemoryRegistry::new();
        add_registry_instance(&mut store, "DEL4123", "inst", &sample_edid(), 0);

        let mut access = MockDisplayAccess::new();
        access.expect_monitors().returning(|| {
            Ok(vec![
                live_monitor("m1", "Generic PnP Monitor", Some("DEL4123")),
                live_monitor("m2", "Office Projector", None),
            ])
        });
        access
            .expect_query_feature()
            .returning(|_, _| Err(QueryError::Unsupported));

        let engine = IdentityEngine::new(access, store, quick_settings());
        let sequential = engine.identify_all().unwrap();
        let parallel = engine.identify_all_parallel().unwrap();
        assert_eq!(parallel.len(), 2);
        for (a, b) in sequential.iter().zip(&parallel) {
            assert_eq!(a.identity, b.identity);
            assert_eq!(a.capability.results, b.capability.results);
        }
    }

    #[test]
    fn test_engine_from_settings_reads_configured_root() {
        let dir = tempfile::TempDir::new().unwrap();
        let params = dir.path().join("DEL4123").join("inst").join("Device Parameters");
        std::fs::create_dir_all(&params).unwrap();
        std::fs::write(params.join("EDID"), sample_edid()).unwrap();

        let mut access = MockDisplayAccess::new();
        access
            .expect_monitors()
            .returning(|| Ok(vec![live_monitor("m1", "Generic PnP Monitor", Some("DEL4123"))]));
        access
            .expect_query_feature()
            .returning(|_, _| Err(QueryError::Unsupported));

        let mut settings = quick_settings();
        settings.registry.root = Some(dir.path().to_path_buf());
        let engine = IdentityEngine::from_settings(access, settings);
        assert!(matches!(engine.repository().store(), ConfiguredStore::Directory(_)));

        let records = engine.identify_all().unwrap();
        assert_eq!(records[0].identity.name, "DELL U2720Q");
        assert!(matches!(records[0].identity.edid_lookup, EdidLookup::Found { .. }));
    }

    #[test]
    fn test_enumeration_failure_propagates() {
        let mut access = MockDisplayAccess::new();
        access
            .expect_monitors()
            .returning(|| Err(MonitorError::Enumeration("no DRM".into())));
        let engine = IdentityEngine::new(access, MemoryRegistry::new(), quick_settings());
        assert!(matches!(engine.identify_all(), Err(MonitorError::Enumeration(_))));
    }
}
