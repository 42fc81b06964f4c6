/*
 * Integration tests for monid
 *
 * These tests drive the whole pipeline: registry enumeration, conflict
 * resolution, capability probing and naming, through the public API.
 */

use mockall::mock;
use serial_test::serial;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

use monid::constants::vcp;
use monid::test_utils::{live_monitor, sample_edid, EdidBuilder};
use monid::{
    DisplayAccess, EdidLookup, EngineSettings, FeatureReply, FsRegistry, IdentityEngine,
    LiveMonitor, MemoryRegistry, MonitorHandle, MonitorRecord, NameSource, QueryError,
    RegistryEdidRepository, Resolution, ResolveReason, Responsiveness,
};

mock! {
    pub Display {}

    impl DisplayAccess for Display {
        fn monitors(&self) -> monid::Result<Vec<LiveMonitor>>;
        fn query_feature(
            &self,
            handle: &MonitorHandle,
            code: u8,
        ) -> Result<FeatureReply, QueryError>;
    }
}

// Test utilities
fn write_instance(root: &Path, hardware_key: &str, instance: &str, edid: &[u8], extra: usize) {
    let instance_dir = root.join(hardware_key).join(instance);
    let params = instance_dir.join("Device Parameters");
    fs::create_dir_all(&params).unwrap();
    fs::write(params.join("EDID"), edid).unwrap();
    for i in 0..extra {
        fs::write(instance_dir.join(format!("Value{}", i)), [i as u8]).unwrap();
    }
}

fn quick_settings() -> EngineSettings {
    let mut settings = EngineSettings::default();
    settings.probe.retry_delay_ms = 0;
    settings
}

fn silent_display(monitors: Vec<LiveMonitor>) -> MockDisplay {
    let mut display = MockDisplay::new();
    display.expect_monitors().returning(move || Ok(monitors.clone()));
    display
        .expect_query_feature()
        .returning(|_, _| Err(QueryError::Unsupported));
    display
}

fn lg_edid() -> Vec<u8> {
    EdidBuilder::new()
        .manufacturer("GSM")
        .product_code(0x5B08)
        .serial_number(0x0001_E240)
        .name_descriptor(1, b"LG HDR 4K")
        .build()
}

#[test]
fn test_dirty_registry_resolves_to_live_monitor() {
    let dir = TempDir::new().unwrap();
    // Two stale records of the same Dell plus garbage
    write_instance(dir.path(), "DEL4123", "uid1", &sample_edid(), 0);
    write_instance(dir.path(), "DEL4123", "uid2", &sample_edid(), 4);
    write_instance(dir.path(), "DEL4123", "broken", &[0u8; 64], 9);
    write_instance(dir.path(), "GSM5B08", "uid3", &lg_edid(), 1);

    let display = silent_display(vec![live_monitor(
        "m1",
        "Generic PnP Monitor",
        Some("DEL4123"),
    )]);
    let engine = IdentityEngine::new(display, FsRegistry::new(dir.path()), quick_settings());
    let records = engine.identify_all().unwrap();

    assert_eq!(records.len(), 1);
    let identity = &records[0].identity;
    match &identity.edid_lookup {
        EdidLookup::Found { path, reason } => {
            assert!(path.contains("uid2"), "expected the fuller record, got {}", path);
            assert_eq!(*reason, ResolveReason::OnlyCandidate);
        }
        other => panic!("expected Found, got {:?}", other),
    }
    assert_eq!(identity.manufacturer_code.as_deref(), Some("DEL"));
    assert_eq!(identity.name, "DELL U2720Q");
    assert_eq!(identity.provenance, NameSource::FromRegistry);
    assert_eq!(records[0].capability.responsiveness, Responsiveness::NonResponsive);
}

#[test]
fn test_elimination_across_two_monitors() {
    let mut registry = MemoryRegistry::new();
    monid::test_utils::add_registry_instance(&mut registry, "DEL4123", "a", &sample_edid(), 0);
    monid::test_utils::add_registry_instance(&mut registry, "GSM5B08", "b", &lg_edid(), 0);

    let display = silent_display(vec![
        live_monitor("m1", "LG HDR 4K", None),
        live_monitor("m2", "Generic PnP Monitor", None),
    ]);
    let engine = IdentityEngine::new(display, registry, quick_settings());
    let records = engine.identify_all().unwrap();

    assert_eq!(records[0].identity.model_name.as_deref(), Some("LG HDR 4K"));
    assert_eq!(records[1].identity.model_name.as_deref(), Some("DELL U2720Q"));
    assert!(matches!(
        records[1].identity.edid_lookup,
        EdidLookup::Found { reason: ResolveReason::Elimination, .. }
    ));
}

#[test]
fn test_two_generic_monitors_are_ambiguous() {
    let mut registry = MemoryRegistry::new();
    monid::test_utils::add_registry_instance(&mut registry, "DEL4123", "a", &sample_edid(), 0);
    monid::test_utils::add_registry_instance(&mut registry, "GSM5B08", "b", &lg_edid(), 0);

    let display = silent_display(vec![
        live_monitor("m1", "Generic PnP Monitor", None),
        live_monitor("m2", "Generic PnP Monitor", None),
    ]);
    let engine = IdentityEngine::new(display, registry, quick_settings());
    let records = engine.identify_all().unwrap();

    for (index, record) in records.iter().enumerate() {
        match &record.identity.edid_lookup {
            EdidLookup::Ambiguous { paths } => assert_eq!(paths.len(), 2),
            other => panic!("expected Ambiguous, got {:?}", other),
        }
        assert_eq!(record.identity.name, format!("Monitor {}", index + 1));
        assert_eq!(record.identity.manufacturer_code, None);
    }
}

#[test]
fn test_live_probe_name_wins() {
    let mut registry = MemoryRegistry::new();
    monid::test_utils::add_registry_instance(&mut registry, "DEL4123", "a", &sample_edid(), 0);

    let mut display = MockDisplay::new();
    display
        .expect_monitors()
        .returning(|| Ok(vec![live_monitor("m1", "Generic PnP Monitor", None)]));
    display.expect_query_feature().returning(|_, code| match code {
        vcp::DISPLAY_CONTROLLER_TYPE => Ok(FeatureReply {
            max: u16::from_be_bytes(*b"NV"),
            current: u16::from_be_bytes(*b"TK"),
        }),
        vcp::VCP_VERSION => Ok(FeatureReply { current: 0x0202, max: 0 }),
        _ => Ok(FeatureReply { current: 1, max: 100 }),
    });

    let engine = IdentityEngine::new(display, registry, quick_settings());
    let record: MonitorRecord = engine.identify_all().unwrap().remove(0);

    assert_eq!(record.capability.responsiveness, Responsiveness::FullyResponsive);
    assert_eq!(record.identity.name, "NVTK");
    assert_eq!(record.identity.provenance, NameSource::FromLiveProbe);
    assert_eq!(
        record.capability.vendor.mccs_version.as_ref().map(|f| f.text.as_str()),
        Some("2.2")
    );
    // EDID fields still come from the registry
    assert_eq!(record.identity.product_code, Some(0xA0FB));
}

#[test]
fn test_recent_timestamp_beats_complete_record() {
    let incomplete = EdidBuilder::new().product_code(0x4123).build();
    let mut registry = MemoryRegistry::new();
    monid::test_utils::add_registry_instance(&mut registry, "DEL4123", "old", &sample_edid(), 5);
    monid::test_utils::add_registry_instance(&mut registry, "DEL4123", "new", &incomplete, 0);
    let now = SystemTime::now();
    registry.set_modified("DEL4123\\old", now - Duration::from_secs(120 * 24 * 3600));
    registry.set_modified("DEL4123\\new", now - Duration::from_secs(3600));

    let entries = RegistryEdidRepository::new(&registry).enumerate();
    let target = live_monitor("m1", "Generic PnP Monitor", None);
    let resolution = monid::ConflictResolver::default().resolve(&entries, &target, &[]);

    match resolution {
        Resolution::Found { entry, reason } => {
            assert_eq!(entry.instance_key, "new");
            assert!(entry.active);
            assert_eq!(reason, ResolveReason::RecentWindow);
        }
        other => panic!("expected Found, got {:?}", other),
    }
}

#[test]
fn test_records_serialize_to_json() {
    let display = silent_display(vec![live_monitor("m1", "", None)]);
    let engine = IdentityEngine::new(display, MemoryRegistry::new(), quick_settings());
    let records = engine.identify_all().unwrap();

    let json = serde_json::to_value(&records).unwrap();
    assert_eq!(json[0]["identity"]["name"], "Monitor 1");
    assert_eq!(json[0]["identity"]["edid_lookup"], "NotFound");
    assert_eq!(json[0]["identity"]["serial_number"], serde_json::Value::Null);
    assert_eq!(json[0]["capability"]["responsiveness"], "NonResponsive");
}

#[test]
#[serial]
fn test_settings_from_env_drive_the_prober() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(
        &path,
        r#"{ "probe": { "attempts": 2, "retry_delay_ms": 0, "codes": [16, 18] } }"#,
    )
    .unwrap();
    std::env::set_var("MONID_CONFIG", &path);
    let settings = monid::load_settings().unwrap();
    std::env::remove_var("MONID_CONFIG");

    let mut display = MockDisplay::new();
    display
        .expect_monitors()
        .returning(|| Ok(vec![live_monitor("m1", "Office", None)]));
    display
        .expect_query_feature()
        .times(4)
        .returning(|_, _| Err(QueryError::fault(5, "bus busy")));

    let engine = IdentityEngine::new(display, MemoryRegistry::new(), settings);
    let record = engine.identify_all().unwrap().remove(0);
    assert_eq!(record.capability.responsiveness, Responsiveness::CommunicationError);
    assert!(record.capability.results.iter().all(|r| r.attempts == 2));
    assert_eq!(record.identity.name, "Office");
    assert_eq!(record.identity.provenance, NameSource::FromOsFallback);
}
