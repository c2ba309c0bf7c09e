//! Configuration ports feeding the service.

use barista::adapters::{JsonConfigFile, LogEventSink, MemoryConfigStore};
use barista::app::ports::{ConfigError, ConfigPort};
use barista::{AppCommand, CafeService, Error, MachineConfig, StationKind};

use crate::mock::MockConfig;

#[test]
fn missing_config_falls_back_to_defaults() {
    let port = MockConfig::empty();
    let svc = CafeService::from_port(&port).unwrap();
    assert_eq!(svc.config(), &MachineConfig::default());
}

#[test]
fn corrupted_config_fails_construction() {
    let port = MockConfig::with(Err(ConfigError::Corrupted));
    assert!(matches!(
        CafeService::from_port(&port),
        Err(Error::Config(_))
    ));
}

#[test]
fn stored_config_drives_the_stations() {
    let mut cfg = MachineConfig::default();
    cfg.espresso.slot_counts = [1, 3, 4];
    let port = MockConfig::empty();
    port.save(&cfg).unwrap();
    assert_eq!(port.saves.get(), 1);

    let svc = CafeService::from_port(&port).unwrap();
    assert_eq!(svc.espresso().available_slot_count(), 1);
}

#[test]
fn invalid_config_is_refused_by_the_service() {
    let mut cfg = MachineConfig::default();
    cfg.dosing.tolerance_g = cfg.dosing.ideal_dose_g;
    assert!(CafeService::new(cfg).is_err());
}

#[test]
fn nan_capacity_never_reaches_the_stations() {
    let mut cfg = MachineConfig::default();
    cfg.dosing.capacity_g = f32::NAN;
    let port = MockConfig::with(Ok(cfg.clone()));
    assert!(matches!(
        CafeService::from_port(&port),
        Err(Error::Config(_))
    ));

    let store = MemoryConfigStore::new();
    assert!(store.save(&cfg).is_err());
    assert!(matches!(
        CafeService::from_port(&store),
        Ok(svc) if svc.config() == &MachineConfig::default()
    ));
}

#[test]
fn memory_store_round_trips_through_the_service() {
    let store = MemoryConfigStore::new();
    let mut cfg = MachineConfig::default();
    cfg.grinder.bean_capacity = 4;
    store.save(&cfg).unwrap();

    let mut svc = CafeService::from_port(&store).unwrap();
    let mut sink = LogEventSink::new();
    svc.start(&mut sink);
    svc.handle_command(AppCommand::AddBeans { fills: 9 }, &mut sink);
    assert_eq!(svc.grinder().state().bean_fills(), 4);
}

#[test]
fn json_file_feeds_the_service() {
    let path = std::env::temp_dir()
        .join(format!("barista-it-{}", std::process::id()))
        .join("bar.json");
    let port = JsonConfigFile::new(&path);
    let mut cfg = MachineConfig::default();
    cfg.dosing.capacity_g = 40.0;
    port.save(&cfg).unwrap();

    let mut svc = CafeService::from_port(&port).unwrap();
    let mut sink = LogEventSink::new();
    svc.handle_command(
        AppCommand::Upgrade {
            station: StationKind::Dosing,
            level: 1,
        },
        &mut sink,
    );
    assert_eq!(svc.dosing().state().level(), 1);
    assert_eq!(svc.config().dosing.capacity_g, 40.0);
    let _ = std::fs::remove_file(path);
}
