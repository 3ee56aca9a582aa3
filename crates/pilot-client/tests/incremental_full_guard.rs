use fsd_protocol::position::AircraftVisualState;
use fsd_protocol::AircraftConfiguration;
use pilot_client::remote_aircraft::RemoteAircraftManager;
use std::time::Instant;

fn state() -> AircraftVisualState {
    AircraftVisualState {
        lat: 0.0,
        lon: 0.0,
        altitude_ft: 1000.0,
        altitude_agl_ft: 1000.0,
        pitch: 0.0,
        heading: 0.0,
        bank: 0.0,
        nose_wheel_angle: 0.0,
    }
}

/// Scenario 3: an incremental config before any full snapshot is dropped
/// entirely; a full snapshot seeds the baseline; a later incremental only
/// touches the fields it names, leaving the rest (gear) untouched.
#[test]
fn incremental_seeds_nothing_full_seeds_baseline_then_incremental_merges() {
    let mut mgr = RemoteAircraftManager::new();
    let now = Instant::now();
    mgr.slow_position_in("DAL202", state(), 180, now);

    let early_incremental: AircraftConfiguration = r#"{"config":{"flaps_pct":10}}"#.parse().unwrap();
    let commands = mgr.aircraft_configuration_in("DAL202", early_incremental);
    assert!(commands.is_empty());
    assert!(mgr.get("DAL202").unwrap().configuration.is_none());

    let full: AircraftConfiguration =
        r#"{"config":{"is_full_data":true,"gear_down":true,"flaps_pct":15,"on_ground":true}}"#.parse().unwrap();
    mgr.aircraft_configuration_in("DAL202", full);
    let baseline = mgr.get("DAL202").unwrap().configuration.clone().unwrap();
    assert_eq!(baseline.flaps_pct, Some(15));
    assert_eq!(baseline.gear_down, Some(true));

    let later_incremental: AircraftConfiguration = r#"{"config":{"flaps_pct":25}}"#.parse().unwrap();
    mgr.aircraft_configuration_in("DAL202", later_incremental);
    let merged = mgr.get("DAL202").unwrap().configuration.clone().unwrap();
    assert_eq!(merged.flaps_pct, Some(25));
    assert_eq!(merged.gear_down, Some(true));
    assert_eq!(merged.on_ground, Some(true));
}
