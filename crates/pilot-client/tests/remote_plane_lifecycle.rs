use fsd_protocol::position::AircraftVisualState;
use fsd_protocol::AircraftConfiguration;
use pilot_client::remote_aircraft::{AircraftStatus, RemoteAircraftManager, SimCommand};
use std::time::Instant;

fn state() -> AircraftVisualState {
    AircraftVisualState {
        lat: 41.5,
        lon: -87.6,
        altitude_ft: 35000.0,
        altitude_agl_ft: 35000.0,
        pitch: 0.0,
        heading: 0.0,
        bank: 0.0,
        nose_wheel_angle: 0.0,
    }
}

/// Scenario 2: `@N:UAL1:...` → `New`; `#SB PI` sets type/airline; a full
/// `$CQ ACC` promotes to `Active` with the sim-add command carrying gear
/// up, flaps 0, strobe on.
#[test]
fn slow_position_then_plane_info_then_full_config_promotes_active() {
    let mut mgr = RemoteAircraftManager::new();
    let now = Instant::now();

    let commands = mgr.slow_position_in("UAL1", state(), 420, now);
    assert!(commands.iter().any(|c| matches!(c, SimCommand::RequestPlaneInfo { .. })));
    assert_eq!(mgr.get("UAL1").unwrap().status, AircraftStatus::New);

    mgr.aircraft_info_in("UAL1", "B738".to_string(), "UAL".to_string());
    assert_eq!(mgr.get("UAL1").unwrap().type_code, "B738");
    assert_eq!(mgr.get("UAL1").unwrap().status, AircraftStatus::New);

    let full: AircraftConfiguration = r#"{"config":{"is_full_data":true,"gear_down":false,"flaps_pct":0,"on_ground":false,"engines":{"1":{"running":true},"2":{"running":true}},"lights":{"strobe_on":true,"nav_on":true}}}"#
        .parse()
        .unwrap();
    let commands = mgr.aircraft_configuration_in("UAL1", full);

    assert!(commands.iter().any(|c| matches!(c, SimCommand::AddPlane { callsign, .. } if callsign == "UAL1")));
    assert!(commands.iter().any(|c| matches!(c, SimCommand::PushConfig { callsign, .. } if callsign == "UAL1")));

    let aircraft = mgr.get("UAL1").unwrap();
    assert_eq!(aircraft.status, AircraftStatus::Active);
    let config = aircraft.configuration.as_ref().unwrap();
    assert_eq!(config.gear_down, Some(false));
    assert_eq!(config.flaps_pct, Some(0));
    assert_eq!(config.engines.unwrap().engine1.unwrap().running, Some(true));
    assert_eq!(config.lights.unwrap().strobe_on, Some(true));
}
