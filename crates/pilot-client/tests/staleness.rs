use fsd_protocol::position::AircraftVisualState;
use pilot_client::NetworkManager;
use std::time::{Duration, Instant};

fn state() -> AircraftVisualState {
    AircraftVisualState {
        lat: 41.5,
        lon: -87.6,
        altitude_ft: 5000.0,
        altitude_agl_ft: 5000.0,
        pitch: 0.0,
        heading: 0.0,
        bank: 0.0,
        nose_wheel_angle: 0.0,
    }
}

/// Scenario 5: a plane created via slow position at t=0 with no further
/// updates is evicted by the staleness tick at t=10.5s.
#[test]
fn remote_aircraft_created_at_t0_is_evicted_at_ten_point_five_seconds() {
    let mut manager = NetworkManager::new("FLC1");
    let t0 = Instant::now();
    manager.remote_aircraft_mut().slow_position_in("UAL1", state(), 250, t0);
    assert!(manager.remote_aircraft_mut().get("UAL1").is_some());

    manager.staleness_tick(t0 + Duration::from_millis(10_500));
    assert!(manager.remote_aircraft_mut().get("UAL1").is_none());
}

/// Companion controller staleness: a controller last heard from more than
/// 60s ago is absent from the roster after the next GC tick.
#[test]
fn controller_unseen_for_sixty_seconds_is_garbage_collected() {
    let mut manager = NetworkManager::new("FLC1");
    let t0 = Instant::now();
    manager.controllers_mut().position_update("EGLL_TWR", 118_700, 51.47, -0.45, t0);
    assert!(manager.controllers_mut().get("EGLL_TWR").is_some());

    manager.staleness_tick(t0 + Duration::from_secs(61));
    assert!(manager.controllers_mut().get("EGLL_TWR").is_none());
}
