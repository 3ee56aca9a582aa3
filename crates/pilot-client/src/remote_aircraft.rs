//! The remote-aircraft manager (component F): discovery, capability probe,
//! config merge, eligibility, staleness eviction, sim sync. The
//! `AircraftConfiguration` merge/diff primitives themselves live in
//! `fsd_protocol::aircraft_config` and are reused here rather than
//! duplicated.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use fsd_protocol::position::AircraftVisualState;
use fsd_protocol::AircraftConfiguration;

use crate::events::RemoteAircraftEvent;

const STALE_AFTER: Duration = Duration::from_secs(10);
/// One-shot `#SB PIR` retry window.
const PLANE_INFO_RETRY_AFTER: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AircraftStatus {
    New,
    Active,
    Ignored,
    Pending,
}

#[derive(Debug, Clone)]
pub struct NetworkAircraft {
    pub callsign: String,
    pub airline: String,
    pub type_code: String,
    pub remote_visual_state: AircraftVisualState,
    pub configuration: Option<AircraftConfiguration>,
    pub last_slow_update_at: Instant,
    pub last_sync_at: Option<Instant>,
    pub status: AircraftStatus,
    pub have_velocities: bool,
    pub ground_speed: u16,
    plane_info_requested_at: Option<Instant>,
    plane_info_retried: bool,
}

impl NetworkAircraft {
    /// `configuration.is_some() ∧ !type_code.empty() ∧ status≠Ignored`.
    pub fn is_eligible(&self) -> bool {
        self.configuration.is_some()
            && !self.type_code.is_empty()
            && self.status != AircraftStatus::Ignored
    }
}

/// Commands the manager issues to the simulator bridge (component D).
#[derive(Debug, Clone)]
pub enum SimCommand {
    AddPlane { callsign: String, type_code: String, airline: String },
    PushConfig { callsign: String, configuration: AircraftConfiguration },
    RequestPlaneInfo { callsign: String },
    RemovePlane { callsign: String },
    ApplySlowPosition { callsign: String, state: AircraftVisualState, ground_speed: u16 },
    ApplyFastPosition { callsign: String, state: AircraftVisualState },
}

pub struct RemoteAircraftManager {
    aircraft: HashMap<String, NetworkAircraft>,
    ignored: HashSet<String>,
}

impl RemoteAircraftManager {
    pub fn new() -> Self {
        RemoteAircraftManager { aircraft: HashMap::new(), ignored: HashSet::new() }
    }

    pub fn get(&self, callsign: &str) -> Option<&NetworkAircraft> {
        self.aircraft.get(&callsign.to_ascii_uppercase())
    }

    pub fn ignore(&mut self, callsign: &str) -> Vec<SimCommand> {
        let key = callsign.to_ascii_uppercase();
        self.ignored.insert(key.clone());
        if self.aircraft.remove(&key).is_some() {
            vec![SimCommand::RemovePlane { callsign: key }]
        } else {
            vec![]
        }
    }

    pub fn unignore(&mut self, callsign: &str) {
        self.ignored.remove(&callsign.to_ascii_uppercase());
    }

    /// Slow pilot position in.
    pub fn slow_position_in(
        &mut self,
        callsign: &str,
        state: AircraftVisualState,
        ground_speed: u16,
        now: Instant,
    ) -> Vec<SimCommand> {
        let key = callsign.to_ascii_uppercase();
        if self.ignored.contains(&key) {
            return vec![];
        }

        if !self.aircraft.contains_key(&key) {
            self.aircraft.insert(
                key.clone(),
                NetworkAircraft {
                    callsign: key.clone(),
                    airline: String::new(),
                    type_code: String::new(),
                    remote_visual_state: state,
                    configuration: None,
                    last_slow_update_at: now,
                    last_sync_at: None,
                    status: AircraftStatus::New,
                    have_velocities: false,
                    ground_speed,
                    plane_info_requested_at: Some(now),
                    plane_info_retried: false,
                },
            );
            return vec![
                SimCommand::RequestPlaneInfo { callsign: key.clone() },
                SimCommand::ApplySlowPosition { callsign: key, state, ground_speed },
            ];
        }

        let aircraft = self.aircraft.get_mut(&key).unwrap();
        aircraft.last_slow_update_at = now;
        aircraft.remote_visual_state = state;
        aircraft.ground_speed = ground_speed;
        let mut commands = vec![SimCommand::ApplySlowPosition { callsign: key.clone(), state, ground_speed }];
        if aircraft.status == AircraftStatus::New && aircraft.is_eligible() {
            commands.extend(self.sync_simulator_aircraft());
        }
        commands
    }

    /// Fast pilot position in: forward only, no eligibility changes.
    pub fn fast_position_in(&mut self, callsign: &str, state: AircraftVisualState) -> Vec<SimCommand> {
        let key = callsign.to_ascii_uppercase();
        if let Some(aircraft) = self.aircraft.get_mut(&key) {
            aircraft.have_velocities = true;
        }
        vec![SimCommand::ApplyFastPosition { callsign: key, state }]
    }

    /// `#SB PI` aircraft-info response.
    pub fn aircraft_info_in(
        &mut self,
        callsign: &str,
        type_code: String,
        airline: String,
    ) -> Vec<SimCommand> {
        let key = callsign.to_ascii_uppercase();
        let Some(aircraft) = self.aircraft.get_mut(&key) else {
            return vec![];
        };
        let prior_type = aircraft.type_code.clone();
        let model_changed = !prior_type.is_empty() && prior_type != type_code;
        aircraft.type_code = type_code.clone();
        aircraft.airline = airline.clone();
        aircraft.plane_info_requested_at = None;

        if model_changed {
            return vec![SimCommand::AddPlane { callsign: key, type_code, airline }];
        }
        if aircraft.status == AircraftStatus::New && aircraft.is_eligible() {
            self.sync_simulator_aircraft()
        } else {
            vec![]
        }
    }

    /// `$CQ ACC` aircraft-configuration in, routed through
    /// `fsd_protocol::AircraftConfiguration::apply_incremental`.
    pub fn aircraft_configuration_in(
        &mut self,
        callsign: &str,
        incoming: AircraftConfiguration,
    ) -> Vec<SimCommand> {
        let key = callsign.to_ascii_uppercase();
        let Some(aircraft) = self.aircraft.get_mut(&key) else {
            return vec![];
        };

        match &aircraft.configuration {
            None if !incoming.is_full() => return vec![],
            None => aircraft.configuration = Some(incoming),
            Some(baseline) => {
                if incoming.is_full() {
                    aircraft.configuration = Some(incoming);
                } else {
                    aircraft.configuration = Some(baseline.apply_incremental(&incoming));
                }
            }
        }

        if aircraft.status == AircraftStatus::New && aircraft.is_eligible() {
            self.sync_simulator_aircraft()
        } else {
            vec![SimCommand::PushConfig {
                callsign: key,
                configuration: aircraft.configuration.clone().unwrap(),
            }]
        }
    }

    /// Promote any `New` & eligible aircraft to `Active`, adding it to the
    /// simulator and pushing its configuration.
    pub fn sync_simulator_aircraft(&mut self) -> Vec<SimCommand> {
        let mut commands = Vec::new();
        for aircraft in self.aircraft.values_mut() {
            if aircraft.status == AircraftStatus::New && aircraft.is_eligible() {
                commands.push(SimCommand::AddPlane {
                    callsign: aircraft.callsign.clone(),
                    type_code: aircraft.type_code.clone(),
                    airline: aircraft.airline.clone(),
                });
                commands.push(SimCommand::PushConfig {
                    callsign: aircraft.callsign.clone(),
                    configuration: aircraft.configuration.clone().unwrap(),
                });
                aircraft.status = AircraftStatus::Active;
                aircraft.last_sync_at = Some(Instant::now());
            }
        }
        commands
    }

    /// Delete the aircraft on explicit `#DP`.
    pub fn remove(&mut self, callsign: &str) -> Vec<SimCommand> {
        let key = callsign.to_ascii_uppercase();
        if self.aircraft.remove(&key).is_some() {
            vec![SimCommand::RemovePlane { callsign: key }]
        } else {
            vec![]
        }
    }

    /// Staleness tick: evict any aircraft whose last slow update is > 10s
    /// old.
    pub fn evict_stale(&mut self, now: Instant) -> Vec<SimCommand> {
        let mut expired = Vec::new();
        self.aircraft.retain(|callsign, a| {
            if now.duration_since(a.last_slow_update_at) > STALE_AFTER {
                expired.push(callsign.clone());
                false
            } else {
                true
            }
        });
        expired
            .into_iter()
            .map(|callsign| SimCommand::RemovePlane { callsign })
            .collect()
    }

    /// One-shot `#SB PIR` retry for aircraft still missing plane info
    /// after 10s.
    pub fn retry_stale_plane_info_requests(&mut self, now: Instant) -> Vec<SimCommand> {
        let mut commands = Vec::new();
        for aircraft in self.aircraft.values_mut() {
            if aircraft.type_code.is_empty() && !aircraft.plane_info_retried {
                if let Some(requested_at) = aircraft.plane_info_requested_at {
                    if now.duration_since(requested_at) > PLANE_INFO_RETRY_AFTER {
                        aircraft.plane_info_retried = true;
                        commands.push(SimCommand::RequestPlaneInfo { callsign: aircraft.callsign.clone() });
                    }
                }
            }
        }
        commands
    }

    pub fn events_for(&self, command: &SimCommand) -> Option<RemoteAircraftEvent> {
        match command {
            SimCommand::AddPlane { callsign, .. } => {
                Some(RemoteAircraftEvent::Added { callsign: callsign.clone() })
            }
            SimCommand::PushConfig { callsign, configuration } => Some(RemoteAircraftEvent::ConfigChanged {
                callsign: callsign.clone(),
                configuration: configuration.clone(),
            }),
            SimCommand::RemovePlane { callsign } => {
                Some(RemoteAircraftEvent::Deleted { callsign: callsign.clone() })
            }
            _ => None,
        }
    }
}

impl Default for RemoteAircraftManager {
    fn default() -> Self {
        RemoteAircraftManager::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visual_state() -> AircraftVisualState {
        AircraftVisualState {
            lat: 41.5,
            lon: -87.6,
            altitude_ft: 35000.0,
            altitude_agl_ft: 35000.0,
            pitch: 0.0,
            heading: 90.0,
            bank: 0.0,
            nose_wheel_angle: 0.0,
        }
    }

    #[test]
    fn ignore_filter_blocks_slow_position_add() {
        let mut mgr = RemoteAircraftManager::new();
        mgr.ignore("UAL1");
        let commands = mgr.slow_position_in("UAL1", visual_state(), 420, Instant::now());
        assert!(commands.is_empty());
        assert!(mgr.get("UAL1").is_none());
    }

    #[test]
    fn remote_plane_lifecycle_promotes_to_active() {
        let mut mgr = RemoteAircraftManager::new();
        let now = Instant::now();
        mgr.slow_position_in("UAL1", visual_state(), 420, now);
        assert_eq!(mgr.get("UAL1").unwrap().status, AircraftStatus::New);

        mgr.aircraft_info_in("UAL1", "B738".to_string(), "UAL".to_string());
        assert_eq!(mgr.get("UAL1").unwrap().status, AircraftStatus::New);

        let full: AircraftConfiguration = r#"{"config":{"is_full_data":true,"gear_down":false,"flaps_pct":0,"on_ground":false}}"#
            .parse()
            .unwrap();
        let commands = mgr.aircraft_configuration_in("UAL1", full);
        assert!(commands.iter().any(|c| matches!(c, SimCommand::AddPlane { .. })));
        assert_eq!(mgr.get("UAL1").unwrap().status, AircraftStatus::Active);
    }

    #[test]
    fn incremental_before_full_is_dropped() {
        let mut mgr = RemoteAircraftManager::new();
        let now = Instant::now();
        mgr.slow_position_in("UAL1", visual_state(), 420, now);
        let incremental: AircraftConfiguration = r#"{"config":{"flaps_pct":25}}"#.parse().unwrap();
        let commands = mgr.aircraft_configuration_in("UAL1", incremental);
        assert!(commands.is_empty());
        assert!(mgr.get("UAL1").unwrap().configuration.is_none());
    }

    #[test]
    fn incremental_after_full_preserves_unset_fields() {
        let mut mgr = RemoteAircraftManager::new();
        let now = Instant::now();
        mgr.slow_position_in("UAL1", visual_state(), 420, now);
        mgr.aircraft_info_in("UAL1", "B738".to_string(), "UAL".to_string());
        let full: AircraftConfiguration =
            r#"{"config":{"is_full_data":true,"gear_down":true,"flaps_pct":15}}"#.parse().unwrap();
        mgr.aircraft_configuration_in("UAL1", full);

        let incremental: AircraftConfiguration = r#"{"config":{"flaps_pct":25}}"#.parse().unwrap();
        mgr.aircraft_configuration_in("UAL1", incremental);

        let config = mgr.get("UAL1").unwrap().configuration.clone().unwrap();
        assert_eq!(config.flaps_pct, Some(25));
        assert_eq!(config.gear_down, Some(true));
    }

    #[test]
    fn stale_aircraft_evicted_after_ten_seconds() {
        let mut mgr = RemoteAircraftManager::new();
        let t0 = Instant::now();
        mgr.slow_position_in("UAL1", visual_state(), 420, t0);
        let commands = mgr.evict_stale(t0 + Duration::from_millis(10_500));
        assert_eq!(commands.len(), 1);
        assert!(mgr.get("UAL1").is_none());
    }
}
