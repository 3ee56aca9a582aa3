//! The controller set (component G): ATC station add/update/expire and
//! radio-frequency alias resolution.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::events::ControllerEvent;

const STALE_AFTER: Duration = Duration::from_secs(60);
const SENTINEL_FREQUENCY_KHZ: u32 = 199998;

#[derive(Debug, Clone, PartialEq)]
pub struct Controller {
    pub callsign: String,
    pub frequency_khz: u32,
    pub normalized_frequency_khz: u32,
    pub frequency_hz: u64,
    pub lat: f64,
    pub lon: f64,
    pub last_update_at: Instant,
    pub real_name: String,
    pub is_valid_atc: bool,
    pub is_delete_pending: bool,
}

impl Controller {
    /// A controller is valid iff flagged a valid ATC station and not on the
    /// sentinel "no such frequency" channel.
    pub fn is_valid(&self) -> bool {
        self.is_valid_atc && self.frequency_khz != SENTINEL_FREQUENCY_KHZ
    }
}

/// Round a 25 kHz-stepped channel's last two digits to the canonical
/// `…20 → …25`, `…70 → …75` representative ("normalized frequency").
pub fn normalize_frequency_khz(khz: u32) -> u32 {
    let last_two = khz % 100;
    let base = khz - last_two;
    let normalized_last_two = match last_two {
        20 => 25,
        70 => 75,
        other => other,
    };
    base + normalized_last_two
}

pub struct ControllerSet {
    controllers: HashMap<String, Controller>,
}

impl ControllerSet {
    pub fn new() -> Self {
        ControllerSet { controllers: HashMap::new() }
    }

    pub fn get(&self, callsign: &str) -> Option<&Controller> {
        self.controllers.get(&callsign.to_ascii_uppercase())
    }

    /// Handle an ATC position update (`%`). Returns the events a subscriber
    /// should be told about, and the symbolic queries the network manager
    /// should dispatch for a brand-new controller (real name / ATC / CAPS).
    pub fn position_update(
        &mut self,
        callsign: &str,
        frequency_khz: u32,
        lat: f64,
        lon: f64,
        now: Instant,
    ) -> (Vec<ControllerEvent>, bool) {
        let key = callsign.to_ascii_uppercase();
        let normalized = normalize_frequency_khz(frequency_khz);

        match self.controllers.get(&key) {
            None => {
                let controller = Controller {
                    callsign: key.clone(),
                    frequency_khz,
                    normalized_frequency_khz: normalized,
                    frequency_hz: frequency_khz as u64 * 1000,
                    lat,
                    lon,
                    last_update_at: now,
                    real_name: "Unknown".to_string(),
                    is_valid_atc: false,
                    is_delete_pending: false,
                };
                let event = ControllerEvent::Added(controller.clone());
                self.controllers.insert(key, controller);
                (vec![event], true)
            }
            Some(existing) => {
                let changed = existing.frequency_khz != frequency_khz
                    || existing.lat != lat
                    || existing.lon != lon;
                if !changed {
                    if let Some(c) = self.controllers.get_mut(&key) {
                        c.last_update_at = now;
                    }
                    return (vec![], false);
                }
                let mut events = vec![ControllerEvent::Deleted { callsign: key.clone() }];
                let controller = self.controllers.get_mut(&key).unwrap();
                controller.frequency_khz = frequency_khz;
                controller.normalized_frequency_khz = normalized;
                controller.frequency_hz = frequency_khz as u64 * 1000;
                controller.lat = lat;
                controller.lon = lon;
                controller.last_update_at = now;
                if !controller.is_valid() {
                    controller.is_delete_pending = true;
                } else {
                    events.push(ControllerEvent::Added(controller.clone()));
                }
                (events, false)
            }
        }
    }

    /// Populate a real-name response; re-announce the controller if it is
    /// now valid.
    pub fn set_real_name(&mut self, callsign: &str, real_name: String) -> Vec<ControllerEvent> {
        let key = callsign.to_ascii_uppercase();
        if let Some(c) = self.controllers.get_mut(&key) {
            c.real_name = real_name;
            if c.is_valid() {
                return vec![ControllerEvent::Added(c.clone())];
            }
        }
        vec![]
    }

    /// Populate the valid-ATC flag; re-announce if now valid.
    pub fn set_is_valid_atc(&mut self, callsign: &str, is_valid: bool) -> Vec<ControllerEvent> {
        let key = callsign.to_ascii_uppercase();
        if let Some(c) = self.controllers.get_mut(&key) {
            c.is_valid_atc = is_valid;
            if c.is_valid() {
                return vec![ControllerEvent::Added(c.clone())];
            }
        }
        vec![]
    }

    /// Per-second GC: evict delete-pending or stale controllers.
    pub fn garbage_collect(&mut self, now: Instant) -> Vec<ControllerEvent> {
        let mut expired = Vec::new();
        self.controllers.retain(|callsign, c| {
            let stale = now.duration_since(c.last_update_at) > STALE_AFTER;
            if c.is_delete_pending || stale {
                expired.push(callsign.clone());
                false
            } else {
                true
            }
        });
        expired
            .into_iter()
            .map(|callsign| ControllerEvent::Deleted { callsign })
            .collect()
    }

    /// Resolve the station callsign bound to a given COM frequency (kHz),
    /// under 25 kHz normalization, for the voice adapter's station binding.
    pub fn station_for_frequency(&self, com_frequency_khz: u32) -> Option<&str> {
        let target = normalize_frequency_khz(com_frequency_khz);
        self.controllers
            .values()
            .find(|c| c.is_valid() && c.normalized_frequency_khz == target)
            .map(|c| c.callsign.as_str())
    }
}

impl Default for ControllerSet {
    fn default() -> Self {
        ControllerSet::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_normalization_rounds_to_25khz_steps() {
        assert_eq!(normalize_frequency_khz(128_020), 128_025);
        assert_eq!(normalize_frequency_khz(128_070), 128_075);
        assert_eq!(normalize_frequency_khz(128_025), 128_025);
    }

    #[test]
    fn new_controller_dispatches_added_event() {
        let mut set = ControllerSet::new();
        let now = Instant::now();
        let (events, is_new) = set.position_update("EGLL_TWR", 118_700, 51.47, -0.45, now);
        assert!(is_new);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ControllerEvent::Added(_)));
    }

    #[test]
    fn invalid_controller_marked_delete_pending() {
        let mut set = ControllerSet::new();
        let now = Instant::now();
        set.position_update("EGLL_TWR", 118_700, 51.47, -0.45, now);
        // Sentinel frequency: never becomes valid regardless of is_valid_atc.
        let (_events, _) = set.position_update("EGLL_TWR", SENTINEL_FREQUENCY_KHZ, 51.47, -0.45, now);
        assert!(set.get("EGLL_TWR").unwrap().is_delete_pending);
    }

    #[test]
    fn stale_controller_is_garbage_collected() {
        let mut set = ControllerSet::new();
        let t0 = Instant::now();
        set.position_update("EGLL_TWR", 118_700, 51.47, -0.45, t0);
        let later = t0 + Duration::from_secs(61);
        let events = set.garbage_collect(later);
        assert_eq!(events.len(), 1);
        assert!(set.get("EGLL_TWR").is_none());
    }
}
