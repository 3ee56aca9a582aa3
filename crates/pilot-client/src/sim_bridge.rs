//! The simulator bridge (component D): UDP dataref pump, plugin MsgPack
//! channel, and the heartbeat/CSL gate. Manual fixed-width byte framing for
//! the `RREF`/`DREF`/`CMND` datagrams, no declarative byte-layout crate.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::build::MINIMUM_PLUGIN_VERSION;
use crate::error::ClientError;

const REREF_PATH_LEN: usize = 400;
const DREF_PATH_LEN: usize = 500;
const LIVENESS_WINDOW: Duration = Duration::from_secs(15);
const GATE_TICK: Duration = Duration::from_secs(1);

/// One subscribed dataref: a stable numeric id, the refresh frequency, and
/// the dotted dataref path.
#[derive(Debug, Clone, PartialEq)]
pub struct DatarefSubscription {
    pub id: i32,
    pub frequency_hz: i32,
    pub path: String,
}

/// `RREF` subscribe datagram: fixed-width command + numeric id + frequency
/// + NUL-padded 400-byte path.
pub fn encode_rref_subscribe(sub: &DatarefSubscription) -> Vec<u8> {
    let mut buf = Vec::with_capacity(REREF_PATH_LEN + 13);
    buf.extend_from_slice(b"RREF\0");
    buf.extend_from_slice(&sub.frequency_hz.to_le_bytes());
    buf.extend_from_slice(&sub.id.to_le_bytes());
    let mut path_bytes = sub.path.as_bytes().to_vec();
    path_bytes.resize(REREF_PATH_LEN, 0);
    buf.extend_from_slice(&path_bytes);
    buf
}

/// `DREF` set-value datagram: `f32` value + NUL-padded 500-byte path.
pub fn encode_dref_set(path: &str, value: f32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(DREF_PATH_LEN + 9);
    buf.extend_from_slice(b"DREF\0");
    buf.extend_from_slice(&value.to_le_bytes());
    let mut path_bytes = path.as_bytes().to_vec();
    path_bytes.resize(DREF_PATH_LEN, 0);
    buf.extend_from_slice(&path_bytes);
    buf
}

/// `CMND` command datagram: a NUL-terminated command name.
pub fn encode_cmnd(command_name: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(command_name.len() + 6);
    buf.extend_from_slice(b"CMND\0");
    buf.extend_from_slice(command_name.as_bytes());
    buf.push(0);
    buf
}

/// One `{i32 id, f32 value}` record from an inbound `RREF` datagram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatarefValue {
    pub id: i32,
    pub value: f32,
}

/// Decode the `N × 8` byte record pack following the `RREF,` reply header.
/// Returns an empty vec for a payload that isn't a whole number of 8-byte
/// records (malformed datagram; dropped, never panics).
pub fn decode_rref_values(payload: &[u8]) -> Vec<DatarefValue> {
    if payload.len() % 8 != 0 {
        return Vec::new();
    }
    payload
        .chunks_exact(8)
        .map(|chunk| DatarefValue {
            id: i32::from_le_bytes(chunk[0..4].try_into().unwrap()),
            value: f32::from_le_bytes(chunk[4..8].try_into().unwrap()),
        })
        .collect()
}

/// Record on the duplex plugin channel: `{type, dto}` MsgPack pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PluginMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub dto: serde_json::Value,
}

impl PluginMessage {
    pub fn encode(&self) -> Result<Vec<u8>, rmp_serde::encode::Error> {
        rmp_serde::to_vec_named(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, rmp_serde::decode::Error> {
        rmp_serde::from_slice(bytes)
    }
}

/// Tracks plugin liveness and the dataref-subscription set, gating
/// "sim-connected" status on UDP heartbeat + plugin version + CSL
/// validity.
pub struct SimulatorBridge {
    subscriptions: Vec<DatarefSubscription>,
    last_udp_at: Option<Instant>,
    handshake_done: bool,
    plugin_version: Option<u32>,
    csl_validated: bool,
    sim_connected: bool,
    last_gate_tick: Instant,
    requested_this_cycle: bool,
    csl_invalid_reported: bool,
}

impl SimulatorBridge {
    pub fn new(now: Instant) -> Self {
        SimulatorBridge {
            subscriptions: Vec::new(),
            last_udp_at: None,
            handshake_done: false,
            plugin_version: None,
            csl_validated: false,
            sim_connected: false,
            last_gate_tick: now,
            requested_this_cycle: false,
            csl_invalid_reported: false,
        }
    }

    pub fn subscribe(&mut self, sub: DatarefSubscription) {
        if !self.subscriptions.iter().any(|existing| existing.id == sub.id) {
            self.subscriptions.push(sub);
        }
    }

    pub fn record_udp_activity(&mut self, now: Instant) {
        self.last_udp_at = Some(now);
    }

    pub fn record_handshake(&mut self, plugin_version: u32, csl_validated: bool) {
        self.handshake_done = true;
        self.plugin_version = Some(plugin_version);
        self.csl_validated = csl_validated;
    }

    /// Every 1s: re-subscribe and request handshake info if the link has
    /// gone quiet, else promote to sim-connected once version/CSL gates
    /// pass.
    pub fn gate_tick(&mut self, now: Instant) -> Result<Vec<Vec<u8>>, ClientError> {
        if now.duration_since(self.last_gate_tick) < GATE_TICK {
            return Ok(Vec::new());
        }
        self.last_gate_tick = now;

        let stale = match self.last_udp_at {
            None => true,
            Some(last) => now.duration_since(last) > LIVENESS_WINDOW,
        };

        if stale || !self.handshake_done {
            self.sim_connected = false;
            let mut datagrams: Vec<Vec<u8>> =
                self.subscriptions.iter().map(encode_rref_subscribe).collect();
            self.subscriptions.clear();
            if !self.requested_this_cycle {
                self.requested_this_cycle = true;
                datagrams.push(encode_cmnd("PluginVersion"));
                datagrams.push(encode_cmnd("ValidateCsl"));
            }
            return Ok(datagrams);
        }

        self.requested_this_cycle = false;

        if let Some(version) = self.plugin_version {
            if version < MINIMUM_PLUGIN_VERSION {
                return Err(ClientError::PluginIncompatible { found: version, minimum: MINIMUM_PLUGIN_VERSION });
            }
        }
        if !self.csl_validated {
            if !self.csl_invalid_reported {
                self.csl_invalid_reported = true;
                return Err(ClientError::CslInvalid);
            }
            return Ok(Vec::new());
        }

        self.sim_connected = true;
        Ok(Vec::new())
    }

    pub fn is_sim_connected(&self) -> bool {
        self.sim_connected
    }

    pub fn subscribed_ids(&self) -> HashSet<i32> {
        self.subscriptions.iter().map(|s| s.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rref_subscribe_round_trip_header() {
        let sub = DatarefSubscription { id: 7, frequency_hz: 5, path: "sim/flightmodel/position/latitude".into() };
        let encoded = encode_rref_subscribe(&sub);
        assert!(encoded.starts_with(b"RREF\0"));
        assert_eq!(encoded.len(), 5 + 4 + 4 + REREF_PATH_LEN);
    }

    #[test]
    fn decode_rref_values_parses_records() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&7i32.to_le_bytes());
        payload.extend_from_slice(&1.5f32.to_le_bytes());
        let values = decode_rref_values(&payload);
        assert_eq!(values, vec![DatarefValue { id: 7, value: 1.5 }]);
    }

    #[test]
    fn malformed_rref_payload_is_dropped_not_panicked() {
        assert!(decode_rref_values(&[1, 2, 3]).is_empty());
    }

    #[test]
    fn gate_clears_subscriptions_after_heartbeat_lapse() {
        let t0 = Instant::now();
        let mut bridge = SimulatorBridge::new(t0);
        bridge.subscribe(DatarefSubscription { id: 1, frequency_hz: 5, path: "a".into() });
        bridge.record_udp_activity(t0);
        bridge.record_handshake(MINIMUM_PLUGIN_VERSION, true);

        let healthy_tick = t0 + Duration::from_secs(1);
        bridge.record_udp_activity(healthy_tick);
        let result = bridge.gate_tick(healthy_tick).unwrap();
        assert!(result.is_empty());
        assert!(bridge.is_sim_connected());

        let lapsed = t0 + Duration::from_secs(17);
        let result = bridge.gate_tick(lapsed).unwrap();
        assert!(result.iter().any(|d| d.starts_with(b"RREF\0")), "must re-send the prior subscription");
        assert!(result.iter().any(|d| d.starts_with(b"CMND\0")));
        assert!(bridge.subscribed_ids().is_empty());
        assert!(!bridge.is_sim_connected());
    }

    #[test]
    fn plugin_below_floor_raises_incompatible() {
        let t0 = Instant::now();
        let mut bridge = SimulatorBridge::new(t0);
        bridge.record_udp_activity(t0);
        bridge.record_handshake(MINIMUM_PLUGIN_VERSION - 1, true);
        let tick = t0 + Duration::from_secs(1);
        bridge.record_udp_activity(tick);
        let err = bridge.gate_tick(tick).unwrap_err();
        assert!(matches!(err, ClientError::PluginIncompatible { .. }));
    }

    #[test]
    fn plugin_message_round_trips_through_msgpack() {
        let message = PluginMessage {
            kind: "ADD".to_string(),
            dto: serde_json::json!({"callsign": "UAL123", "type_code": "B738"}),
        };
        let bytes = message.encode().unwrap();
        let decoded = PluginMessage::decode(&bytes).unwrap();
        assert_eq!(decoded, message);
    }
}
