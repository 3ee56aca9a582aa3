//! The `AircraftConfiguration` record carried inside a `$CQ ACC` payload.
//!
//! `is_full_data` distinguishes a full snapshot from an incremental delta;
//! absence of the field means incremental. It is never serialized on an
//! incremental payload and must never be treated as ambiguous on receipt.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::PduParseError;

#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct EngineState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub running: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reversing: Option<bool>,
}

impl EngineState {
    fn merge_from(&mut self, delta: &EngineState) {
        if delta.running.is_some() {
            self.running = delta.running;
        }
        if delta.reversing.is_some() {
            self.reversing = delta.reversing;
        }
    }

    fn is_empty(&self) -> bool {
        self.running.is_none() && self.reversing.is_none()
    }

    fn diff_from(&self, other: &EngineState) -> Option<EngineState> {
        let d = EngineState {
            running: (self.running != other.running).then_some(other.running).flatten(),
            reversing: (self.reversing != other.reversing)
                .then_some(other.reversing)
                .flatten(),
        };
        (!d.is_empty()).then_some(d)
    }
}

#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct EnginesState {
    #[serde(rename = "1", skip_serializing_if = "Option::is_none")]
    pub engine1: Option<EngineState>,
    #[serde(rename = "2", skip_serializing_if = "Option::is_none")]
    pub engine2: Option<EngineState>,
    #[serde(rename = "3", skip_serializing_if = "Option::is_none")]
    pub engine3: Option<EngineState>,
    #[serde(rename = "4", skip_serializing_if = "Option::is_none")]
    pub engine4: Option<EngineState>,
}

macro_rules! engine_slot_merge {
    ($self:ident, $delta:ident, $field:ident) => {
        if let Some(d) = $delta.$field {
            match &mut $self.$field {
                Some(existing) => existing.merge_from(&d),
                None => $self.$field = Some(d),
            }
        }
    };
}

impl EnginesState {
    fn merge_from(&mut self, delta: &EnginesState) {
        engine_slot_merge!(self, delta, engine1);
        engine_slot_merge!(self, delta, engine2);
        engine_slot_merge!(self, delta, engine3);
        engine_slot_merge!(self, delta, engine4);
    }

    fn diff_from(&self, other: &EnginesState) -> Option<EnginesState> {
        let d = EnginesState {
            engine1: diff_slot(self.engine1, other.engine1),
            engine2: diff_slot(self.engine2, other.engine2),
            engine3: diff_slot(self.engine3, other.engine3),
            engine4: diff_slot(self.engine4, other.engine4),
        };
        let empty = d.engine1.is_none()
            && d.engine2.is_none()
            && d.engine3.is_none()
            && d.engine4.is_none();
        (!empty).then_some(d)
    }
}

fn diff_slot(old: Option<EngineState>, new: Option<EngineState>) -> Option<EngineState> {
    match (old, new) {
        (None, Some(n)) => Some(n),
        (Some(o), Some(n)) => o.diff_from(&n),
        _ => None,
    }
}

#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct LightsState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strobe_on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landing_on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taxi_on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beacon_on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nav_on: Option<bool>,
}

impl LightsState {
    fn merge_from(&mut self, delta: &LightsState) {
        if delta.strobe_on.is_some() {
            self.strobe_on = delta.strobe_on;
        }
        if delta.landing_on.is_some() {
            self.landing_on = delta.landing_on;
        }
        if delta.taxi_on.is_some() {
            self.taxi_on = delta.taxi_on;
        }
        if delta.beacon_on.is_some() {
            self.beacon_on = delta.beacon_on;
        }
        if delta.nav_on.is_some() {
            self.nav_on = delta.nav_on;
        }
    }

    fn is_empty(&self) -> bool {
        self.strobe_on.is_none()
            && self.landing_on.is_none()
            && self.taxi_on.is_none()
            && self.beacon_on.is_none()
            && self.nav_on.is_none()
    }

    fn diff_from(&self, other: &LightsState) -> Option<LightsState> {
        let d = LightsState {
            strobe_on: (self.strobe_on != other.strobe_on).then_some(other.strobe_on).flatten(),
            landing_on: (self.landing_on != other.landing_on)
                .then_some(other.landing_on)
                .flatten(),
            taxi_on: (self.taxi_on != other.taxi_on).then_some(other.taxi_on).flatten(),
            beacon_on: (self.beacon_on != other.beacon_on)
                .then_some(other.beacon_on)
                .flatten(),
            nav_on: (self.nav_on != other.nav_on).then_some(other.nav_on).flatten(),
        };
        (!d.is_empty()).then_some(d)
    }
}

/// Round a flap percentage to the nearest 5.
pub fn round_flaps_pct(pct: i32) -> i32 {
    ((pct as f64 / 5.0).round() as i32) * 5
}

#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct AircraftConfiguration {
    /// Present only on a full snapshot; absence means this is incremental.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_full_data: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gear_down: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flaps_pct: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spoilers_out: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_ground: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engines: Option<EnginesState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lights: Option<LightsState>,
}

impl AircraftConfiguration {
    pub fn is_full(&self) -> bool {
        self.is_full_data.unwrap_or(false)
    }

    /// Apply an incremental delta on top of `self`, returning the merged
    /// configuration. `self` is treated as the baseline; only fields present
    /// in `delta` are overwritten, and engines/lights merge element-wise.
    pub fn apply_incremental(&self, delta: &AircraftConfiguration) -> AircraftConfiguration {
        let mut merged = *self;
        merged.is_full_data = self.is_full_data;
        if delta.gear_down.is_some() {
            merged.gear_down = delta.gear_down;
        }
        if delta.flaps_pct.is_some() {
            merged.flaps_pct = delta.flaps_pct.map(round_flaps_pct);
        }
        if delta.spoilers_out.is_some() {
            merged.spoilers_out = delta.spoilers_out;
        }
        if delta.on_ground.is_some() {
            merged.on_ground = delta.on_ground;
        }
        if let Some(d) = &delta.engines {
            match &mut merged.engines {
                Some(existing) => existing.merge_from(d),
                None => merged.engines = Some(*d),
            }
        }
        if let Some(d) = &delta.lights {
            match &mut merged.lights {
                Some(existing) => existing.merge_from(d),
                None => merged.lights = Some(*d),
            }
        }
        merged
    }

    /// Compute the incremental delta that, applied to `self` via
    /// [`apply_incremental`], produces `other`. Contains only the fields
    /// that differ; `is_full_data` is never set on the result.
    pub fn diff(&self, other: &AircraftConfiguration) -> AircraftConfiguration {
        AircraftConfiguration {
            is_full_data: None,
            gear_down: (self.gear_down != other.gear_down).then_some(other.gear_down).flatten(),
            flaps_pct: (self.flaps_pct != other.flaps_pct).then_some(other.flaps_pct).flatten(),
            spoilers_out: (self.spoilers_out != other.spoilers_out)
                .then_some(other.spoilers_out)
                .flatten(),
            on_ground: (self.on_ground != other.on_ground).then_some(other.on_ground).flatten(),
            engines: match (&self.engines, &other.engines) {
                (None, Some(n)) => Some(*n),
                (Some(o), Some(n)) => o.diff_from(n),
                _ => None,
            },
            lights: match (&self.lights, &other.lights) {
                (None, Some(n)) => Some(*n),
                (Some(o), Some(n)) => o.diff_from(n),
                _ => None,
            },
        }
    }

    pub fn is_empty_diff(&self) -> bool {
        self.gear_down.is_none()
            && self.flaps_pct.is_none()
            && self.spoilers_out.is_none()
            && self.on_ground.is_none()
            && self.engines.is_none()
            && self.lights.is_none()
    }
}

impl FromStr for AircraftConfiguration {
    type Err = PduParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: Value = serde_json::from_str(s)
            .map_err(|_| PduParseError::InvalidAircraftConfig(s.to_string()))?;
        let config_val = value
            .get("config")
            .ok_or_else(|| PduParseError::InvalidAircraftConfig(s.to_string()))?
            .clone();
        serde_json::from_value(config_val)
            .map_err(|_| PduParseError::InvalidAircraftConfig(s.to_string()))
    }
}

impl fmt::Display for AircraftConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let wrapped = json!({ "config": self });
        write!(f, "{wrapped}")
    }
}
