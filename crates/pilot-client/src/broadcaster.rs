//! The own-aircraft broadcaster (component E): position cadence state
//! machine, altitude correction, and the config-diff token bucket.

use std::time::{Duration, Instant};

use fsd_protocol::position::{AircraftVisualState, FullVelocity};
use fsd_protocol::AircraftConfiguration;

use crate::token_bucket::TokenBucket;

const SLOW_INTERVAL_PILOT: Duration = Duration::from_secs(5);
const SLOW_INTERVAL_OBSERVER: Duration = Duration::from_secs(15);
const FAST_INTERVAL: Duration = Duration::from_millis(200);

/// True altitude transmitted on the wire: `msl_m × 3.28084 +
/// altimeter_temperature_error`.
pub fn transmit_true_altitude_ft(msl_m: f64, altimeter_temperature_error_ft: f64) -> f64 {
    msl_m * 3.28084 + altimeter_temperature_error_ft
}

/// Pressure altitude transmitted: the dedicated dataref when available,
/// else `msl_ft + (1013.25 − qnh_mb) · 30`.
pub fn transmit_pressure_altitude_ft(
    pressure_altitude_dataref_ft: Option<f64>,
    msl_ft: f64,
    qnh_mb: f64,
) -> f64 {
    pressure_altitude_dataref_ft.unwrap_or_else(|| msl_ft + (1013.25 - qnh_mb) * 30.0)
}

/// Adjust a received true altitude for our own temperature-error
/// compensation, weighted by vertical separation.
pub fn adjust_incoming_altitude_ft(
    received_true_altitude_ft: f64,
    own_true_altitude_ft: f64,
    altimeter_temperature_error_ft: f64,
) -> f64 {
    let separation = (received_true_altitude_ft - own_true_altitude_ft).abs();
    if separation <= 3000.0 {
        received_true_altitude_ft - altimeter_temperature_error_ft
    } else if separation <= 6000.0 {
        let weight = 1.0 - (separation - 3000.0) / 3000.0;
        received_true_altitude_ft - altimeter_temperature_error_ft * weight
    } else {
        received_true_altitude_ft
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionKind {
    Slow,
    FastMoving,
    FastZero,
    Stopped,
    AtcPosition,
}

pub struct Broadcaster {
    is_observer: bool,
    last_slow_tick: Instant,
    last_fast_tick: Instant,
    fast_armed: bool,
    config_baseline: Option<AircraftConfiguration>,
    config_tokens: TokenBucket,
}

impl Broadcaster {
    pub fn new(is_observer: bool, now: Instant) -> Self {
        Broadcaster {
            is_observer,
            last_slow_tick: now,
            last_fast_tick: now,
            fast_armed: false,
            config_baseline: None,
            config_tokens: TokenBucket::config_broadcast(now),
        }
    }

    fn slow_interval(&self) -> Duration {
        if self.is_observer {
            SLOW_INTERVAL_OBSERVER
        } else {
            SLOW_INTERVAL_PILOT
        }
    }

    /// The server armed fast-position updates (`$SF 1`).
    pub fn set_fast_armed(&mut self, armed: bool) {
        self.fast_armed = armed;
    }

    /// Decide what position PDU(s), if any, should go out this tick.
    /// Returns the kinds to emit in order.
    pub fn tick(&mut self, now: Instant, paused: bool, velocity: FullVelocity) -> Vec<PositionKind> {
        let mut out = Vec::new();

        if now.duration_since(self.last_slow_tick) >= self.slow_interval() {
            self.last_slow_tick = now;
            if paused {
                out.push(PositionKind::FastZero);
            } else if !velocity.is_zero() {
                out.push(PositionKind::FastMoving);
            }
            out.push(if self.is_observer { PositionKind::AtcPosition } else { PositionKind::Slow });
        }

        if self.fast_armed && now.duration_since(self.last_fast_tick) >= FAST_INTERVAL {
            self.last_fast_tick = now;
            if paused {
                out.push(PositionKind::FastZero);
            } else if !velocity.is_zero() {
                out.push(PositionKind::FastMoving);
            } else {
                out.push(PositionKind::Stopped);
            }
        }

        out
    }

    /// Config-diff broadcaster: stash the first baseline, otherwise emit an
    /// incremental delta gated by the token bucket.
    pub fn config_changed(
        &mut self,
        new_config: AircraftConfiguration,
        now: Instant,
    ) -> Option<AircraftConfiguration> {
        match &self.config_baseline {
            None => {
                self.config_baseline = Some(new_config);
                None
            }
            Some(baseline) => {
                if *baseline == new_config {
                    return None;
                }
                if !self.config_tokens.try_consume(now) {
                    return None;
                }
                let delta = baseline.diff(&new_config);
                self.config_baseline = Some(new_config);
                if delta.is_empty_diff() {
                    None
                } else {
                    Some(delta)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsd_protocol::position::VelocityVector;

    #[test]
    fn altitude_symmetry_when_colocated() {
        let error = 42.0;
        let transmitted = transmit_true_altitude_ft(1000.0, error);
        // Co-located (separation = 0) exactly undoes the temperature error.
        let adjusted = adjust_incoming_altitude_ft(transmitted, transmitted, error);
        assert!((adjusted - (transmitted - error)).abs() < 1e-9);
    }

    #[test]
    fn altitude_adjustment_scales_between_3000_and_6000() {
        let error = 100.0;
        let own = 10_000.0;
        let received = own + 4500.0; // separation 4500, weight = 1 - 1500/3000 = 0.5
        let adjusted = adjust_incoming_altitude_ft(received, own, error);
        assert!((adjusted - (received - error * 0.5)).abs() < 1e-9);
    }

    #[test]
    fn altitude_adjustment_untouched_beyond_6000() {
        let error = 100.0;
        let own = 10_000.0;
        let received = own + 7000.0;
        assert_eq!(adjust_incoming_altitude_ft(received, own, error), received);
    }

    #[test]
    fn stopped_variant_not_elided() {
        let now = Instant::now();
        let mut b = Broadcaster::new(false, now);
        b.set_fast_armed(true);
        let later = now + Duration::from_millis(200);
        let kinds = b.tick(later, false, FullVelocity::default());
        assert!(kinds.contains(&PositionKind::Stopped));
    }

    #[test]
    fn moving_aircraft_sends_fast_not_stopped() {
        let now = Instant::now();
        let mut b = Broadcaster::new(false, now);
        b.set_fast_armed(true);
        let later = now + Duration::from_millis(200);
        let velocity = FullVelocity {
            linear: VelocityVector { x: 10.0, y: 0.0, z: 0.0 },
            rotational: VelocityVector::ZERO,
        };
        let kinds = b.tick(later, false, velocity);
        assert!(kinds.contains(&PositionKind::FastMoving));
        assert!(!kinds.contains(&PositionKind::Stopped));
    }

    #[test]
    fn config_diff_round_trips_through_apply() {
        let now = Instant::now();
        let mut b = Broadcaster::new(false, now);
        let baseline: AircraftConfiguration =
            r#"{"config":{"is_full_data":true,"gear_down":true,"flaps_pct":0}}"#.parse().unwrap();
        assert!(b.config_changed(baseline.clone(), now).is_none());

        let updated: AircraftConfiguration =
            r#"{"config":{"is_full_data":true,"gear_down":false,"flaps_pct":0}}"#.parse().unwrap();
        let delta = b.config_changed(updated.clone(), now).expect("should emit a delta");
        let applied = baseline.apply_incremental(&delta);
        assert_eq!(applied.gear_down, updated.gear_down);
    }
}
