//! Event types fanned out between managers. Cross-component contact is
//! one-way events plus direct commands to lower layers; there are no
//! call-back cycles. The network manager (component I) is the only thing
//! that `match`es all of these; individual managers emit the subset
//! relevant to their domain.

use fsd_protocol::position::{AircraftVisualState, FullVelocity};
use fsd_protocol::{AircraftConfiguration, ServerErrorCode};

use crate::controllers::Controller;
use crate::remote_aircraft::SimCommand;

/// Events raised by the FSD client (component C).
#[derive(Debug, Clone)]
pub enum FsdEvent {
    NetworkConnected,
    NetworkDisconnected,
    ForciblyDisconnected { reason: String },
    ServerError { code: ServerErrorCode, description: String },
    RawDataReceived(String),
    RawDataSent(String),
}

/// Events raised by the remote-aircraft manager (component F) for the sim
/// bridge and UI layers to observe.
#[derive(Debug, Clone)]
pub enum RemoteAircraftEvent {
    Added { callsign: String },
    ConfigChanged { callsign: String, configuration: AircraftConfiguration },
    ModelChanged { callsign: String, type_code: String },
    Deleted { callsign: String },
}

/// Events raised by the controller set (component G).
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    Added(Controller),
    Deleted { callsign: String },
    RadioAliasChanged { radio_index: u8, frequency_hz: u32 },
}

/// Events raised by the network manager for the voice adapter and UI.
#[derive(Debug, Clone)]
pub enum NetworkManagerEvent {
    SelcalAlert,
    RadioMessageReceived { from: String, text: String, is_direct: bool },
    CapabilitiesRequestReceived { from: String },
    RealNameReceived { from: String, name: String },
    AtisReceived { from: String, lines: Vec<String> },
    IsValidAtcReceived { from: String, is_valid: bool },
}

/// Sim-state snapshot pushed from the bridge (component D) to the
/// broadcaster, remote-aircraft manager, and voice adapter every tick.
#[derive(Debug, Clone)]
pub struct UserAircraftState {
    pub visual_state: AircraftVisualState,
    pub velocity: FullVelocity,
    pub on_ground: bool,
    pub paused: bool,
    pub msl_altitude_m: f64,
    pub qnh_mb: f64,
    pub pressure_altitude_ft: Option<f64>,
}

/// Everything the network manager's dispatch loop can hand back to a
/// caller in one pass: events from every manager it fans traffic out to,
/// plus commands the simulator bridge still needs to act on.
#[derive(Debug, Clone)]
pub enum ManagerOutput {
    Network(NetworkManagerEvent),
    RemoteAircraft(RemoteAircraftEvent),
    Controller(ControllerEvent),
    SimCommand(SimCommand),
}
