//! FSD protocol PDU codec and authentication primitives.
//!
//! This crate is pure and synchronous: it knows how to turn wire lines into
//! [`pdu::FsdPdu`] values and back, and nothing about sockets, tokio, or the
//! simulator. The client runtime living in `pilot-client` owns the TCP
//! connection and drives this codec one line at a time.

pub mod aircraft_config;
pub mod auth;
pub mod enums;
pub mod error;
pub mod pdu;
pub mod position;

pub use aircraft_config::{AircraftConfiguration, EngineState, EnginesState, LightsState};
pub use auth::{generate_auth_challenge, generate_auth_response, md5_hex};
pub use enums::{
    ClientQueryType, FlightRules, NetworkFacility, NetworkRating, ProtocolRevision,
    SimulatorType, SquawkState,
};
pub use error::{PduParseError, ServerErrorCode};
pub use pdu::{FlightPlan, FsdPdu, QueryPayload};
pub use position::{
    pack_pitch_bank_heading, unpack_pitch_bank_heading, AircraftVisualState, FullVelocity,
    VelocityVector,
};
