//! Real-time pilot client core: mediates between a flight-simulator host,
//! the FSD multiplayer network, and an external voice-radio library.
//!
//! The network manager ([`network_manager::NetworkManager`]) is the
//! integrator; every other module in this crate owns one slice of domain
//! state and talks to its neighbors through the event types in
//! [`events`], never through shared mutable state.

pub mod broadcaster;
pub mod config;
pub mod controllers;
pub mod error;
pub mod events;
pub mod fsd_client;
pub mod network_manager;
pub mod remote_aircraft;
pub mod sim_bridge;
pub mod token_bucket;
pub mod voice;

pub use config::{BridgeEndpoints, ClientProperties, ConnectOptions, NetworkCredentials};
pub use error::ClientError;
pub use events::ManagerOutput;
pub use network_manager::NetworkManager;
