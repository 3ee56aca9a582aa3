//! Ephemeral inputs to `connect()`. Persisted settings (GUI, credential
//! storage) are out of core scope; this module only models what the
//! network manager needs for a single session.

/// Process-wide build constants: client id, private key, and the protocol
/// revision this client always transmits. These are the only process-wide
/// state; everything else is session state owned by the network manager.
pub mod build {
    use fsd_protocol::ProtocolRevision;

    pub const CLIENT_ID: u16 = 0x1234;
    pub const CLIENT_NAME: &str = "xpilot-rs";
    pub const CLIENT_VERSION_MAJOR: u16 = 1;
    pub const CLIENT_VERSION_MINOR: u16 = 0;
    /// Vendor-issued at build time in production; placeholder here since
    /// the real key is distributed out of band (see `fsd_protocol::auth`).
    pub const PRIVATE_KEY: &str = "xpilot-rs-dev-key";
    pub const PROTOCOL_REVISION: ProtocolRevision = ProtocolRevision::Vatsim2022;
    pub const MINIMUM_PLUGIN_VERSION: u32 = 30;
    /// External endpoint exchanging network credentials for the short-lived
    /// JWT sent as the FSD registration password.
    pub const AUTH_ENDPOINT: &str = "https://auth.vatsim.net/api/fsd-jwt";
}

/// Network login credentials for a single session.
#[derive(Debug, Clone)]
pub struct NetworkCredentials {
    pub cid: String,
    pub password: String,
}

/// Identity and aircraft details presented to the network for this flight.
#[derive(Debug, Clone)]
pub struct ClientProperties {
    pub callsign: String,
    pub type_code: String,
    pub real_name: String,
    pub selcal_code: Option<String>,
}

/// Arguments to [`crate::network_manager::NetworkManager::connect`].
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub server_address: String,
    pub credentials: NetworkCredentials,
    pub properties: ClientProperties,
    /// Connect as an ATC observer/towerview rather than as a pilot.
    pub observer: bool,
}

/// Host/port for the simulator plugin channel and an optional FSD address
/// override. Not part of the core contract; an implementer (the CLI) may
/// source these from the environment.
#[derive(Debug, Clone)]
pub struct BridgeEndpoints {
    pub plugin_host: String,
    pub plugin_port: u16,
    pub fsd_override: Option<String>,
}

impl Default for BridgeEndpoints {
    fn default() -> Self {
        BridgeEndpoints {
            plugin_host: "127.0.0.1".to_string(),
            plugin_port: 45810,
            fsd_override: None,
        }
    }
}
