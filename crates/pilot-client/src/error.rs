//! The error kinds a session can hit, one variant per kind rather than per
//! call site — callers match on kind to decide fatal-vs-recoverable.

use fsd_protocol::{PduParseError, ServerErrorCode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// A malformed PDU. Logged with the raw line; the connection continues.
    #[error("malformed PDU ({raw:?}): {source}")]
    ProtocolDecode {
        raw: String,
        #[source]
        source: PduParseError,
    },

    /// JWT endpoint failure, or a fatal `$ER` from the server. Ends the
    /// session.
    #[error("authentication failed: {0}")]
    AuthFailure(String),

    /// Socket read/write/connect failure.
    #[error("transport error: {0}")]
    TransportError(String),

    /// Explicit `$!!` from the server.
    #[error("killed by server: {reason}")]
    Kill { reason: String },

    /// UDP heartbeat from the simulator lapsed past the 15 s liveness
    /// window. Not fatal; the bridge re-subscribes.
    #[error("simulator heartbeat lapsed")]
    SimGone,

    /// Plugin protocol version below the compile-time floor.
    #[error("plugin version {found} is below the minimum supported {minimum}")]
    PluginIncompatible { found: u32, minimum: u32 },

    /// No usable CSL models loaded by the plugin.
    #[error("no valid CSL model set is configured")]
    CslInvalid,

    /// The user tried to connect without satisfying a precondition
    /// (missing credentials, uncalibrated microphone). No network action
    /// is taken.
    #[error("cannot connect: {0}")]
    ConfigPrecondition(String),
}

impl ClientError {
    /// Whether this error should end the FSD session: only `AuthFailure`,
    /// `Kill`, and fatal `$ER` codes are fatal.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ClientError::AuthFailure(_) | ClientError::Kill { .. })
    }

    pub fn from_server_error(code: ServerErrorCode, description: &str) -> Option<Self> {
        if code.is_fatal() {
            Some(ClientError::AuthFailure(format!("{code}: {description}")))
        } else {
            None
        }
    }
}
