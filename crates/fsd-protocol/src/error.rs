use thiserror::Error;

/// Failure constructing a PDU from a raw wire line.
///
/// Every variant carries enough of the offending text to log it; the FSD
/// client (component C) wraps this in a [`crate::error::PduFormat`] alongside
/// the complete raw line and keeps the connection open.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PduParseError {
    #[error("expected at least {0} fields, found {1}")]
    InvalidFieldCount(usize, usize),
    #[error("{0} is not a valid network rating")]
    InvalidRating(String),
    #[error("{0} is not a valid network facility")]
    InvalidFacility(String),
    #[error("{0} is not a valid protocol revision")]
    InvalidProtocolRevision(String),
    #[error("{0} is not a valid simulator type")]
    InvalidSimulatorType(String),
    #[error("{0} is not a valid flight rules code")]
    InvalidFlightRules(String),
    #[error("{0} is not a valid client query type")]
    InvalidClientQueryType(String),
    #[error("{0} is not a valid squawk state")]
    InvalidSquawkState(String),
    #[error("{0} is not a valid transponder mode")]
    InvalidTransponderMode(String),
    #[error("{0} is not a valid numeric field")]
    InvalidNumber(String),
    #[error("{0} is not a valid pitch/bank/heading word")]
    InvalidPbh(String),
    #[error("unable to parse aircraft configuration payload: {0}")]
    InvalidAircraftConfig(String),
    #[error("{0} is not a valid ATIS line type")]
    InvalidAtisLineType(String),
    #[error("unrecognized PDU prefix: {0}")]
    UnknownPduType(String),
}

/// A fatal error number carried by a `$ER` PDU from the server.
///
/// Receiving any of these ends the session; everything else logged through
/// [`PduParseError`] is recoverable.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerErrorCode {
    #[error("callsign already in use")]
    CallsignInUse,
    #[error("callsign is invalid")]
    CallsignInvalid,
    #[error("already registered")]
    AlreadyRegistered,
    #[error("syntax error")]
    SyntaxError,
    #[error("invalid source callsign")]
    InvalidSourceCallsign,
    #[error("invalid logon")]
    InvalidLogon,
    #[error("no such callsign")]
    NoSuchCallsign,
    #[error("no flight plan")]
    NoFlightPlan,
    #[error("no weather profile")]
    NoWeatherProfile,
    #[error("invalid protocol revision")]
    InvalidProtocolRevision,
    #[error("requested level too high")]
    RequestedLevelTooHigh,
    #[error("server full")]
    ServerFull,
    #[error("certificate suspended")]
    CertificateSuspended,
    #[error("invalid control")]
    InvalidControl,
    #[error("invalid position for rating")]
    InvalidPositionForRating,
    #[error("unauthorized software")]
    UnauthorizedSoftware,
    #[error("authentication timed out")]
    AuthTimeout,
    #[error("other: {0}")]
    Other(u8),
}

impl ServerErrorCode {
    /// Whether this code should end the session.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ServerErrorCode::CallsignInUse
                | ServerErrorCode::CallsignInvalid
                | ServerErrorCode::AlreadyRegistered
                | ServerErrorCode::InvalidLogon
                | ServerErrorCode::InvalidProtocolRevision
                | ServerErrorCode::RequestedLevelTooHigh
                | ServerErrorCode::ServerFull
                | ServerErrorCode::CertificateSuspended
                | ServerErrorCode::InvalidPositionForRating
                | ServerErrorCode::UnauthorizedSoftware
        )
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            1 => ServerErrorCode::CallsignInUse,
            2 => ServerErrorCode::CallsignInvalid,
            3 => ServerErrorCode::AlreadyRegistered,
            4 => ServerErrorCode::SyntaxError,
            5 => ServerErrorCode::InvalidSourceCallsign,
            6 => ServerErrorCode::InvalidLogon,
            7 => ServerErrorCode::NoSuchCallsign,
            8 => ServerErrorCode::NoFlightPlan,
            9 => ServerErrorCode::NoWeatherProfile,
            10 => ServerErrorCode::InvalidProtocolRevision,
            11 => ServerErrorCode::RequestedLevelTooHigh,
            12 => ServerErrorCode::ServerFull,
            13 => ServerErrorCode::CertificateSuspended,
            14 => ServerErrorCode::InvalidControl,
            15 => ServerErrorCode::InvalidPositionForRating,
            16 => ServerErrorCode::UnauthorizedSoftware,
            17 => ServerErrorCode::AuthTimeout,
            other => ServerErrorCode::Other(other),
        }
    }

    /// The numeric code as carried on the wire.
    pub fn numeric_code(&self) -> u8 {
        match self {
            ServerErrorCode::CallsignInUse => 1,
            ServerErrorCode::CallsignInvalid => 2,
            ServerErrorCode::AlreadyRegistered => 3,
            ServerErrorCode::SyntaxError => 4,
            ServerErrorCode::InvalidSourceCallsign => 5,
            ServerErrorCode::InvalidLogon => 6,
            ServerErrorCode::NoSuchCallsign => 7,
            ServerErrorCode::NoFlightPlan => 8,
            ServerErrorCode::NoWeatherProfile => 9,
            ServerErrorCode::InvalidProtocolRevision => 10,
            ServerErrorCode::RequestedLevelTooHigh => 11,
            ServerErrorCode::ServerFull => 12,
            ServerErrorCode::CertificateSuspended => 13,
            ServerErrorCode::InvalidControl => 14,
            ServerErrorCode::InvalidPositionForRating => 15,
            ServerErrorCode::UnauthorizedSoftware => 16,
            ServerErrorCode::AuthTimeout => 17,
            ServerErrorCode::Other(n) => *n,
        }
    }
}
