use std::fmt;
use std::str::FromStr;

use crate::error::PduParseError;

/// VATSIM-style network rating, wire-encoded as an integer 1..12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkRating {
    Observer = 1,
    S1 = 2,
    S2 = 3,
    S3 = 4,
    C1 = 5,
    C2 = 6,
    C3 = 7,
    I1 = 8,
    I2 = 9,
    I3 = 10,
    Supervisor = 11,
    Administrator = 12,
}

impl FromStr for NetworkRating {
    type Err = PduParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u8 = s
            .parse()
            .map_err(|_| PduParseError::InvalidRating(s.to_string()))?;
        Ok(match n {
            1 => NetworkRating::Observer,
            2 => NetworkRating::S1,
            3 => NetworkRating::S2,
            4 => NetworkRating::S3,
            5 => NetworkRating::C1,
            6 => NetworkRating::C2,
            7 => NetworkRating::C3,
            8 => NetworkRating::I1,
            9 => NetworkRating::I2,
            10 => NetworkRating::I3,
            11 => NetworkRating::Supervisor,
            12 => NetworkRating::Administrator,
            _ => return Err(PduParseError::InvalidRating(s.to_string())),
        })
    }
}

impl fmt::Display for NetworkRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// ATC facility type, wire-encoded as an integer 0..6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkFacility {
    Observer = 0,
    Flight = 1,
    Ground = 2,
    Tower = 3,
    Approach = 4,
    Center = 5,
    FirControl = 6,
}

impl FromStr for NetworkFacility {
    type Err = PduParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u8 = s
            .parse()
            .map_err(|_| PduParseError::InvalidFacility(s.to_string()))?;
        Ok(match n {
            0 => NetworkFacility::Observer,
            1 => NetworkFacility::Flight,
            2 => NetworkFacility::Ground,
            3 => NetworkFacility::Tower,
            4 => NetworkFacility::Approach,
            5 => NetworkFacility::Center,
            6 => NetworkFacility::FirControl,
            _ => return Err(PduParseError::InvalidFacility(s.to_string())),
        })
    }
}

impl fmt::Display for NetworkFacility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// Wire protocol revision. Only four values have ever been issued; this
/// client transmits [`ProtocolRevision::Vatsim2022`] (101) exclusively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolRevision {
    Classic = 9,
    VatsimNoAuth = 10,
    Vatsim2021 = 100,
    Vatsim2022 = 101,
}

impl FromStr for ProtocolRevision {
    type Err = PduParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u16 = s
            .parse()
            .map_err(|_| PduParseError::InvalidProtocolRevision(s.to_string()))?;
        Ok(match n {
            9 => ProtocolRevision::Classic,
            10 => ProtocolRevision::VatsimNoAuth,
            100 => ProtocolRevision::Vatsim2021,
            101 => ProtocolRevision::Vatsim2022,
            _ => {
                return Err(PduParseError::InvalidProtocolRevision(s.to_string()))
            }
        })
    }
}

impl fmt::Display for ProtocolRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u16)
    }
}

/// Simulator type, wire-encoded as an integer 0..6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulatorType {
    Unknown = 0,
    MSFS95 = 1,
    MSFS98 = 2,
    MSCFS = 3,
    MSFS2000 = 4,
    MSFS2002 = 5,
    MSFS2004 = 6,
}

impl FromStr for SimulatorType {
    type Err = PduParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u8 = s
            .parse()
            .map_err(|_| PduParseError::InvalidSimulatorType(s.to_string()))?;
        Ok(match n {
            0 => SimulatorType::Unknown,
            1 => SimulatorType::MSFS95,
            2 => SimulatorType::MSFS98,
            3 => SimulatorType::MSCFS,
            4 => SimulatorType::MSFS2000,
            5 => SimulatorType::MSFS2002,
            6 => SimulatorType::MSFS2004,
            _ => return Err(PduParseError::InvalidSimulatorType(s.to_string())),
        })
    }
}

impl fmt::Display for SimulatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// Flight rules, wire-encoded by a single leading letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlightRules {
    Ifr,
    Vfr,
    Dvfr,
    Svfr,
}

impl FromStr for FlightRules {
    type Err = PduParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let first = s.chars().next().unwrap_or('\0').to_ascii_uppercase();
        Ok(match first {
            'I' => FlightRules::Ifr,
            'V' => FlightRules::Vfr,
            'D' => FlightRules::Dvfr,
            'S' => FlightRules::Svfr,
            _ => return Err(PduParseError::InvalidFlightRules(s.to_string())),
        })
    }
}

impl fmt::Display for FlightRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            FlightRules::Ifr => 'I',
            FlightRules::Vfr => 'V',
            FlightRules::Dvfr => 'D',
            FlightRules::Svfr => 'S',
        };
        write!(f, "{c}")
    }
}

/// Symbolic client-query token carried by `$CQ`/`$CR` PDUs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClientQueryType {
    IsValidAtc,
    Capabilities,
    Com1Freq,
    RealName,
    Server,
    AtcInfo,
    PublicIp,
    Inf,
    FlightPlan,
    NewInfo,
    NewAtis,
    SetState,
    AircraftConfig,
    /// Any symbolic token this client doesn't recognize; carried verbatim
    /// so an unrecognized-but-well-formed query can still be logged.
    Other(String),
}

impl FromStr for ClientQueryType {
    type Err = PduParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_uppercase().as_str() {
            "ATC" => ClientQueryType::IsValidAtc,
            "CAPS" => ClientQueryType::Capabilities,
            "C?" => ClientQueryType::Com1Freq,
            "RN" => ClientQueryType::RealName,
            "SV" => ClientQueryType::Server,
            "ATIS" => ClientQueryType::AtcInfo,
            "IP" => ClientQueryType::PublicIp,
            "INF" => ClientQueryType::Inf,
            "FP" => ClientQueryType::FlightPlan,
            "NEWINFO" => ClientQueryType::NewInfo,
            "NEWATIS" => ClientQueryType::NewAtis,
            "SS" => ClientQueryType::SetState,
            "ACC" => ClientQueryType::AircraftConfig,
            other => ClientQueryType::Other(other.to_string()),
        })
    }
}

impl fmt::Display for ClientQueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClientQueryType::IsValidAtc => "ATC",
            ClientQueryType::Capabilities => "CAPS",
            ClientQueryType::Com1Freq => "C?",
            ClientQueryType::RealName => "RN",
            ClientQueryType::Server => "SV",
            ClientQueryType::AtcInfo => "ATIS",
            ClientQueryType::PublicIp => "IP",
            ClientQueryType::Inf => "INF",
            ClientQueryType::FlightPlan => "FP",
            ClientQueryType::NewInfo => "NEWINFO",
            ClientQueryType::NewAtis => "NEWATIS",
            ClientQueryType::SetState => "SS",
            ClientQueryType::AircraftConfig => "ACC",
            ClientQueryType::Other(s) => s.as_str(),
        };
        write!(f, "{s}")
    }
}

/// Transponder squawk state carried by the slow pilot position PDU (`@`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SquawkState {
    Standby,
    ModeC,
    ModeCIdent,
}

impl FromStr for SquawkState {
    type Err = PduParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "S" => SquawkState::Standby,
            "N" => SquawkState::ModeC,
            "Y" => SquawkState::ModeCIdent,
            _ => return Err(PduParseError::InvalidSquawkState(s.to_string())),
        })
    }
}

impl fmt::Display for SquawkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            SquawkState::Standby => 'S',
            SquawkState::ModeC => 'N',
            SquawkState::ModeCIdent => 'Y',
        };
        write!(f, "{c}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_round_trips() {
        for n in 1..=12u8 {
            let r = NetworkRating::from_str(&n.to_string()).unwrap();
            assert_eq!(r.to_string(), n.to_string());
        }
    }

    #[test]
    fn flight_rules_first_letter() {
        assert_eq!(FlightRules::from_str("IFR").unwrap(), FlightRules::Ifr);
        assert_eq!(FlightRules::from_str("v").unwrap(), FlightRules::Vfr);
        assert!(FlightRules::from_str("").is_err());
    }

    #[test]
    fn client_query_unknown_is_preserved() {
        let q = ClientQueryType::from_str("WH").unwrap();
        assert_eq!(q.to_string(), "WH");
    }
}
