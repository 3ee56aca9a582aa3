//! The wire codec (component A): one [`FsdPdu`] variant per tag, each
//! parsed from and serialized to the colon-delimited, CRLF-terminated line
//! format carried over the FSD TCP stream.
//!
//! Parsing never panics: malformed input always returns [`PduParseError`],
//! never a default/garbage value.

use std::fmt;

use crate::aircraft_config::AircraftConfiguration;
use crate::enums::{
    ClientQueryType, FlightRules, NetworkFacility, NetworkRating, ProtocolRevision, SimulatorType,
    SquawkState,
};
use crate::error::{PduParseError, ServerErrorCode};
use crate::position::{pack_pitch_bank_heading, unpack_pitch_bank_heading, FullVelocity};

/// A flight plan as carried by `$FP`: 15 colon-delimited fields after the
/// sender/recipient pair.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightPlan {
    pub flight_rules: FlightRules,
    pub aircraft_type: String,
    pub filed_tas: u16,
    pub origin: String,
    pub estimated_departure: String,
    pub actual_departure: String,
    pub cruise_altitude: String,
    pub destination: String,
    pub hours_enroute: u8,
    pub minutes_enroute: u8,
    pub hours_fuel: u8,
    pub minutes_fuel: u8,
    pub alternate: String,
    pub remarks: String,
    pub route: String,
}

impl fmt::Display for FlightPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}:{}:{}:{}:{}:{}:{}:{}:{}:{}:{}",
            self.flight_rules,
            self.aircraft_type,
            self.filed_tas,
            self.origin,
            self.estimated_departure,
            self.actual_departure,
            self.cruise_altitude,
            self.destination,
            self.hours_enroute,
            self.minutes_enroute,
            self.hours_fuel,
            self.minutes_fuel,
            self.alternate,
            self.remarks,
            self.route,
        )
    }
}

impl FlightPlan {
    fn parse(fields: &[&str]) -> Result<Self, PduParseError> {
        if fields.len() != 15 {
            return Err(PduParseError::InvalidFieldCount(15, fields.len()));
        }
        Ok(FlightPlan {
            flight_rules: fields[0]
                .parse()
                .map_err(|_| PduParseError::InvalidFlightRules(fields[0].to_string()))?,
            aircraft_type: fields[1].to_string(),
            filed_tas: fields[2]
                .parse()
                .map_err(|_| PduParseError::InvalidNumber(fields[2].to_string()))?,
            origin: fields[3].to_string(),
            estimated_departure: fields[4].to_string(),
            actual_departure: fields[5].to_string(),
            cruise_altitude: fields[6].to_string(),
            destination: fields[7].to_string(),
            hours_enroute: fields[8]
                .parse()
                .map_err(|_| PduParseError::InvalidNumber(fields[8].to_string()))?,
            minutes_enroute: fields[9]
                .parse()
                .map_err(|_| PduParseError::InvalidNumber(fields[9].to_string()))?,
            hours_fuel: fields[10]
                .parse()
                .map_err(|_| PduParseError::InvalidNumber(fields[10].to_string()))?,
            minutes_fuel: fields[11]
                .parse()
                .map_err(|_| PduParseError::InvalidNumber(fields[11].to_string()))?,
            alternate: fields[12].to_string(),
            remarks: fields[13].to_string(),
            route: fields[14].to_string(),
        })
    }
}

/// Payload carried by a `$CQ`/`$CR` pair: either a bare symbolic token or one
/// that takes a single trailing argument.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryPayload {
    Bare,
    Text(String),
    AircraftConfig(AircraftConfiguration),
}

impl fmt::Display for QueryPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryPayload::Bare => Ok(()),
            QueryPayload::Text(s) => write!(f, ":{s}"),
            QueryPayload::AircraftConfig(c) => write!(f, ":{c}"),
        }
    }
}

/// One parsed or constructed FSD protocol data unit.
///
/// Every variant round-trips: `FsdPdu::parse(&pdu.to_string()).unwrap() ==
/// pdu` for well-formed inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum FsdPdu {
    PilotPosition {
        squawk: SquawkState,
        callsign: String,
        transponder_code: u16,
        rating: NetworkRating,
        lat: f64,
        lon: f64,
        true_altitude: i32,
        ground_speed: u16,
        pitch: f64,
        bank: f64,
        heading: f64,
        pressure_altitude_diff: i32,
    },
    AtcPosition {
        callsign: String,
        frequency_khz: u32,
        facility: NetworkFacility,
        visual_range: u16,
        rating: NetworkRating,
        lat: f64,
        lon: f64,
        elevation: i32,
    },
    FastPilotPosition {
        callsign: String,
        lat: f64,
        lon: f64,
        true_altitude: f64,
        altitude_agl: f64,
        pitch: f64,
        bank: f64,
        heading: f64,
        velocity: FullVelocity,
        nose_wheel_angle: Option<f64>,
    },
    SlowPilotPosition {
        callsign: String,
        lat: f64,
        lon: f64,
        true_altitude: f64,
        altitude_agl: f64,
        pitch: f64,
        bank: f64,
        heading: f64,
        velocity: FullVelocity,
        nose_wheel_angle: Option<f64>,
    },
    StoppedPilotPosition {
        callsign: String,
        lat: f64,
        lon: f64,
        true_altitude: f64,
        altitude_agl: f64,
        pitch: f64,
        bank: f64,
        heading: f64,
    },
    AtcRegister {
        from: String,
        to: String,
        real_name: String,
        cid: String,
        password: String,
        rating: NetworkRating,
        protocol: ProtocolRevision,
    },
    PilotRegister {
        from: String,
        to: String,
        cid: String,
        password: String,
        rating: NetworkRating,
        protocol: ProtocolRevision,
        simulator_type: SimulatorType,
        real_name: String,
    },
    AtcDeregister {
        from: String,
        cid: String,
    },
    PilotDeregister {
        from: String,
        cid: String,
    },
    TextMessage {
        from: String,
        to: String,
        text: String,
    },
    PlaneInfoRequest {
        from: String,
        to: String,
    },
    PlaneInfoResponse {
        from: String,
        to: String,
        info: String,
    },
    InitialServerHandshake {
        from: String,
        to: String,
        version: String,
        initial_key: String,
    },
    InitialClientHandshake {
        from: String,
        to: String,
        client_id: u16,
        client_name: String,
        major_version: u16,
        minor_version: u16,
        cid: String,
        system_uid: String,
        initial_challenge: Option<String>,
    },
    Ping {
        from: String,
        to: String,
        timestamp: String,
    },
    Pong {
        from: String,
        to: String,
        timestamp: String,
    },
    ClientQuery {
        from: String,
        to: String,
        query_type: ClientQueryType,
        payload: QueryPayload,
    },
    ClientQueryResponse {
        from: String,
        to: String,
        query_type: ClientQueryType,
        payload: QueryPayload,
    },
    AuthChallenge {
        from: String,
        to: String,
        challenge: String,
    },
    AuthResponse {
        from: String,
        to: String,
        response: String,
    },
    Kill {
        from: String,
        to: String,
        reason: Option<String>,
    },
    ServerError {
        from: String,
        to: String,
        code: ServerErrorCode,
        offending: String,
        description: String,
    },
    SendFastPositionUpdates {
        from: String,
        to: String,
        send_fast: bool,
    },
    MetarRequest {
        from: String,
        to: String,
        station: String,
    },
    MetarResponse {
        from: String,
        to: String,
        metar: String,
    },
    FlightPlan {
        callsign: String,
        to: String,
        plan: FlightPlan,
    },
}

fn split_fields(body: &str) -> Vec<&str> {
    body.split(':').collect()
}

fn tag_and_rest(line: &str) -> Result<(&str, &str), PduParseError> {
    for tag in [
        "#AA", "#AP", "#DA", "#DP", "#TM", "#SB", "#SL", "#ST", "$DI", "$ID", "$PI", "$PO", "$CQ",
        "$CR", "$ZC", "$ZR", "$!!", "$ER", "$SF", "$AX", "$AR", "$FP",
    ] {
        if let Some(rest) = line.strip_prefix(tag) {
            return Ok((tag, rest));
        }
    }
    if let Some(rest) = line.strip_prefix('@') {
        return Ok(("@", rest));
    }
    if let Some(rest) = line.strip_prefix('^') {
        return Ok(("^", rest));
    }
    if let Some(rest) = line.strip_prefix('%') {
        return Ok(("%", rest));
    }
    Err(PduParseError::UnknownPduType(line.to_string()))
}

fn require(fields: &[&str], n: usize) -> Result<(), PduParseError> {
    if fields.len() < n {
        Err(PduParseError::InvalidFieldCount(n, fields.len()))
    } else {
        Ok(())
    }
}

impl FsdPdu {
    /// Parse a single line with trailing CRLF/LF already stripped.
    pub fn parse(line: &str) -> Result<Self, PduParseError> {
        let (tag, rest) = tag_and_rest(line)?;
        match tag {
            "@" => {
                // squawk-state:callsign:code:rating:lat:lon:alt:gs:pbh:alt_diff
                // the squawk-state char is its own colon-delimited field, not a
                // bare prefix glued onto the callsign.
                let fields = split_fields(rest);
                require(&fields, 10)?;
                let squawk: SquawkState = fields[0].parse()?;
                let pbh: u32 = fields[8]
                    .parse()
                    .map_err(|_| PduParseError::InvalidPbh(fields[8].to_string()))?;
                let (pitch, bank, heading) = unpack_pitch_bank_heading(pbh);
                Ok(FsdPdu::PilotPosition {
                    squawk,
                    callsign: fields[1].to_string(),
                    transponder_code: fields[2]
                        .parse()
                        .map_err(|_| PduParseError::InvalidNumber(fields[2].to_string()))?,
                    rating: fields[3].parse()?,
                    lat: fields[4]
                        .parse()
                        .map_err(|_| PduParseError::InvalidNumber(fields[4].to_string()))?,
                    lon: fields[5]
                        .parse()
                        .map_err(|_| PduParseError::InvalidNumber(fields[5].to_string()))?,
                    true_altitude: fields[6]
                        .parse()
                        .map_err(|_| PduParseError::InvalidNumber(fields[6].to_string()))?,
                    ground_speed: fields[7]
                        .parse()
                        .map_err(|_| PduParseError::InvalidNumber(fields[7].to_string()))?,
                    pitch,
                    bank,
                    heading,
                    pressure_altitude_diff: fields[9]
                        .parse()
                        .map_err(|_| PduParseError::InvalidNumber(fields[9].to_string()))?,
                })
            }
            "%" => {
                let fields = split_fields(rest);
                require(&fields, 7)?;
                Ok(FsdPdu::AtcPosition {
                    callsign: fields[0].to_string(),
                    frequency_khz: fields[1]
                        .parse()
                        .map_err(|_| PduParseError::InvalidNumber(fields[1].to_string()))?,
                    facility: fields[2].parse()?,
                    visual_range: fields[3]
                        .parse()
                        .map_err(|_| PduParseError::InvalidNumber(fields[3].to_string()))?,
                    rating: fields[4].parse()?,
                    lat: fields[5]
                        .parse()
                        .map_err(|_| PduParseError::InvalidNumber(fields[5].to_string()))?,
                    lon: fields[6]
                        .parse()
                        .map_err(|_| PduParseError::InvalidNumber(fields[6].to_string()))?,
                    elevation: fields.get(7).and_then(|s| s.parse().ok()).unwrap_or(0),
                })
            }
            "^" | "#SL" | "#ST" => {
                let fields = split_fields(rest);
                require(&fields, 6)?;
                let pbh: u32 = fields[5]
                    .parse()
                    .map_err(|_| PduParseError::InvalidPbh(fields[5].to_string()))?;
                let (pitch, bank, heading) = unpack_pitch_bank_heading(pbh);
                if tag == "#ST" {
                    return Ok(FsdPdu::StoppedPilotPosition {
                        callsign: fields[0].to_string(),
                        lat: fields[1]
                            .parse()
                            .map_err(|_| PduParseError::InvalidNumber(fields[1].to_string()))?,
                        lon: fields[2]
                            .parse()
                            .map_err(|_| PduParseError::InvalidNumber(fields[2].to_string()))?,
                        true_altitude: fields[3]
                            .parse()
                            .map_err(|_| PduParseError::InvalidNumber(fields[3].to_string()))?,
                        altitude_agl: fields[4]
                            .parse()
                            .map_err(|_| PduParseError::InvalidNumber(fields[4].to_string()))?,
                        pitch,
                        bank,
                        heading,
                    });
                }
                require(&fields, 12)?;
                let velocity = FullVelocity {
                    linear: crate::position::VelocityVector {
                        x: fields[6]
                            .parse()
                            .map_err(|_| PduParseError::InvalidNumber(fields[6].to_string()))?,
                        y: fields[7]
                            .parse()
                            .map_err(|_| PduParseError::InvalidNumber(fields[7].to_string()))?,
                        z: fields[8]
                            .parse()
                            .map_err(|_| PduParseError::InvalidNumber(fields[8].to_string()))?,
                    },
                    rotational: crate::position::VelocityVector {
                        x: fields[9]
                            .parse()
                            .map_err(|_| PduParseError::InvalidNumber(fields[9].to_string()))?,
                        y: fields[10]
                            .parse()
                            .map_err(|_| PduParseError::InvalidNumber(fields[10].to_string()))?,
                        z: fields[11]
                            .parse()
                            .map_err(|_| PduParseError::InvalidNumber(fields[11].to_string()))?,
                    },
                };
                let nose_wheel_angle = fields.get(12).and_then(|s| s.parse().ok());
                let callsign = fields[0].to_string();
                let lat = fields[1]
                    .parse()
                    .map_err(|_| PduParseError::InvalidNumber(fields[1].to_string()))?;
                let lon = fields[2]
                    .parse()
                    .map_err(|_| PduParseError::InvalidNumber(fields[2].to_string()))?;
                let true_altitude = fields[3]
                    .parse()
                    .map_err(|_| PduParseError::InvalidNumber(fields[3].to_string()))?;
                let altitude_agl = fields[4]
                    .parse()
                    .map_err(|_| PduParseError::InvalidNumber(fields[4].to_string()))?;
                if tag == "^" {
                    Ok(FsdPdu::FastPilotPosition {
                        callsign,
                        lat,
                        lon,
                        true_altitude,
                        altitude_agl,
                        pitch,
                        bank,
                        heading,
                        velocity,
                        nose_wheel_angle,
                    })
                } else {
                    Ok(FsdPdu::SlowPilotPosition {
                        callsign,
                        lat,
                        lon,
                        true_altitude,
                        altitude_agl,
                        pitch,
                        bank,
                        heading,
                        velocity,
                        nose_wheel_angle,
                    })
                }
            }
            "#AA" => {
                let fields = split_fields(rest);
                require(&fields, 7)?;
                Ok(FsdPdu::AtcRegister {
                    from: fields[0].to_string(),
                    to: fields[1].to_string(),
                    real_name: fields[2].to_string(),
                    cid: fields[3].to_string(),
                    password: fields[4].to_string(),
                    rating: fields[5].parse()?,
                    protocol: fields[6].parse()?,
                })
            }
            "#AP" => {
                let fields = split_fields(rest);
                require(&fields, 8)?;
                Ok(FsdPdu::PilotRegister {
                    from: fields[0].to_string(),
                    to: fields[1].to_string(),
                    cid: fields[2].to_string(),
                    password: fields[3].to_string(),
                    rating: fields[4].parse()?,
                    protocol: fields[5].parse()?,
                    simulator_type: fields[6].parse()?,
                    real_name: fields[7].to_string(),
                })
            }
            "#DA" => {
                let fields = split_fields(rest);
                require(&fields, 2)?;
                Ok(FsdPdu::AtcDeregister {
                    from: fields[0].to_string(),
                    cid: fields[1].to_string(),
                })
            }
            "#DP" => {
                let fields = split_fields(rest);
                require(&fields, 2)?;
                Ok(FsdPdu::PilotDeregister {
                    from: fields[0].to_string(),
                    cid: fields[1].to_string(),
                })
            }
            "#TM" => {
                let fields = split_fields(rest);
                require(&fields, 3)?;
                Ok(FsdPdu::TextMessage {
                    from: fields[0].to_string(),
                    to: fields[1].to_string(),
                    text: fields[2..].join(":"),
                })
            }
            "#SB" => {
                let fields = split_fields(rest);
                require(&fields, 3)?;
                match fields[2] {
                    "PIR" => Ok(FsdPdu::PlaneInfoRequest {
                        from: fields[0].to_string(),
                        to: fields[1].to_string(),
                    }),
                    "PI" => {
                        require(&fields, 5)?;
                        Ok(FsdPdu::PlaneInfoResponse {
                            from: fields[0].to_string(),
                            to: fields[1].to_string(),
                            info: fields[4..].join(":"),
                        })
                    }
                    other => Err(PduParseError::InvalidAircraftConfig(other.to_string())),
                }
            }
            "$DI" => {
                let fields = split_fields(rest);
                require(&fields, 4)?;
                Ok(FsdPdu::InitialServerHandshake {
                    from: fields[0].to_string(),
                    to: fields[1].to_string(),
                    version: fields[2].to_string(),
                    initial_key: fields[3].to_string(),
                })
            }
            "$ID" => {
                let fields = split_fields(rest);
                require(&fields, 7)?;
                Ok(FsdPdu::InitialClientHandshake {
                    from: fields[0].to_string(),
                    to: fields[1].to_string(),
                    client_id: u16::from_str_radix(fields[2], 16)
                        .map_err(|_| PduParseError::InvalidNumber(fields[2].to_string()))?,
                    client_name: fields[3].to_string(),
                    major_version: fields[4]
                        .parse()
                        .map_err(|_| PduParseError::InvalidNumber(fields[4].to_string()))?,
                    minor_version: fields[5]
                        .parse()
                        .map_err(|_| PduParseError::InvalidNumber(fields[5].to_string()))?,
                    cid: fields[6].to_string(),
                    system_uid: fields.get(7).map(|s| s.to_string()).unwrap_or_default(),
                    initial_challenge: fields.get(8).map(|s| s.to_string()),
                })
            }
            "$PI" => {
                let fields = split_fields(rest);
                require(&fields, 3)?;
                Ok(FsdPdu::Ping {
                    from: fields[0].to_string(),
                    to: fields[1].to_string(),
                    timestamp: fields[2].to_string(),
                })
            }
            "$PO" => {
                let fields = split_fields(rest);
                require(&fields, 3)?;
                Ok(FsdPdu::Pong {
                    from: fields[0].to_string(),
                    to: fields[1].to_string(),
                    timestamp: fields[2].to_string(),
                })
            }
            "$CQ" | "$CR" => {
                let fields = split_fields(rest);
                require(&fields, 3)?;
                let query_type: ClientQueryType = fields[2].parse()?;
                let payload = if query_type == ClientQueryType::AircraftConfig {
                    let joined = fields[3..].join(":");
                    QueryPayload::AircraftConfig(joined.parse()?)
                } else if fields.len() > 3 {
                    QueryPayload::Text(fields[3..].join(":"))
                } else {
                    QueryPayload::Bare
                };
                if tag == "$CQ" {
                    Ok(FsdPdu::ClientQuery {
                        from: fields[0].to_string(),
                        to: fields[1].to_string(),
                        query_type,
                        payload,
                    })
                } else {
                    Ok(FsdPdu::ClientQueryResponse {
                        from: fields[0].to_string(),
                        to: fields[1].to_string(),
                        query_type,
                        payload,
                    })
                }
            }
            "$ZC" => {
                let fields = split_fields(rest);
                require(&fields, 3)?;
                Ok(FsdPdu::AuthChallenge {
                    from: fields[0].to_string(),
                    to: fields[1].to_string(),
                    challenge: fields[2].to_string(),
                })
            }
            "$ZR" => {
                let fields = split_fields(rest);
                require(&fields, 3)?;
                Ok(FsdPdu::AuthResponse {
                    from: fields[0].to_string(),
                    to: fields[1].to_string(),
                    response: fields[2].to_string(),
                })
            }
            "$!!" => {
                let fields = split_fields(rest);
                require(&fields, 2)?;
                Ok(FsdPdu::Kill {
                    from: fields[0].to_string(),
                    to: fields[1].to_string(),
                    reason: fields.get(2).map(|s| s.to_string()),
                })
            }
            "$ER" => {
                let fields = split_fields(rest);
                require(&fields, 5)?;
                let numeric: u8 = fields[2]
                    .parse()
                    .map_err(|_| PduParseError::InvalidNumber(fields[2].to_string()))?;
                Ok(FsdPdu::ServerError {
                    from: fields[0].to_string(),
                    to: fields[1].to_string(),
                    code: ServerErrorCode::from_code(numeric),
                    offending: fields[3].to_string(),
                    description: fields[4..].join(":"),
                })
            }
            "$SF" => {
                let fields = split_fields(rest);
                require(&fields, 3)?;
                Ok(FsdPdu::SendFastPositionUpdates {
                    from: fields[0].to_string(),
                    to: fields[1].to_string(),
                    send_fast: fields[2] == "1",
                })
            }
            "$AX" => {
                let fields = split_fields(rest);
                require(&fields, 4)?;
                Ok(FsdPdu::MetarRequest {
                    from: fields[0].to_string(),
                    to: fields[1].to_string(),
                    station: fields[3].to_string(),
                })
            }
            "$AR" => {
                let fields = split_fields(rest);
                require(&fields, 4)?;
                Ok(FsdPdu::MetarResponse {
                    from: fields[0].to_string(),
                    to: fields[1].to_string(),
                    metar: fields[3..].join(":"),
                })
            }
            "$FP" => {
                let fields = split_fields(rest);
                require(&fields, 17)?;
                Ok(FsdPdu::FlightPlan {
                    callsign: fields[0].to_string(),
                    to: fields[1].to_string(),
                    plan: FlightPlan::parse(&fields[2..])?,
                })
            }
            other => Err(PduParseError::UnknownPduType(other.to_string())),
        }
    }
}

impl fmt::Display for FsdPdu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsdPdu::PilotPosition {
                squawk,
                callsign,
                transponder_code,
                rating,
                lat,
                lon,
                true_altitude,
                ground_speed,
                pitch,
                bank,
                heading,
                pressure_altitude_diff,
            } => {
                let pbh = pack_pitch_bank_heading(*pitch, *bank, *heading);
                write!(
                    f,
                    "@{squawk}:{callsign}:{transponder_code}:{rating}:{lat:.7}:{lon:.7}:{true_altitude}:{ground_speed}:{pbh}:{pressure_altitude_diff}"
                )
            }
            FsdPdu::AtcPosition {
                callsign,
                frequency_khz,
                facility,
                visual_range,
                rating,
                lat,
                lon,
                elevation,
            } => write!(
                f,
                "%{callsign}:{frequency_khz}:{facility}:{visual_range}:{rating}:{lat:.7}:{lon:.7}:{elevation}"
            ),
            FsdPdu::FastPilotPosition {
                callsign,
                lat,
                lon,
                true_altitude,
                altitude_agl,
                pitch,
                bank,
                heading,
                velocity,
                nose_wheel_angle,
            }
            | FsdPdu::SlowPilotPosition {
                callsign,
                lat,
                lon,
                true_altitude,
                altitude_agl,
                pitch,
                bank,
                heading,
                velocity,
                nose_wheel_angle,
            } => {
                let tag = if matches!(self, FsdPdu::FastPilotPosition { .. }) {
                    "^"
                } else {
                    "#SL"
                };
                let pbh = pack_pitch_bank_heading(*pitch, *bank, *heading);
                write!(
                    f,
                    "{tag}{callsign}:{lat:.7}:{lon:.7}:{true_altitude:.2}:{altitude_agl:.2}:{pbh}:{:.4}:{:.4}:{:.4}:{:.4}:{:.4}:{:.4}",
                    velocity.linear.x,
                    velocity.linear.y,
                    velocity.linear.z,
                    velocity.rotational.x,
                    velocity.rotational.y,
                    velocity.rotational.z,
                )?;
                if let Some(nga) = nose_wheel_angle {
                    write!(f, ":{nga:.2}")?;
                }
                Ok(())
            }
            FsdPdu::StoppedPilotPosition {
                callsign,
                lat,
                lon,
                true_altitude,
                altitude_agl,
                pitch,
                bank,
                heading,
            } => {
                let pbh = pack_pitch_bank_heading(*pitch, *bank, *heading);
                write!(
                    f,
                    "#ST{callsign}:{lat:.7}:{lon:.7}:{true_altitude:.2}:{altitude_agl:.2}:{pbh}"
                )
            }
            FsdPdu::AtcRegister {
                from,
                to,
                real_name,
                cid,
                password,
                rating,
                protocol,
            } => write!(f, "#AA{from}:{to}:{real_name}:{cid}:{password}:{rating}:{protocol}"),
            FsdPdu::PilotRegister {
                from,
                to,
                cid,
                password,
                rating,
                protocol,
                simulator_type,
                real_name,
            } => write!(
                f,
                "#AP{from}:{to}:{cid}:{password}:{rating}:{protocol}:{simulator_type}:{real_name}"
            ),
            FsdPdu::AtcDeregister { from, cid } => write!(f, "#DA{from}:{cid}"),
            FsdPdu::PilotDeregister { from, cid } => write!(f, "#DP{from}:{cid}"),
            FsdPdu::TextMessage { from, to, text } => write!(f, "#TM{from}:{to}:{text}"),
            FsdPdu::PlaneInfoRequest { from, to } => write!(f, "#SB{from}:{to}:PIR"),
            FsdPdu::PlaneInfoResponse { from, to, info } => {
                write!(f, "#SB{from}:{to}:PI:GEN:{info}")
            }
            FsdPdu::InitialServerHandshake {
                from,
                to,
                version,
                initial_key,
            } => write!(f, "$DI{from}:{to}:{version}:{initial_key}"),
            FsdPdu::InitialClientHandshake {
                from,
                to,
                client_id,
                client_name,
                major_version,
                minor_version,
                cid,
                system_uid,
                initial_challenge,
            } => {
                write!(
                    f,
                    "$ID{from}:{to}:{client_id:04X}:{client_name}:{major_version}:{minor_version}:{cid}:{system_uid}"
                )?;
                if let Some(challenge) = initial_challenge {
                    write!(f, ":{challenge}")?;
                }
                Ok(())
            }
            FsdPdu::Ping { from, to, timestamp } => write!(f, "$PI{from}:{to}:{timestamp}"),
            FsdPdu::Pong { from, to, timestamp } => write!(f, "$PO{from}:{to}:{timestamp}"),
            FsdPdu::ClientQuery {
                from,
                to,
                query_type,
                payload,
            } => write!(f, "$CQ{from}:{to}:{query_type}{payload}"),
            FsdPdu::ClientQueryResponse {
                from,
                to,
                query_type,
                payload,
            } => write!(f, "$CR{from}:{to}:{query_type}{payload}"),
            FsdPdu::AuthChallenge {
                from,
                to,
                challenge,
            } => write!(f, "$ZC{from}:{to}:{challenge}"),
            FsdPdu::AuthResponse { from, to, response } => {
                write!(f, "$ZR{from}:{to}:{response}")
            }
            FsdPdu::Kill { from, to, reason } => {
                write!(f, "$!!{from}:{to}")?;
                if let Some(reason) = reason {
                    write!(f, ":{reason}")?;
                }
                Ok(())
            }
            FsdPdu::ServerError {
                from,
                to,
                code,
                offending,
                description,
            } => write!(
                f,
                "$ER{from}:{to}:{:03}:{offending}:{description}",
                code.numeric_code()
            ),
            FsdPdu::SendFastPositionUpdates {
                from,
                to,
                send_fast,
            } => write!(f, "$SF{from}:{to}:{}", if *send_fast { 1 } else { 0 }),
            FsdPdu::MetarRequest { from, to, station } => {
                write!(f, "$AX{from}:{to}:METAR:{station}")
            }
            FsdPdu::MetarResponse { from, to, metar } => {
                write!(f, "$AR{from}:{to}:METAR:{metar}")
            }
            FsdPdu::FlightPlan { callsign, to, plan } => {
                write!(f, "$FP{callsign}:{to}:{plan}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pilot_position_round_trips() {
        let pdu = FsdPdu::PilotPosition {
            squawk: SquawkState::ModeC,
            callsign: "UAL123".into(),
            transponder_code: 1200,
            rating: NetworkRating::Observer,
            lat: 40.6413,
            lon: -73.7781,
            true_altitude: 5500,
            ground_speed: 0,
            pitch: 2.0,
            bank: -1.0,
            heading: 270.0,
            pressure_altitude_diff: 0,
        };
        let line = pdu.to_string();
        let parsed = FsdPdu::parse(&line).unwrap();
        match parsed {
            FsdPdu::PilotPosition { callsign, transponder_code, .. } => {
                assert_eq!(callsign, "UAL123");
                assert_eq!(transponder_code, 1200);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn atc_register_round_trips() {
        let pdu = FsdPdu::AtcRegister {
            from: "LAX_TWR".into(),
            to: "SERVER".into(),
            real_name: "Jane Doe".into(),
            cid: "123456".into(),
            password: "hunter2".into(),
            rating: NetworkRating::S1,
            protocol: ProtocolRevision::Vatsim2022,
        };
        let line = pdu.to_string();
        assert_eq!(line, "#AALAX_TWR:SERVER:Jane Doe:123456:hunter2:2:101");
        let parsed = FsdPdu::parse(&line).unwrap();
        assert_eq!(parsed, pdu);
    }

    #[test]
    fn client_query_aircraft_config_round_trips() {
        let config: AircraftConfiguration = r#"{"config":{"gear_down":true}}"#.parse().unwrap();
        let pdu = FsdPdu::ClientQuery {
            from: "UAL123".into(),
            to: "SERVER".into(),
            query_type: ClientQueryType::AircraftConfig,
            payload: QueryPayload::AircraftConfig(config),
        };
        let line = pdu.to_string();
        let parsed = FsdPdu::parse(&line).unwrap();
        assert_eq!(parsed, pdu);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert!(FsdPdu::parse("???garbage").is_err());
    }

    #[test]
    fn truncated_position_is_rejected() {
        assert!(FsdPdu::parse("@NUAL123:1200").is_err());
    }

    #[test]
    fn server_error_round_trips() {
        let pdu = FsdPdu::ServerError {
            from: "SERVER".into(),
            to: "UAL123".into(),
            code: ServerErrorCode::CallsignInUse,
            offending: String::new(),
            description: "callsign in use".into(),
        };
        let line = pdu.to_string();
        assert_eq!(line, "$ERSERVER:UAL123:001::callsign in use");
        let parsed = FsdPdu::parse(&line).unwrap();
        assert_eq!(parsed, pdu);
    }

    #[test]
    fn kill_without_reason_round_trips() {
        let pdu = FsdPdu::Kill {
            from: "SERVER".into(),
            to: "UAL123".into(),
            reason: None,
        };
        assert_eq!(pdu.to_string(), "$!!SERVER:UAL123");
        assert_eq!(FsdPdu::parse(&pdu.to_string()).unwrap(), pdu);
    }
}
