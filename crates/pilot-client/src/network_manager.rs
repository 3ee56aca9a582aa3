//! The network manager (component I): the integrator. Owns the FSD client
//! handle, runs the login protocol, routes its events to the specialized
//! managers (controllers, remote aircraft, broadcaster, sim bridge, voice),
//! and carries the cross-cutting reply logic.

use std::collections::HashMap;
use std::time::Instant;

use fsd_protocol::position::AircraftVisualState;
use fsd_protocol::{ClientQueryType, FsdPdu, NetworkRating, QueryPayload, SimulatorType, SquawkState};
use rand::seq::SliceRandom;
use serde::Deserialize;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::broadcaster::{Broadcaster, PositionKind};
use crate::config::{build, ConnectOptions, NetworkCredentials};
use crate::controllers::{normalize_frequency_khz, ControllerSet};
use crate::error::ClientError;
use crate::events::{ManagerOutput, NetworkManagerEvent, UserAircraftState};
use crate::fsd_client::{ConnectionState, FsdClient, SOCKET_TIMEOUT};
use crate::remote_aircraft::{RemoteAircraftManager, SimCommand};
use crate::sim_bridge::SimulatorBridge;
use crate::voice::{NoopVoiceClient, VoiceAdapter};

/// Reply to `$CQ C?`: COM1 frequency formatted as MHz to 3 decimals.
pub fn format_com1_frequency_reply(frequency_khz: u32) -> String {
    format!("{:.3}", frequency_khz as f64 / 1000.0)
}

/// The airline prefix used in a plane-info reply: the first three letters
/// of our own callsign when it matches `^([A-Z]{3})\d+`, else none.
pub fn airline_from_callsign(callsign: &str) -> Option<&str> {
    let bytes = callsign.as_bytes();
    if bytes.len() < 4 {
        return None;
    }
    let (prefix, rest) = callsign.split_at(3);
    if prefix.chars().all(|c| c.is_ascii_uppercase()) && rest.chars().all(|c| c.is_ascii_digit()) && !rest.is_empty() {
        Some(prefix)
    } else {
        None
    }
}

/// Build the `#SB PI GEN` plane-info response body.
pub fn plane_info_response_body(type_code: &str, own_callsign: &str) -> String {
    match airline_from_callsign(own_callsign) {
        Some(airline) => format!("EQUIPMENT={type_code}:AIRLINE={airline}"),
        None => format!("EQUIPMENT={type_code}"),
    }
}

/// Inverse of [`plane_info_response_body`]: pull the type code and airline
/// prefix back out of an inbound `#SB PI` body.
pub fn parse_plane_info_body(info: &str) -> (String, String) {
    let mut type_code = String::new();
    let mut airline = String::new();
    for token in info.split(':') {
        if let Some(value) = token.strip_prefix("EQUIPMENT=") {
            type_code = value.to_string();
        } else if let Some(value) = token.strip_prefix("AIRLINE=") {
            airline = value.to_string();
        }
    }
    (type_code, airline)
}

/// Normalize a SELCAL code for comparison: strip hyphens and spaces,
/// uppercase.
pub fn normalize_selcal(code: &str) -> String {
    code.chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase()
}

/// Parse a `SELCAL XX-XX` text-message body, returning the code if present.
pub fn parse_selcal_text(text: &str) -> Option<&str> {
    text.strip_prefix("SELCAL ").map(|rest| rest.trim())
}

/// Whether an inbound radio message's normalized transmit frequency
/// matches one of our two COM frequencies.
pub fn frequency_matches_com(transmit_khz: u32, com1_khz: u32, com2_khz: u32) -> bool {
    let normalized = normalize_frequency_khz(transmit_khz);
    normalized == normalize_frequency_khz(com1_khz) || normalized == normalize_frequency_khz(com2_khz)
}

/// Parse a radio-broadcast `#TM` target (`@128000&@121500`) into its list
/// of kHz frequencies; each token keeps its own `@` prefix after the `&`
/// join, per the original serializer's `toTokens`/`fromTokens` pair.
pub fn parse_radio_frequencies_khz(to: &str) -> Vec<u32> {
    to.split('&')
        .filter_map(|token| token.strip_prefix('@').unwrap_or(token).parse().ok())
        .collect()
}

#[derive(Debug, Deserialize)]
struct ServerListResponse {
    data: ServerListData,
}

#[derive(Debug, Deserialize)]
struct ServerListData {
    servers: Vec<ServerEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerEntry {
    pub ident: String,
    pub hostname_or_ip: String,
}

/// Pick a random server entry from the `data.servers` cluster.
pub fn pick_random_server(servers: &[ServerEntry]) -> Option<&ServerEntry> {
    servers.choose(&mut rand::thread_rng())
}

pub async fn fetch_server_list(status_url: &str) -> Result<Vec<ServerEntry>, ClientError> {
    let response = reqwest::get(status_url)
        .await
        .map_err(|e| ClientError::TransportError(e.to_string()))?
        .json::<ServerListResponse>()
        .await
        .map_err(|e| ClientError::TransportError(e.to_string()))?;
    Ok(response.data.servers)
}

/// Race a GET to `http://fsd.vatsim.net` expecting a plain IPv4 body, used
/// when the user's cached server selection is `AUTOMATIC`.
pub async fn resolve_automatic_server(fallback: &str) -> String {
    match reqwest::get("http://fsd.vatsim.net").await {
        Ok(response) => match response.text().await {
            Ok(body) if body.trim().parse::<std::net::Ipv4Addr>().is_ok() => body.trim().to_string(),
            _ => fallback.to_string(),
        },
        Err(_) => fallback.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct JwtResponse {
    token: String,
}

/// Exchange network credentials for the short-lived JWT sent as the FSD
/// registration password; the raw credential never goes on the FSD wire.
pub async fn fetch_jwt_token(credentials: &NetworkCredentials) -> Result<String, ClientError> {
    let response = reqwest::Client::new()
        .post(build::AUTH_ENDPOINT)
        .json(&serde_json::json!({ "cid": credentials.cid, "password": credentials.password }))
        .send()
        .await
        .map_err(|e| ClientError::AuthFailure(e.to_string()))?;
    if !response.status().is_success() {
        return Err(ClientError::AuthFailure(format!("auth endpoint returned {}", response.status())));
    }
    response
        .json::<JwtResponse>()
        .await
        .map(|parsed| parsed.token)
        .map_err(|e| ClientError::AuthFailure(e.to_string()))
}

/// Accumulates `$CR ATIS` lines keyed by line type until a terminating `E`
/// line.
#[derive(Default)]
pub struct AtisAccumulator {
    lines: Vec<String>,
}

impl AtisAccumulator {
    pub fn push_line(&mut self, line_type: char, text: &str) -> Option<Vec<String>> {
        match line_type {
            'E' => Some(std::mem::take(&mut self.lines)),
            _ => {
                self.lines.push(text.to_string());
                None
            }
        }
    }
}

pub struct NetworkManager {
    fsd: FsdClient,
    controllers: ControllerSet,
    remote_aircraft: RemoteAircraftManager,
    broadcaster: Broadcaster,
    sim_bridge: SimulatorBridge,
    voice: VoiceAdapter<NoopVoiceClient>,
    atis: HashMap<String, AtisAccumulator>,
    own_callsign: String,
    own_type_code: String,
    cid: String,
    real_name: String,
    selcal_code: Option<String>,
    observer: bool,
    transponder_code: u16,
    com1_frequency_khz: u32,
    com2_frequency_khz: u32,
    public_ip: Option<String>,
}

impl NetworkManager {
    pub fn new(callsign: impl Into<String>) -> Self {
        let callsign = callsign.into();
        let now = Instant::now();
        NetworkManager {
            fsd: FsdClient::new(callsign.clone()),
            controllers: ControllerSet::new(),
            remote_aircraft: RemoteAircraftManager::new(),
            broadcaster: Broadcaster::new(false, now),
            sim_bridge: SimulatorBridge::new(now),
            voice: VoiceAdapter::new(NoopVoiceClient),
            atis: HashMap::new(),
            own_callsign: callsign,
            own_type_code: String::new(),
            cid: String::new(),
            real_name: String::new(),
            selcal_code: None,
            observer: false,
            transponder_code: 1200,
            com1_frequency_khz: 0,
            com2_frequency_khz: 0,
            public_ip: None,
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.fsd.state()
    }

    pub fn sim_bridge_mut(&mut self) -> &mut SimulatorBridge {
        &mut self.sim_bridge
    }

    pub fn voice_mut(&mut self) -> &mut VoiceAdapter<NoopVoiceClient> {
        &mut self.voice
    }

    pub fn set_transponder_code(&mut self, code: u16) {
        self.transponder_code = code;
    }

    /// Run the full login protocol: wait for `$DI`, derive the session key
    /// and reply `$ID`, fetch a JWT and register, then send the initial
    /// `$CQ … IP`.
    pub async fn connect(&mut self, options: &ConnectOptions) -> Result<(), ClientError> {
        if options.credentials.cid.is_empty() || options.credentials.password.is_empty() {
            return Err(ClientError::ConfigPrecondition("missing network credentials".into()));
        }
        self.observer = options.observer;
        self.cid = options.credentials.cid.clone();
        self.real_name = options.properties.real_name.clone();
        self.own_type_code = options.properties.type_code.clone();
        self.selcal_code = options.properties.selcal_code.clone();
        self.broadcaster = Broadcaster::new(options.observer, Instant::now());

        self.fsd.connect(&options.server_address).await?;

        let initial_key = self.await_initial_handshake().await?;
        self.fsd.begin_session(&initial_key);

        let handshake = FsdPdu::InitialClientHandshake {
            from: self.own_callsign.clone(),
            to: "SERVER".to_string(),
            client_id: build::CLIENT_ID,
            client_name: build::CLIENT_NAME.to_string(),
            major_version: build::CLIENT_VERSION_MAJOR,
            minor_version: build::CLIENT_VERSION_MINOR,
            cid: options.credentials.cid.clone(),
            system_uid: std::process::id().to_string(),
            initial_challenge: None,
        };
        self.fsd.send(&handshake).await?;

        let jwt = fetch_jwt_token(&options.credentials).await?;
        let registration = build_registration_pdu(
            &self.own_callsign,
            &options.credentials.cid,
            &jwt,
            options.observer,
            &options.properties.real_name,
        );
        self.fsd.send(&registration).await?;

        let ip_query = FsdPdu::ClientQuery {
            from: self.own_callsign.clone(),
            to: "SERVER".to_string(),
            query_type: ClientQueryType::PublicIp,
            payload: QueryPayload::Bare,
        };
        self.fsd.send(&ip_query).await?;

        self.voice.network_connected(&self.own_callsign, &self.cid, &jwt);
        info!(callsign = %self.own_callsign, "login protocol complete");
        Ok(())
    }

    async fn await_initial_handshake(&mut self) -> Result<String, ClientError> {
        loop {
            let results = timeout(SOCKET_TIMEOUT, self.fsd.poll())
                .await
                .map_err(|_| ClientError::TransportError("timed out waiting for $DI".into()))??;
            for result in results {
                match result {
                    Ok(FsdPdu::InitialServerHandshake { initial_key, .. }) => return Ok(initial_key),
                    Ok(other) => debug!(?other, "ignoring PDU before login handshake completes"),
                    Err((raw, source)) => return Err(ClientError::ProtocolDecode { raw, source }),
                }
            }
        }
    }

    pub async fn disconnect(&mut self) {
        let pdu = FsdPdu::PilotDeregister { from: self.own_callsign.clone(), cid: self.cid.clone() };
        let _ = self.fsd.send(&pdu).await;
        self.fsd.disconnect().await;
        self.voice.network_disconnected();
    }

    /// Read available FSD traffic and dispatch each line. Returns the
    /// aggregated events/commands every downstream manager produced.
    pub async fn poll(&mut self, now: Instant) -> Result<Vec<ManagerOutput>, ClientError> {
        let results = self.fsd.poll().await?;
        let mut out = Vec::new();
        for result in results {
            match result {
                Ok(pdu) => out.extend(self.dispatch(pdu, now).await?),
                Err((raw, source)) => warn!(raw = %raw, error = %source, "malformed PDU"),
            }
        }
        Ok(out)
    }

    async fn dispatch(&mut self, pdu: FsdPdu, now: Instant) -> Result<Vec<ManagerOutput>, ClientError> {
        let mut out = Vec::new();
        match pdu {
            FsdPdu::AuthChallenge { challenge, .. } => {
                if let Some(answer) = self.fsd.answer_challenge(&challenge) {
                    let reply = FsdPdu::AuthResponse {
                        from: self.own_callsign.clone(),
                        to: "SERVER".to_string(),
                        response: answer,
                    };
                    self.fsd.send(&reply).await?;
                }
            }
            FsdPdu::Kill { reason, .. } => {
                return Err(ClientError::Kill { reason: reason.unwrap_or_else(|| "no reason given".to_string()) });
            }
            FsdPdu::ServerError { code, description, .. } => {
                if let Some(err) = ClientError::from_server_error(code, &description) {
                    return Err(err);
                }
                warn!(?code, description = %description, "recoverable server error");
            }
            FsdPdu::Ping { from, to, timestamp } => {
                self.fsd.send(&FsdPdu::Pong { from: to, to: from, timestamp }).await?;
            }
            FsdPdu::SendFastPositionUpdates { to, send_fast, .. } => {
                if to.eq_ignore_ascii_case(&self.own_callsign) {
                    self.broadcaster.set_fast_armed(send_fast);
                }
            }
            FsdPdu::ClientQuery { from, to, query_type, payload } => {
                if query_type == ClientQueryType::AircraftConfig {
                    if let QueryPayload::AircraftConfig(config) = payload {
                        let commands = self.remote_aircraft.aircraft_configuration_in(&from, config);
                        self.push_remote_commands(commands, &mut out);
                    }
                } else if to.eq_ignore_ascii_case(&self.own_callsign) {
                    let observer = self.observer;
                    let real_name = self.real_name.clone();
                    let (reply, events) = self.handle_client_query(&from, &query_type, observer, &real_name);
                    out.extend(events.into_iter().map(ManagerOutput::Network));
                    if let Some(reply) = reply {
                        self.fsd.send(&reply).await?;
                    }
                }
            }
            FsdPdu::ClientQueryResponse { from, query_type, payload, .. } => {
                self.handle_client_query_response(&from, query_type, payload, &mut out);
            }
            FsdPdu::TextMessage { from, to, text } => {
                self.handle_text_message(&from, &to, &text, &mut out);
            }
            FsdPdu::PlaneInfoRequest { from, .. } => {
                let reply = self.handle_plane_info_request(&from, &self.own_type_code);
                self.fsd.send(&reply).await?;
            }
            FsdPdu::PlaneInfoResponse { from, info, .. } => {
                let (type_code, airline) = parse_plane_info_body(&info);
                let commands = self.remote_aircraft.aircraft_info_in(&from, type_code, airline);
                self.push_remote_commands(commands, &mut out);
            }
            FsdPdu::AtcPosition { callsign, frequency_khz, lat, lon, .. } => {
                let (events, is_new) = self.controllers.position_update(&callsign, frequency_khz, lat, lon, now);
                out.extend(events.into_iter().map(ManagerOutput::Controller));
                if is_new {
                    self.request_controller_details(&callsign).await?;
                }
            }
            FsdPdu::PilotPosition {
                callsign, lat, lon, true_altitude, ground_speed, pitch, bank, heading, ..
            } => {
                self.ingest_remote_position(
                    &callsign,
                    AircraftVisualState {
                        lat,
                        lon,
                        altitude_ft: true_altitude as f64,
                        altitude_agl_ft: true_altitude as f64,
                        pitch,
                        heading,
                        bank,
                        nose_wheel_angle: 0.0,
                    },
                    ground_speed,
                    now,
                    false,
                    &mut out,
                );
            }
            FsdPdu::SlowPilotPosition { callsign, lat, lon, true_altitude, altitude_agl, pitch, bank, heading, .. } => {
                self.ingest_remote_position(
                    &callsign,
                    AircraftVisualState {
                        lat,
                        lon,
                        altitude_ft: true_altitude,
                        altitude_agl_ft: altitude_agl,
                        pitch,
                        heading,
                        bank,
                        nose_wheel_angle: 0.0,
                    },
                    0,
                    now,
                    false,
                    &mut out,
                );
            }
            FsdPdu::FastPilotPosition { callsign, lat, lon, true_altitude, altitude_agl, pitch, bank, heading, .. }
            | FsdPdu::StoppedPilotPosition { callsign, lat, lon, true_altitude, altitude_agl, pitch, bank, heading } => {
                self.ingest_remote_position(
                    &callsign,
                    AircraftVisualState {
                        lat,
                        lon,
                        altitude_ft: true_altitude,
                        altitude_agl_ft: altitude_agl,
                        pitch,
                        heading,
                        bank,
                        nose_wheel_angle: 0.0,
                    },
                    0,
                    now,
                    true,
                    &mut out,
                );
            }
            FsdPdu::PilotDeregister { from, .. } => {
                let commands = self.remote_aircraft.remove(&from);
                self.push_remote_commands(commands, &mut out);
            }
            _ => {}
        }
        Ok(out)
    }

    async fn request_controller_details(&mut self, callsign: &str) -> Result<(), ClientError> {
        let real_name_query = FsdPdu::ClientQuery {
            from: self.own_callsign.clone(),
            to: callsign.to_string(),
            query_type: ClientQueryType::RealName,
            payload: QueryPayload::Bare,
        };
        let caps_query = FsdPdu::ClientQuery {
            from: self.own_callsign.clone(),
            to: callsign.to_string(),
            query_type: ClientQueryType::Capabilities,
            payload: QueryPayload::Bare,
        };
        let is_valid_atc_query = FsdPdu::ClientQuery {
            from: self.own_callsign.clone(),
            to: "SERVER".to_string(),
            query_type: ClientQueryType::IsValidAtc,
            payload: QueryPayload::Text(callsign.to_string()),
        };
        self.fsd.send(&real_name_query).await?;
        self.fsd.send(&caps_query).await?;
        self.fsd.send(&is_valid_atc_query).await?;
        Ok(())
    }

    fn ingest_remote_position(
        &mut self,
        callsign: &str,
        state: AircraftVisualState,
        ground_speed: u16,
        now: Instant,
        fast: bool,
        out: &mut Vec<ManagerOutput>,
    ) {
        if callsign.eq_ignore_ascii_case(&self.own_callsign) {
            return;
        }
        let commands = if fast {
            self.remote_aircraft.fast_position_in(callsign, state)
        } else {
            self.remote_aircraft.slow_position_in(callsign, state, ground_speed, now)
        };
        self.push_remote_commands(commands, out);
    }

    fn push_remote_commands(&self, commands: Vec<SimCommand>, out: &mut Vec<ManagerOutput>) {
        for command in commands {
            if let Some(event) = self.remote_aircraft.events_for(&command) {
                out.push(ManagerOutput::RemoteAircraft(event));
            }
            out.push(ManagerOutput::SimCommand(command));
        }
    }

    fn handle_text_message(&mut self, from: &str, to: &str, text: &str, out: &mut Vec<ManagerOutput>) {
        if to.starts_with('@') {
            let selcal = self.selcal_code.clone();
            for freq in parse_radio_frequencies_khz(to) {
                if let Some(event) = self.handle_radio_message(from, freq, text, selcal.as_deref()) {
                    out.push(ManagerOutput::Network(event));
                    break;
                }
            }
        } else if to.eq_ignore_ascii_case(&self.own_callsign) {
            out.push(ManagerOutput::Network(NetworkManagerEvent::RadioMessageReceived {
                from: from.to_string(),
                text: text.to_string(),
                is_direct: true,
            }));
        }
    }

    fn handle_client_query_response(
        &mut self,
        from: &str,
        query_type: ClientQueryType,
        payload: QueryPayload,
        out: &mut Vec<ManagerOutput>,
    ) {
        match query_type {
            ClientQueryType::PublicIp => {
                if let QueryPayload::Text(ip) = payload {
                    self.public_ip = Some(ip);
                }
            }
            ClientQueryType::IsValidAtc => {
                let is_valid = matches!(&payload, QueryPayload::Text(body) if body.starts_with('Y'));
                out.extend(self.controllers.set_is_valid_atc(from, is_valid).into_iter().map(ManagerOutput::Controller));
                out.push(ManagerOutput::Network(NetworkManagerEvent::IsValidAtcReceived {
                    from: from.to_string(),
                    is_valid,
                }));
            }
            ClientQueryType::RealName => {
                if let QueryPayload::Text(body) = payload {
                    let name = body.split(':').next().unwrap_or(&body).to_string();
                    out.extend(self.controllers.set_real_name(from, name.clone()).into_iter().map(ManagerOutput::Controller));
                    out.push(ManagerOutput::Network(NetworkManagerEvent::RealNameReceived { from: from.to_string(), name }));
                }
            }
            ClientQueryType::AtcInfo => {
                if let QueryPayload::Text(body) = payload {
                    let (line_type, rest) = body.split_once(':').unwrap_or((body.as_str(), ""));
                    let line_type = line_type.chars().next().unwrap_or('\0');
                    let line_text =
                        if line_type == 'Z' { format!("Estimated logoff time: {rest}") } else { rest.to_string() };
                    let key = from.to_ascii_uppercase();
                    let accumulator = self.atis.entry(key.clone()).or_default();
                    if let Some(lines) = accumulator.push_line(line_type, &line_text) {
                        self.atis.remove(&key);
                        out.push(ManagerOutput::Network(NetworkManagerEvent::AtisReceived {
                            from: from.to_string(),
                            lines,
                        }));
                    }
                }
            }
            ClientQueryType::Capabilities => {
                out.push(ManagerOutput::Network(NetworkManagerEvent::CapabilitiesRequestReceived { from: from.to_string() }));
            }
            _ => {}
        }
    }

    /// Handle a `$CQ` addressed to us.
    pub fn handle_client_query(
        &mut self,
        from: &str,
        query_type: &ClientQueryType,
        is_towerview: bool,
        user_name: &str,
    ) -> (Option<FsdPdu>, Vec<NetworkManagerEvent>) {
        match query_type {
            ClientQueryType::Com1Freq => {
                let body = format_com1_frequency_reply(self.com1_frequency_khz);
                (
                    Some(FsdPdu::ClientQueryResponse {
                        from: self.own_callsign.clone(),
                        to: from.to_string(),
                        query_type: ClientQueryType::Com1Freq,
                        payload: QueryPayload::Text(body),
                    }),
                    vec![],
                )
            }
            ClientQueryType::RealName => {
                let mut name = user_name.to_string();
                if is_towerview {
                    name.push_str(" xPilot tower view connection");
                }
                let body = format!("{name}:{}", NetworkRating::Observer);
                (
                    Some(FsdPdu::ClientQueryResponse {
                        from: self.own_callsign.clone(),
                        to: from.to_string(),
                        query_type: ClientQueryType::RealName,
                        payload: QueryPayload::Text(body),
                    }),
                    vec![],
                )
            }
            ClientQueryType::Capabilities => {
                let mut events = Vec::new();
                if from != "SERVER" {
                    events.push(NetworkManagerEvent::CapabilitiesRequestReceived { from: from.to_string() });
                }
                (
                    Some(FsdPdu::ClientQueryResponse {
                        from: self.own_callsign.clone(),
                        to: from.to_string(),
                        query_type: ClientQueryType::Capabilities,
                        payload: QueryPayload::Text("ACCONFIG=1".to_string()),
                    }),
                    events,
                )
            }
            ClientQueryType::Inf => {
                let ip = self.public_ip.clone().unwrap_or_default();
                let body = format!(
                    "xpilot-rs:{}:{}:{}:{}",
                    std::process::id(),
                    user_name,
                    ip,
                    std::env::consts::OS,
                );
                (
                    Some(FsdPdu::ClientQueryResponse {
                        from: self.own_callsign.clone(),
                        to: from.to_string(),
                        query_type: ClientQueryType::Inf,
                        payload: QueryPayload::Text(body),
                    }),
                    vec![],
                )
            }
            ClientQueryType::IsValidAtc => (None, vec![]),
            _ => (None, vec![]),
        }
    }

    /// Handle a `#SB PIR` plane-info request.
    pub fn handle_plane_info_request(&self, from: &str, type_code: &str) -> FsdPdu {
        FsdPdu::PlaneInfoResponse {
            from: self.own_callsign.clone(),
            to: from.to_string(),
            info: plane_info_response_body(type_code, &self.own_callsign),
        }
    }

    /// Handle an inbound `#TM` radio text message, detecting SELCAL codes.
    pub fn handle_radio_message(
        &self,
        from: &str,
        transmit_khz: u32,
        text: &str,
        our_selcal: Option<&str>,
    ) -> Option<NetworkManagerEvent> {
        if !frequency_matches_com(transmit_khz, self.com1_frequency_khz, self.com2_frequency_khz) {
            return None;
        }
        if let Some(code) = parse_selcal_text(text) {
            if let Some(ours) = our_selcal {
                if normalize_selcal(code) == normalize_selcal(ours) {
                    return Some(NetworkManagerEvent::SelcalAlert);
                }
            }
            return None;
        }
        let is_direct = text.to_ascii_uppercase().starts_with(&self.own_callsign.to_ascii_uppercase());
        Some(NetworkManagerEvent::RadioMessageReceived {
            from: from.to_string(),
            text: text.to_string(),
            is_direct,
        })
    }

    pub fn set_com_frequencies(&mut self, com1_khz: u32, com2_khz: u32) {
        self.com1_frequency_khz = com1_khz;
        self.com2_frequency_khz = com2_khz;
    }

    pub fn set_public_ip(&mut self, ip: String) {
        self.public_ip = Some(ip);
    }

    pub fn controllers_mut(&mut self) -> &mut ControllerSet {
        &mut self.controllers
    }

    pub fn remote_aircraft_mut(&mut self) -> &mut RemoteAircraftManager {
        &mut self.remote_aircraft
    }

    /// Per-1s-cycle upkeep for every manager that isn't directly driven by
    /// incoming FSD traffic: stale remote aircraft/controllers, the
    /// one-shot plane-info retry.
    pub fn staleness_tick(&mut self, now: Instant) -> Vec<ManagerOutput> {
        let mut out = Vec::new();
        let evicted = self.remote_aircraft.evict_stale(now);
        self.push_remote_commands(evicted, &mut out);
        let retried = self.remote_aircraft.retry_stale_plane_info_requests(now);
        self.push_remote_commands(retried, &mut out);
        out.extend(self.controllers.garbage_collect(now).into_iter().map(ManagerOutput::Controller));
        out
    }

    /// Drive the simulator-bridge liveness gate; returns the UDP datagrams
    /// (re-subscribe / handshake requests) that still need sending.
    pub fn sim_bridge_tick(&mut self, now: Instant) -> Result<Vec<Vec<u8>>, ClientError> {
        self.sim_bridge.gate_tick(now)
    }

    /// Decide and send this tick's position PDU(s) from a simulator-state
    /// snapshot, and forward the position to the voice adapter.
    pub async fn broadcast_position(&mut self, state: &UserAircraftState, now: Instant) -> Result<(), ClientError> {
        let kinds = self.broadcaster.tick(now, state.paused, state.velocity);
        for kind in kinds {
            let pdu = match kind {
                PositionKind::Slow => FsdPdu::PilotPosition {
                    squawk: SquawkState::ModeC,
                    callsign: self.own_callsign.clone(),
                    transponder_code: self.transponder_code,
                    rating: NetworkRating::Observer,
                    lat: state.visual_state.lat,
                    lon: state.visual_state.lon,
                    true_altitude: state.visual_state.altitude_ft.round() as i32,
                    ground_speed: 0,
                    pitch: state.visual_state.pitch,
                    bank: state.visual_state.bank,
                    heading: state.visual_state.heading,
                    pressure_altitude_diff: 0,
                },
                PositionKind::FastMoving | PositionKind::FastZero => FsdPdu::FastPilotPosition {
                    callsign: self.own_callsign.clone(),
                    lat: state.visual_state.lat,
                    lon: state.visual_state.lon,
                    true_altitude: state.visual_state.altitude_ft,
                    altitude_agl: state.visual_state.altitude_agl_ft,
                    pitch: state.visual_state.pitch,
                    bank: state.visual_state.bank,
                    heading: state.visual_state.heading,
                    velocity: state.velocity,
                    nose_wheel_angle: Some(state.visual_state.nose_wheel_angle),
                },
                PositionKind::Stopped => FsdPdu::StoppedPilotPosition {
                    callsign: self.own_callsign.clone(),
                    lat: state.visual_state.lat,
                    lon: state.visual_state.lon,
                    true_altitude: state.visual_state.altitude_ft,
                    altitude_agl: state.visual_state.altitude_agl_ft,
                    pitch: state.visual_state.pitch,
                    bank: state.visual_state.bank,
                    heading: state.visual_state.heading,
                },
                PositionKind::AtcPosition => continue,
            };
            self.fsd.send(&pdu).await?;
        }
        self.voice.position_changed(state.visual_state);
        Ok(())
    }
}

/// The observer/pilot registration PDU sent at the end of the login
/// protocol.
pub fn build_registration_pdu(
    callsign: &str,
    cid: &str,
    jwt_token: &str,
    observer: bool,
    real_name: &str,
) -> FsdPdu {
    if observer {
        FsdPdu::AtcRegister {
            from: callsign.to_string(),
            to: "SERVER".to_string(),
            real_name: real_name.to_string(),
            cid: cid.to_string(),
            password: jwt_token.to_string(),
            rating: NetworkRating::Observer,
            protocol: build::PROTOCOL_REVISION,
        }
    } else {
        FsdPdu::PilotRegister {
            from: callsign.to_string(),
            to: "SERVER".to_string(),
            cid: cid.to_string(),
            password: jwt_token.to_string(),
            rating: NetworkRating::Observer,
            protocol: build::PROTOCOL_REVISION,
            simulator_type: SimulatorType::MSFS2004,
            real_name: real_name.to_string(),
        }
    }
}
