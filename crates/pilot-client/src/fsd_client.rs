//! The FSD client (component C): TCP framing, connect/handshake, the
//! challenge-response loop, mid-session server-switch, and PDU dispatch.
//! The line-buffering discipline follows `BufReader::read_line`-style
//! framing, generalized to hold a trailing partial segment across reads.

use std::time::Duration;

use fsd_protocol::{generate_auth_response, md5_hex, FsdPdu, PduParseError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::config::build;
use crate::error::ClientError;
use crate::events::FsdEvent;

const FSD_PORT: u16 = 6809;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Authenticating,
    Active,
    ServerSwitching,
}

/// Derive the rolling-auth response and advance the session key:
/// `md5(session_key ‖ answer)`, never reused.
pub fn advance_rolling_key(session_key: &str, answer: &str) -> String {
    md5_hex(format!("{session_key}{answer}").as_bytes())
}

/// A decoded line, split on CRLF, with the trailing partial segment kept
/// for the next read.
#[derive(Default)]
pub struct LineFramer {
    buffer: String,
}

impl LineFramer {
    pub fn new() -> Self {
        LineFramer::default()
    }

    /// Feed newly read ISO-8859-1-decoded bytes; return complete lines with
    /// CRLF/LF stripped, buffering any trailing partial segment.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);
        let mut lines = Vec::new();
        while let Some(idx) = self.buffer.find('\n') {
            let mut line: String = self.buffer.drain(..=idx).collect();
            while line.ends_with('\n') || line.ends_with('\r') {
                line.pop();
            }
            lines.push(line);
        }
        lines
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// Decode bytes as ISO-8859-1 (every byte maps 1:1 to its codepoint); FSD
/// is 8-bit and must never be treated as UTF-8.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Encode a line back to ISO-8859-1 bytes for the wire.
pub fn encode_latin1(line: &str) -> Vec<u8> {
    line.chars().map(|c| c as u8).collect()
}

/// Mask the password field of an outbound PDU for logging (`RawDataSent`).
pub fn mask_password(line: &str) -> String {
    if let Some(pdu) = line.strip_prefix("#AP").or_else(|| line.strip_prefix("#AA")) {
        let tag = &line[..3];
        let mut fields: Vec<&str> = pdu.split(':').collect();
        let password_idx = if tag == "#AA" { 4 } else { 3 };
        if let Some(slot) = fields.get_mut(password_idx) {
            *slot = "****";
        }
        format!("{tag}{}", fields.join(":"))
    } else {
        line.to_string()
    }
}

pub struct FsdClient {
    state: ConnectionState,
    stream: Option<TcpStream>,
    framer: LineFramer,
    session_key: Option<String>,
    rolling_challenge_key: Option<String>,
    callsign: String,
}

impl FsdClient {
    pub fn new(callsign: impl Into<String>) -> Self {
        FsdClient {
            state: ConnectionState::Disconnected,
            stream: None,
            framer: LineFramer::new(),
            session_key: None,
            rolling_challenge_key: None,
            callsign: callsign.into(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// DNS resolution + TCP connect.
    pub async fn connect(&mut self, host: &str) -> Result<FsdEvent, ClientError> {
        self.state = ConnectionState::Connecting;
        let addr = format!("{host}:{FSD_PORT}");
        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| ClientError::TransportError(e.to_string()))?;
        self.stream = Some(stream);
        self.state = ConnectionState::Authenticating;
        info!(host, "fsd client connected");
        Ok(FsdEvent::NetworkConnected)
    }

    /// Write one PDU line, CRLF-terminated, ISO-8859-1 encoded.
    pub async fn send(&mut self, pdu: &FsdPdu) -> Result<FsdEvent, ClientError> {
        let line = pdu.to_string();
        let stream = self.stream.as_mut().ok_or_else(|| ClientError::TransportError("not connected".into()))?;
        let mut bytes = encode_latin1(&line);
        bytes.extend_from_slice(b"\r\n");
        stream.write_all(&bytes).await.map_err(|e| ClientError::TransportError(e.to_string()))?;
        stream.flush().await.map_err(|e| ClientError::TransportError(e.to_string()))?;
        debug!(line = %mask_password(&line), "raw data sent");
        Ok(FsdEvent::RawDataSent(mask_password(&line)))
    }

    /// Read available bytes and dispatch each complete line to a parsed
    /// PDU, reporting parse failures without dropping the connection.
    pub async fn poll(&mut self) -> Result<Vec<Result<FsdPdu, (String, PduParseError)>>, ClientError> {
        let stream = self.stream.as_mut().ok_or_else(|| ClientError::TransportError("not connected".into()))?;
        let mut buf = [0u8; 4096];
        let n = stream.read(&mut buf).await.map_err(|e| ClientError::TransportError(e.to_string()))?;
        if n == 0 {
            return Err(ClientError::TransportError("remote host closed the connection".into()));
        }
        let chunk = decode_latin1(&buf[..n]);
        let lines = self.framer.push(&chunk);
        let mut results = Vec::with_capacity(lines.len());
        for line in lines {
            match FsdPdu::parse(&line) {
                Ok(pdu) => results.push(Ok(pdu)),
                Err(e) => {
                    warn!(line = %line, error = %e, "malformed PDU");
                    results.push(Err((line, e)));
                }
            }
        }
        Ok(results)
    }

    /// Respond to `$DI` with the session key derivation (login protocol
    /// step 2).
    pub fn begin_session(&mut self, initial_challenge: &str) {
        let key = generate_auth_response(initial_challenge, build::CLIENT_ID, build::PRIVATE_KEY);
        self.session_key = Some(key.clone());
        self.rolling_challenge_key = Some(key);
    }

    /// Answer a `$ZC` rolling challenge, advancing the key.
    pub fn answer_challenge(&mut self, challenge: &str) -> Option<String> {
        let rolling_key = self.rolling_challenge_key.clone()?;
        let session_key = self.session_key.clone()?;
        let answer = generate_auth_response(challenge, build::CLIENT_ID, &rolling_key);
        self.rolling_challenge_key = Some(advance_rolling_key(&session_key, &answer));
        Some(answer)
    }

    /// `$XX`-triggered server switch: open a new socket and, on success,
    /// replace the old one without emitting a Disconnected event.
    pub async fn switch_server(&mut self, new_host: &str) -> Result<Option<FsdEvent>, ClientError> {
        self.state = ConnectionState::ServerSwitching;
        let addr = format!("{new_host}:{FSD_PORT}");
        match TcpStream::connect(&addr).await {
            Ok(stream) => {
                self.stream = Some(stream);
                self.framer.clear();
                self.state = ConnectionState::Active;
                Ok(None)
            }
            Err(e) => {
                if self.stream.is_none() {
                    self.state = ConnectionState::Disconnected;
                    Ok(Some(FsdEvent::NetworkDisconnected))
                } else {
                    Err(ClientError::TransportError(e.to_string()))
                }
            }
        }
    }

    /// Intentional disconnect: `#DP` then close.
    pub async fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
        self.state = ConnectionState::Disconnected;
    }

    /// `$!!` kill: record the reason, let the socket close naturally.
    pub fn killed(&mut self, reason: Option<String>) -> FsdEvent {
        self.state = ConnectionState::Disconnected;
        FsdEvent::ForciblyDisconnected { reason: reason.unwrap_or_else(|| "no reason given".to_string()) }
    }

    pub fn callsign(&self) -> &str {
        &self.callsign
    }
}

pub const SOCKET_TIMEOUT: Duration = Duration::from_secs(10);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_framer_buffers_partial_segment() {
        let mut framer = LineFramer::new();
        let lines = framer.push("$DI SERVER:FLC1:VATSIM\r\n$PI SERVER:FLC1:123");
        assert_eq!(lines, vec!["$DI SERVER:FLC1:VATSIM"]);
        let lines = framer.push("456\r\n");
        assert_eq!(lines, vec!["$PI SERVER:FLC1:123456"]);
    }

    #[test]
    fn latin1_round_trips_high_bytes() {
        let bytes: Vec<u8> = (0..=255).collect();
        let decoded = decode_latin1(&bytes);
        let re_encoded = encode_latin1(&decoded);
        assert_eq!(bytes, re_encoded);
    }

    #[test]
    fn mask_password_hides_pilot_register_password() {
        let line = "#APFLC1:SERVER:123456:secretpass:1:101:6:John Doe";
        let masked = mask_password(line);
        assert!(!masked.contains("secretpass"));
        assert!(masked.contains("****"));
    }

    #[test]
    fn rolling_key_never_repeats() {
        let session = "abc123";
        let first = advance_rolling_key(session, "answer1");
        let second = advance_rolling_key(session, "answer2");
        assert_ne!(first, second);
    }

    #[test]
    fn auth_handshake_derives_consistent_response() {
        let mut client = FsdClient::new("FLC1");
        client.begin_session("1234");
        let response = client.answer_challenge("abcd").unwrap();
        assert_eq!(response.len(), 32);
    }
}
