use fsd_protocol::{
    pack_pitch_bank_heading, ClientQueryType, FsdPdu, NetworkRating, QueryPayload, SquawkState,
};

fn assert_round_trips(pdu: FsdPdu) {
    let line = pdu.to_string();
    let parsed = FsdPdu::parse(&line).unwrap_or_else(|e| panic!("failed to reparse {line:?}: {e}"));
    assert_eq!(parsed, pdu, "round trip mismatch for {line:?}");
}

#[test]
fn text_message_round_trips() {
    assert_round_trips(FsdPdu::TextMessage {
        from: "FLC1".into(),
        to: "SERVER".into(),
        text: "hello world".into(),
    });
}

#[test]
fn ping_and_pong_round_trip() {
    assert_round_trips(FsdPdu::Ping { from: "FLC1".into(), to: "SERVER".into(), timestamp: "123.456".into() });
    assert_round_trips(FsdPdu::Pong { from: "SERVER".into(), to: "FLC1".into(), timestamp: "123.456".into() });
}

#[test]
fn client_query_bare_payload_round_trips() {
    assert_round_trips(FsdPdu::ClientQuery {
        from: "FLC1".into(),
        to: "SERVER".into(),
        query_type: ClientQueryType::IsValidAtc,
        payload: QueryPayload::Bare,
    });
}

#[test]
fn client_query_response_text_payload_round_trips() {
    assert_round_trips(FsdPdu::ClientQueryResponse {
        from: "SERVER".into(),
        to: "FLC1".into(),
        query_type: ClientQueryType::RealName,
        payload: QueryPayload::Text("Jane Doe:1".into()),
    });
}

#[test]
fn auth_challenge_and_response_round_trip() {
    assert_round_trips(FsdPdu::AuthChallenge {
        from: "SERVER".into(),
        to: "FLC1".into(),
        challenge: "abcd1234".into(),
    });
    assert_round_trips(FsdPdu::AuthResponse {
        from: "FLC1".into(),
        to: "SERVER".into(),
        response: "deadbeef".into(),
    });
}

#[test]
fn kill_with_reason_round_trips() {
    assert_round_trips(FsdPdu::Kill {
        from: "SERVER".into(),
        to: "FLC1".into(),
        reason: Some("requested disconnect".into()),
    });
}

#[test]
fn send_fast_position_updates_round_trips() {
    assert_round_trips(FsdPdu::SendFastPositionUpdates { from: "SERVER".into(), to: "FLC1".into(), send_fast: true });
    assert_round_trips(FsdPdu::SendFastPositionUpdates { from: "SERVER".into(), to: "FLC1".into(), send_fast: false });
}

#[test]
fn metar_request_and_response_round_trip() {
    assert_round_trips(FsdPdu::MetarRequest { from: "FLC1".into(), to: "SERVER".into(), station: "KORD".into() });
    assert_round_trips(FsdPdu::MetarResponse {
        from: "SERVER".into(),
        to: "FLC1".into(),
        metar: "KORD 271251Z 27012KT 10SM CLR 22/08 A3001".into(),
    });
}

#[test]
fn initial_handshake_pair_round_trips() {
    assert_round_trips(FsdPdu::InitialServerHandshake {
        from: "SERVER".into(),
        to: "*".into(),
        version: "9".into(),
        initial_key: "abcd1234".into(),
    });
    assert_round_trips(FsdPdu::InitialClientHandshake {
        from: "FLC1".into(),
        to: "SERVER".into(),
        client_id: 0x1234,
        client_name: "xpilot-rs".into(),
        major_version: 1,
        minor_version: 0,
        cid: "123456".into(),
        system_uid: "uid-001".into(),
        initial_challenge: Some("abcd1234".into()),
    });
}

#[test]
fn pilot_deregister_and_atc_deregister_round_trip() {
    assert_round_trips(FsdPdu::PilotDeregister { from: "FLC1".into(), cid: "123456".into() });
    assert_round_trips(FsdPdu::AtcDeregister { from: "LAX_TWR".into(), cid: "654321".into() });
}

#[test]
fn pilot_position_with_ident_squawk_round_trips() {
    assert_round_trips(FsdPdu::PilotPosition {
        squawk: SquawkState::ModeCIdent,
        callsign: "FLC1".into(),
        transponder_code: 1200,
        rating: NetworkRating::Observer,
        lat: 41.5,
        lon: -87.6,
        true_altitude: 35000,
        ground_speed: 420,
        pitch: 2.5,
        bank: -1.0,
        heading: 270.0,
        pressure_altitude_diff: 0,
    });
}

#[test]
fn pilot_position_parses_the_literal_wire_line() {
    let pbh = pack_pitch_bank_heading(0.0, 0.0, 0.0);
    let line = format!("@N:UAL1:1200:5:41.5:-87.6:35000:420:{pbh}:0");
    let parsed = FsdPdu::parse(&line).unwrap();
    assert_eq!(
        parsed,
        FsdPdu::PilotPosition {
            squawk: SquawkState::ModeC,
            callsign: "UAL1".into(),
            transponder_code: 1200,
            rating: NetworkRating::C1,
            lat: 41.5,
            lon: -87.6,
            true_altitude: 35000,
            ground_speed: 420,
            pitch: 0.0,
            bank: 0.0,
            heading: 0.0,
            pressure_altitude_diff: 0,
        }
    );
    // re-serializing and re-parsing (not just the literal line above) must
    // also agree, independent of the hardcoded wire string.
    assert_round_trips(parsed);
}

#[test]
fn unknown_tag_never_panics() {
    assert!(FsdPdu::parse("???garbage").is_err());
    assert!(FsdPdu::parse("").is_err());
}
