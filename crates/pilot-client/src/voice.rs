//! The voice adapter (component H). All calls into the external
//! voice-radio library go through the [`VoiceClient`] trait so unit tests
//! can substitute [`MockVoiceClient`] without a live voice stack.

use std::collections::HashMap;
use std::sync::Mutex;

use fsd_protocol::position::AircraftVisualState;

/// The two radio slots a user can transmit/receive on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RadioIndex {
    Com1 = 0,
    Com2 = 1,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadioStackState {
    pub avionics_powered: bool,
    pub com1_frequency_khz: u32,
    pub com1_tx: bool,
    pub com1_rx: bool,
    pub com1_volume: u8,
    pub com2_frequency_khz: u32,
    pub com2_tx: bool,
    pub com2_rx: bool,
    pub com2_volume: u8,
    pub transponder_code: u16,
    pub mode_c: bool,
    pub ident: bool,
    pub selcal_mute_override: bool,
}

/// Abstraction over the external voice-radio library's control surface:
/// connect, set radio states, PTT, device selection. The codec itself is
/// out of scope; only this control surface is modeled.
pub trait VoiceClient: Send + Sync {
    fn set_callsign(&self, callsign: &str);
    fn set_credentials(&self, cid: &str, password: &str);
    fn connect(&self);
    fn disconnect(&self);
    fn set_tx_radio(&self, radio: RadioIndex);
    fn set_radio_gain(&self, radio: RadioIndex, volume: u8);
    fn set_radio_frequency(&self, radio: RadioIndex, effective_frequency_hz: u32);
    fn set_position(&self, state: AircraftVisualState);
    fn set_ptt(&self, active: bool);
    fn refresh_transceivers(&self);
    fn is_rx_active(&self, radio: RadioIndex) -> bool;
}

/// Resolve a radio's effective transmit/receive frequency: the alias
/// binding of a matching controller/alias if one exists, else the raw COM
/// frequency, or 0 when rx disabled and avionics are off with no alias.
pub fn effective_frequency_hz(
    raw_frequency_khz: u32,
    rx_enabled: bool,
    avionics_powered: bool,
    alias_hz: Option<u32>,
) -> u32 {
    if let Some(alias) = alias_hz {
        return alias;
    }
    if !rx_enabled && !avionics_powered {
        return 0;
    }
    raw_frequency_khz * 1000
}

pub struct VoiceAdapter<C: VoiceClient> {
    client: C,
    alias_map: HashMap<RadioIndex, Option<u32>>,
    mute_override: bool,
}

impl<C: VoiceClient> VoiceAdapter<C> {
    pub fn new(client: C) -> Self {
        VoiceAdapter { client, alias_map: HashMap::new(), mute_override: false }
    }

    pub fn radio_stack_changed(&mut self, state: RadioStackState, com1_alias_hz: Option<u32>, com2_alias_hz: Option<u32>) {
        let tx = if state.com1_tx { RadioIndex::Com1 } else { RadioIndex::Com2 };
        self.client.set_tx_radio(tx);
        self.client.set_radio_gain(RadioIndex::Com1, state.com1_volume);
        self.client.set_radio_gain(RadioIndex::Com2, state.com2_volume);

        let com1_freq = effective_frequency_hz(state.com1_frequency_khz, state.com1_rx, state.avionics_powered, com1_alias_hz);
        let com2_freq = effective_frequency_hz(state.com2_frequency_khz, state.com2_rx, state.avionics_powered, com2_alias_hz);

        if self.alias_map.get(&RadioIndex::Com1).copied().flatten() != com1_alias_hz {
            self.alias_map.insert(RadioIndex::Com1, com1_alias_hz);
        }
        if self.alias_map.get(&RadioIndex::Com2).copied().flatten() != com2_alias_hz {
            self.alias_map.insert(RadioIndex::Com2, com2_alias_hz);
        }

        self.client.set_radio_frequency(RadioIndex::Com1, com1_freq);
        self.client.set_radio_frequency(RadioIndex::Com2, com2_freq);

        self.mute_override = state.selcal_mute_override;
    }

    pub fn position_changed(&self, state: AircraftVisualState) {
        self.client.set_position(state);
    }

    pub fn ptt_pressed(&self) {
        if !self.mute_override {
            self.client.set_ptt(true);
        }
    }

    pub fn ptt_released(&self) {
        self.client.set_ptt(false);
    }

    pub fn network_connected(&self, callsign: &str, cid: &str, password: &str) {
        self.client.set_callsign(callsign);
        self.client.set_credentials(cid, password);
        self.client.connect();
    }

    pub fn network_disconnected(&self) {
        self.client.disconnect();
    }
}

/// A [`VoiceClient`] that does nothing. The voice-radio library itself
/// is external and not linked into this crate; a binary that has one
/// substitutes its own implementation, and this is what [`VoiceAdapter`]
/// is generic over until then.
#[derive(Debug, Default)]
pub struct NoopVoiceClient;

impl VoiceClient for NoopVoiceClient {
    fn set_callsign(&self, _callsign: &str) {}
    fn set_credentials(&self, _cid: &str, _password: &str) {}
    fn connect(&self) {}
    fn disconnect(&self) {}
    fn set_tx_radio(&self, _radio: RadioIndex) {}
    fn set_radio_gain(&self, _radio: RadioIndex, _volume: u8) {}
    fn set_radio_frequency(&self, _radio: RadioIndex, _effective_frequency_hz: u32) {}
    fn set_position(&self, _state: AircraftVisualState) {}
    fn set_ptt(&self, _active: bool) {}
    fn refresh_transceivers(&self) {}
    fn is_rx_active(&self, _radio: RadioIndex) -> bool {
        false
    }
}

/// Test double recording every call for assertion in tests.
pub struct MockVoiceClient {
    inner: Mutex<MockVoiceInner>,
}

#[derive(Default)]
struct MockVoiceInner {
    ptt_log: Vec<bool>,
    frequency_log: Vec<(RadioIndex, u32)>,
    connected: bool,
}

impl MockVoiceClient {
    pub fn new() -> Self {
        MockVoiceClient { inner: Mutex::new(MockVoiceInner::default()) }
    }

    pub fn ptt_log(&self) -> Vec<bool> {
        self.inner.lock().unwrap().ptt_log.clone()
    }

    pub fn frequency_log(&self) -> Vec<(RadioIndex, u32)> {
        self.inner.lock().unwrap().frequency_log.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.lock().unwrap().connected
    }
}

impl Default for MockVoiceClient {
    fn default() -> Self {
        MockVoiceClient::new()
    }
}

impl VoiceClient for MockVoiceClient {
    fn set_callsign(&self, _callsign: &str) {}
    fn set_credentials(&self, _cid: &str, _password: &str) {}
    fn connect(&self) {
        self.inner.lock().unwrap().connected = true;
    }
    fn disconnect(&self) {
        self.inner.lock().unwrap().connected = false;
    }
    fn set_tx_radio(&self, _radio: RadioIndex) {}
    fn set_radio_gain(&self, _radio: RadioIndex, _volume: u8) {}
    fn set_radio_frequency(&self, radio: RadioIndex, effective_frequency_hz: u32) {
        self.inner.lock().unwrap().frequency_log.push((radio, effective_frequency_hz));
    }
    fn set_position(&self, _state: AircraftVisualState) {}
    fn set_ptt(&self, active: bool) {
        self.inner.lock().unwrap().ptt_log.push(active);
    }
    fn refresh_transceivers(&self) {}
    fn is_rx_active(&self, _radio: RadioIndex) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_frequency_prefers_alias() {
        assert_eq!(effective_frequency_hz(128_000, true, true, Some(99_999)), 99_999);
    }

    #[test]
    fn effective_frequency_zero_when_unpowered_and_no_rx() {
        assert_eq!(effective_frequency_hz(128_000, false, false, None), 0);
    }

    #[test]
    fn ptt_respects_mute_override() {
        let mock = MockVoiceClient::new();
        let mut adapter = VoiceAdapter::new(mock);
        let mut state = RadioStackState {
            avionics_powered: true,
            com1_frequency_khz: 128_000,
            com1_tx: true,
            com1_rx: true,
            com1_volume: 100,
            com2_frequency_khz: 121_500,
            com2_tx: false,
            com2_rx: true,
            com2_volume: 100,
            transponder_code: 1200,
            mode_c: true,
            ident: false,
            selcal_mute_override: true,
        };
        adapter.radio_stack_changed(state, None, None);
        adapter.ptt_pressed();
        assert!(adapter.client.ptt_log().is_empty(), "mute override should suppress PTT");

        state.selcal_mute_override = false;
        adapter.radio_stack_changed(state, None, None);
        adapter.ptt_pressed();
        assert_eq!(adapter.client.ptt_log(), vec![true]);
    }

    #[test]
    fn network_connect_drives_mock_client() {
        let mock = MockVoiceClient::new();
        let adapter = VoiceAdapter::new(mock);
        adapter.network_connected("UAL1", "123456", "hunter2");
        assert!(adapter.client.is_connected());
        adapter.network_disconnected();
        assert!(!adapter.client.is_connected());
    }
}
