use pilot_client::events::NetworkManagerEvent;
use pilot_client::NetworkManager;

/// Scenario 4: local SELCAL code `AB-CD`. An incoming `SELCAL AB-CD` on the
/// configured COM1 frequency fires the alert; `SELCAL EF-GH` on the same
/// frequency does not.
#[test]
fn matching_selcal_code_on_com1_triggers_alert_mismatched_does_not() {
    let mut manager = NetworkManager::new("FLC1");
    manager.set_com_frequencies(128_000, 121_500);

    let matching = manager.handle_radio_message("XYZ", 128_000, "SELCAL AB-CD", Some("AB-CD"));
    assert!(matches!(matching, Some(NetworkManagerEvent::SelcalAlert)));

    let mismatched = manager.handle_radio_message("XYZ", 128_000, "SELCAL EF-GH", Some("AB-CD"));
    assert!(mismatched.is_none());
}

#[test]
fn selcal_on_unmonitored_frequency_is_ignored() {
    let mut manager = NetworkManager::new("FLC1");
    manager.set_com_frequencies(128_000, 121_500);

    let off_frequency = manager.handle_radio_message("XYZ", 132_000, "SELCAL AB-CD", Some("AB-CD"));
    assert!(off_frequency.is_none());
}
