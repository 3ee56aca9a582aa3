use fsd_protocol::{pack_pitch_bank_heading, unpack_pitch_bank_heading};

fn angular_distance(a: f64, b: f64) -> f64 {
    let mut d = (a - b) % 360.0;
    if d > 180.0 {
        d -= 360.0;
    } else if d < -180.0 {
        d += 360.0;
    }
    d.abs()
}

#[test]
fn pitch_bank_heading_round_trip_within_tolerance() {
    let samples = [
        (0.0, 0.0, 0.0),
        (45.0, -30.0, 90.0),
        (-90.0, 90.0, 180.0),
        (179.9, -179.9, 359.9),
        (-45.5, 12.25, 270.0),
        (89.9, -89.9, 0.1),
    ];

    for (pitch, bank, heading) in samples {
        let word = pack_pitch_bank_heading(pitch, bank, heading);
        let (p, b, h) = unpack_pitch_bank_heading(word);
        assert!(angular_distance(p, pitch) <= 0.36, "pitch {pitch} -> {p}");
        assert!(angular_distance(b, bank) <= 0.36, "bank {bank} -> {b}");
        assert!(angular_distance(h, heading) <= 0.36, "heading {heading} -> {h}");
    }
}

#[test]
fn reserved_bits_are_always_zero() {
    let word = pack_pitch_bank_heading(12.0, -34.0, 200.0);
    assert_eq!(word & 0x3, 0);
}
