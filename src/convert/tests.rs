use super::*;
use approx::assert_abs_diff_eq;

#[test]
fn test_octave_is_1200_cents() {
    let a4 = hz_to_cents(Some(440.0), 440.0).unwrap();
    let a5 = hz_to_cents(Some(880.0), 440.0).unwrap();
    assert_abs_diff_eq!(a4, 0.0, epsilon = 1e-4);
    assert_abs_diff_eq!(a5 - a4, 1200.0, epsilon = 1e-3);
}

#[test]
fn test_cents_missing_propagation() {
    assert_eq!(hz_to_cents(None, 440.0), None);
    assert_eq!(hz_to_cents(Some(0.0), 440.0), None);
    assert_eq!(hz_to_cents(Some(-220.0), 440.0), None);
    assert_eq!(hz_to_cents(Some(f32::NAN), 440.0), None);
}

#[test]
fn test_track_to_cents() {
    let cents = track_to_cents(&[Some(220.0), None, Some(440.0)], 440.0);
    assert_abs_diff_eq!(cents[0].unwrap(), -1200.0, epsilon = 1e-3);
    assert_eq!(cents[1], None);
    assert_abs_diff_eq!(cents[2].unwrap(), 0.0, epsilon = 1e-4);
}

#[test]
fn test_cents_between() {
    assert_abs_diff_eq!(cents_between(440.0, 466.1638).unwrap(), 100.0, epsilon = 1e-2);
    assert_abs_diff_eq!(cents_between(440.0, 415.3047).unwrap(), -100.0, epsilon = 1e-2);
    assert_eq!(cents_between(0.0, 440.0), None);
}

#[test]
fn test_note_names() {
    assert_eq!(midi_to_note(69), "A4");
    assert_eq!(midi_to_note(60), "C4");
    assert_eq!(midi_to_note(0), "C-1");
    assert_eq!(midi_to_note(-1), "B-2");
    assert_eq!(hz_to_note_name(Some(440.0)), "A4");
    assert_eq!(hz_to_note_name(Some(450.0)), "A4");
    assert_eq!(hz_to_note_name(Some(466.16)), "A#4");
    assert_eq!(hz_to_note_name(Some(65.41)), "C2");
    assert_eq!(hz_to_note_name(Some(0.0)), "");
}

#[test]
fn test_hz_to_midi() {
    assert_abs_diff_eq!(hz_to_midi(440.0).unwrap(), 69.0, epsilon = 1e-4);
    assert_abs_diff_eq!(hz_to_midi(261.6256).unwrap(), 60.0, epsilon = 1e-3);
    assert_eq!(hz_to_midi(0.0), None);
}
