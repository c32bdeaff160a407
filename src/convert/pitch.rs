use super::{A4_HZ, CENTS_PER_OCTAVE, MIDI_A4};

const NOTES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Convert a frequency to cents relative to `reference_hz`.
///
/// Returns `None` for missing, non-positive or non-finite input instead of
/// producing `-inf` or `NaN`.
///
/// # Example
/// ```
/// use warble::convert::hz_to_cents;
///
/// let octave = hz_to_cents(Some(880.0), 440.0).unwrap();
/// assert!((octave - 1200.0).abs() < 1e-3);
/// assert_eq!(hz_to_cents(Some(0.0), 440.0), None);
/// assert_eq!(hz_to_cents(None, 440.0), None);
/// ```
pub fn hz_to_cents(frequency: Option<f32>, reference_hz: f32) -> Option<f32> {
    let f = frequency?;
    if !(f.is_finite() && f > 0.0) {
        return None;
    }
    Some(CENTS_PER_OCTAVE * (f / reference_hz).log2())
}

/// Convert a whole track to cents relative to `reference_hz`.
pub fn track_to_cents(frequencies: &[Option<f32>], reference_hz: f32) -> Vec<Option<f32>> {
    frequencies
        .iter()
        .map(|&f| hz_to_cents(f, reference_hz))
        .collect()
}

/// Signed distance in cents from `from_hz` to `to_hz`.
///
/// Computed from the raw frequency ratio so the result is not the difference
/// of two separately rounded cent values. Positive when `to_hz` is higher.
pub fn cents_between(from_hz: f32, to_hz: f32) -> Option<f32> {
    if !(from_hz.is_finite() && from_hz > 0.0 && to_hz.is_finite() && to_hz > 0.0) {
        return None;
    }
    Some(CENTS_PER_OCTAVE * (to_hz / from_hz).log2())
}

/// Convert frequency (Hz) to fractional MIDI note number.
pub fn hz_to_midi(frequency: f32) -> Option<f32> {
    hz_to_cents(Some(frequency), A4_HZ).map(|c| c / 100.0 + MIDI_A4)
}

/// Convert frequency (Hz) to the nearest equal-tempered note name, e.g. `"A4"`.
///
/// Returns an empty string for missing or non-positive input.
///
/// # Example
/// ```
/// use warble::convert::hz_to_note_name;
///
/// assert_eq!(hz_to_note_name(Some(440.0)), "A4");
/// assert_eq!(hz_to_note_name(Some(261.63)), "C4");
/// assert_eq!(hz_to_note_name(None), "");
/// ```
pub fn hz_to_note_name(frequency: Option<f32>) -> String {
    match frequency.and_then(hz_to_midi) {
        Some(midi) => midi_to_note(midi.round() as i32),
        None => String::new(),
    }
}

/// Convert MIDI note number to note name.
pub fn midi_to_note(midi: i32) -> String {
    let octave = midi.div_euclid(12) - 1;
    let note = NOTES[midi.rem_euclid(12) as usize];
    format!("{}{}", note, octave)
}
