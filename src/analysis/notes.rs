//! Conversions between frequencies and well-tempered note units.

const A4_HZ: f64 = 440.0;
const A4_MIDI: f64 = 69.0;
const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Fractional MIDI note number for `hz`.
///
/// # Panics
/// When `hz` is not a positive finite number. Callers filter unvoiced
/// frames before converting, so reaching this is a programming error.
pub fn hz_to_midi(hz: f64) -> f64 {
    assert!(
        hz > 0.0 && hz.is_finite(),
        "hz_to_midi requires a positive frequency, got {hz}"
    );
    A4_MIDI + 12.0 * (hz / A4_HZ).log2()
}

pub fn midi_to_hz(midi: f64) -> f64 {
    A4_HZ * 2f64.powf((midi - A4_MIDI) / 12.0)
}

/// Frequency ratio produced by shifting `steps` semitones.
pub fn semitone_ratio(steps: f64) -> f64 {
    2f64.powf(steps / 12.0)
}

/// Name of the nearest note, e.g. `A4` for 440 Hz or `C#5` for 554 Hz.
pub fn note_name(hz: f64) -> String {
    let midi = hz_to_midi(hz).round() as i64;
    let name = NOTE_NAMES[midi.rem_euclid(12) as usize];
    let octave = midi.div_euclid(12) - 1;
    format!("{name}{octave}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_is_midi_69() {
        assert!((hz_to_midi(440.0) - 69.0).abs() < 1e-12);
        assert!((midi_to_hz(69.0) - 440.0).abs() < 1e-9);
    }

    #[test]
    fn names_follow_octave_convention() {
        assert_eq!(note_name(440.0), "A4");
        assert_eq!(note_name(261.63), "C4");
        assert_eq!(note_name(554.37), "C#5");
        assert_eq!(note_name(27.5), "A0");
    }

    #[test]
    fn nearest_note_rounds() {
        // 450 Hz is ~39 cents above A4
        assert_eq!(note_name(450.0), "A4");
        // 460 Hz is ~77 cents above A4, closer to A#4
        assert_eq!(note_name(460.0), "A#4");
    }

    #[test]
    fn semitone_ratio_doubles_per_octave() {
        assert!((semitone_ratio(12.0) - 2.0).abs() < 1e-12);
        assert!((semitone_ratio(0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    #[should_panic]
    fn non_positive_frequency_panics() {
        hz_to_midi(0.0);
    }
}
