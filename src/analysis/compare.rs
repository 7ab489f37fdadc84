use tracing::debug;

use crate::error::Result;
use crate::types::{FrameDeviation, PitchContour};

use super::notes::{hz_to_midi, note_name};

/// Per-frame deviation of `user` from `reference`, user minus reference.
///
/// Frames where either side is unvoiced are skipped. Contours of unequal
/// length are compared over the shorter one.
pub fn compare_contours(
    user: &PitchContour,
    reference: &PitchContour,
) -> Result<Vec<FrameDeviation>> {
    user.ensure_compatible(reference)?;
    let frames = user.len().min(reference.len());
    let deviations: Vec<FrameDeviation> = (0..frames)
        .filter(|&index| user.is_voiced(index) && reference.is_voiced(index))
        .map(|index| {
            frame_deviation(
                index,
                user.frame_time(index),
                user.hz_at(index) as f64,
                reference.hz_at(index) as f64,
            )
        })
        .collect();
    debug!(
        frames,
        compared = deviations.len(),
        "compared pitch contours"
    );
    Ok(deviations)
}

/// Deviation record for a single pair of voiced pitches.
pub fn frame_deviation(
    frame_index: usize,
    timestamp_secs: f64,
    user_hz: f64,
    reference_hz: f64,
) -> FrameDeviation {
    let semitone_difference = hz_to_midi(user_hz) - hz_to_midi(reference_hz);
    FrameDeviation {
        frame_index,
        timestamp_secs,
        user_hz,
        reference_hz,
        hz_difference: user_hz - reference_hz,
        semitone_difference,
        cents_difference: semitone_difference * 100.0,
        nearest_note_user: note_name(user_hz),
        nearest_note_reference: note_name(reference_hz),
    }
}
