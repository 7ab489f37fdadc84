//! Frame-by-frame pitch correction toward a target contour ("auto-tune").
//!
//! Every frame is corrected on its own. Frames do not overlap and are not
//! cross-faded, so a shifted frame can meet its neighbour with an audible
//! discontinuity.

mod shifter;

use tracing::info;

use crate::analysis::notes::{hz_to_midi, semitone_ratio};
use crate::analysis::spectrum::frame_count;
use crate::error::{AnalysisError, Result};
use crate::types::{PitchContour, Waveform};

use shifter::shift_frame;

/// Shifts below this many semitones are treated as no shift at all.
const IDENTITY_STEPS: f64 = 1e-9;

/// Shift every frame where both contours are voiced by
/// `midi(target) - midi(user)` fractional semitones; copy every other frame.
///
/// The result has the same sample rate and sample count as `user`. Target
/// frames past the end of `target` are treated as unvoiced.
pub fn correct_pitch(
    user: &Waveform,
    user_contour: &PitchContour,
    target: &PitchContour,
) -> Result<Waveform> {
    user.validate()?;
    user_contour.ensure_compatible(target)?;
    if user_contour.sample_rate != user.sample_rate() {
        return Err(AnalysisError::incompatible(format!(
            "contour sample rate {} Hz does not match waveform {} Hz",
            user_contour.sample_rate,
            user.sample_rate()
        )));
    }

    let hop = user_contour.hop_length;
    let source = user.samples();
    let mut corrected = vec![0.0f32; source.len()];
    let (mut shifted, mut copied) = (0usize, 0usize);

    for frame in 0..frame_count(source.len(), hop) {
        let start = frame * hop;
        let end = (start + hop).min(source.len());
        let user_hz = user_contour.hz_at(frame) as f64;
        let target_hz = target.hz_at(frame) as f64;
        let output = &mut corrected[start..end];

        let steps = if user_hz > 0.0 && target_hz > 0.0 {
            Some(hz_to_midi(target_hz) - hz_to_midi(user_hz))
        } else {
            None
        };
        match steps {
            Some(steps) if steps.abs() > IDENTITY_STEPS => {
                let period = user.sample_rate() as f64 / user_hz;
                shift_frame(source, start, output, semitone_ratio(steps), period);
                shifted += 1;
            }
            _ => {
                for (slot, &sample) in output.iter_mut().zip(&source[start..end]) {
                    *slot += sample;
                }
                copied += 1;
            }
        }
    }

    info!(shifted, copied, hop, "pitch correction finished");
    Ok(Waveform::new(corrected, user.sample_rate()))
}
