//! Onset-based alignment of a reference recording to a user recording.

use tracing::{debug, info};

use crate::error::{AnalysisError, Result};
use crate::types::Waveform;

/// Both recordings after shifting the reference so their onsets coincide.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    /// The user recording, untouched.
    pub user: Waveform,
    /// The reference trimmed (or silence-padded) to the user's length.
    pub reference: Waveform,
    /// Samples dropped from the start of the reference.
    pub offset_samples: usize,
    pub user_onset: usize,
    pub reference_onset: usize,
}

impl Alignment {
    pub fn offset_seconds(&self) -> f64 {
        self.offset_samples as f64 / self.user.sample_rate() as f64
    }

    pub fn duration_secs(&self) -> f64 {
        self.user.duration_secs()
    }
}

/// Index of the first sample whose absolute amplitude exceeds `threshold`.
pub fn detect_onset(samples: &[f32], threshold: f32) -> Option<usize> {
    samples.iter().position(|sample| sample.abs() > threshold)
}

/// Shift the reference so its first loud sample lines up with the user's.
///
/// Missing onsets count as index 0. Only the reference moves; its aligned copy
/// always has exactly as many samples as the user recording.
pub fn align_by_onset(
    user: &Waveform,
    reference: &Waveform,
    onset_threshold: f32,
) -> Result<Alignment> {
    if user.is_empty() || reference.is_empty() {
        return Err(AnalysisError::alignment(format!(
            "cannot align empty audio (user {} samples, reference {} samples)",
            user.len(),
            reference.len()
        )));
    }
    user.validate()?;
    reference.validate()?;
    if user.sample_rate() != reference.sample_rate() {
        return Err(AnalysisError::invalid_audio(format!(
            "sample rates differ: user {} Hz, reference {} Hz",
            user.sample_rate(),
            reference.sample_rate()
        )));
    }

    let user_onset = detect_onset(user.samples(), onset_threshold).unwrap_or_else(|| {
        debug!("no onset above threshold in user recording; aligning from start");
        0
    });
    let reference_onset = detect_onset(reference.samples(), onset_threshold).unwrap_or_else(|| {
        debug!("no onset above threshold in reference recording; aligning from start");
        0
    });
    let offset_samples = reference_onset.saturating_sub(user_onset);
    let aligned = shifted_window(reference.samples(), offset_samples, user.len());

    info!(
        user_onset,
        reference_onset,
        offset_samples,
        "aligned reference to user onset"
    );
    Ok(Alignment {
        user: user.clone(),
        reference: Waveform::new(aligned, reference.sample_rate()),
        offset_samples,
        user_onset,
        reference_onset,
    })
}

/// `samples[offset..offset + len]`, zero-filled past the end.
fn shifted_window(samples: &[f32], offset: usize, len: usize) -> Vec<f32> {
    let mut window = vec![0.0; len];
    if offset < samples.len() {
        let available = (samples.len() - offset).min(len);
        window[..available].copy_from_slice(&samples[offset..offset + available]);
    }
    window
}
