use ndarray::ArrayView1;
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::types::{PitchContour, Waveform};

use super::spectrum::{bin_frequency, magnitude_spectrogram, Spectrogram};

/// Thresholds and band limits used when picking a frame's pitch.
#[derive(Debug, Clone, Copy)]
pub struct PeakCriteria {
    pub sample_rate: u32,
    pub frame_length: usize,
    pub fmin_hz: f32,
    pub fmax_hz: f32,
    pub min_magnitude: f32,
    pub peak_threshold: f32,
}

impl PeakCriteria {
    pub fn from_config(config: &AnalysisConfig, sample_rate: u32) -> Self {
        Self {
            sample_rate,
            frame_length: config.frame_length,
            fmin_hz: config.fmin_hz,
            fmax_hz: config.fmax_hz,
            min_magnitude: config.min_magnitude,
            peak_threshold: config.peak_threshold,
        }
    }
}

/// Turns mono waveforms into per-frame fundamental frequency contours.
#[derive(Debug, Clone, Default)]
pub struct PitchExtractor {
    config: AnalysisConfig,
}

impl PitchExtractor {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn spectrogram(&self, waveform: &Waveform) -> Result<Spectrogram> {
        waveform.validate()?;
        Ok(magnitude_spectrogram(
            waveform.samples(),
            waveform.sample_rate(),
            self.config.frame_length,
            self.config.hop_length,
        ))
    }

    /// One independent estimate per frame; unvoiced frames are `0.0`.
    pub fn extract(&self, waveform: &Waveform) -> Result<PitchContour> {
        let spectrogram = self.spectrogram(waveform)?;
        let criteria = PeakCriteria::from_config(&self.config, waveform.sample_rate());
        let frequencies: Vec<f32> = spectrogram
            .magnitudes
            .rows()
            .into_iter()
            .map(|row| pick_frame_pitch(row, &criteria))
            .collect();
        let contour = PitchContour::new(
            frequencies,
            self.config.hop_length,
            waveform.sample_rate(),
        );
        debug!(
            frames = contour.len(),
            voiced = contour.voiced_count(),
            sample_rate = contour.sample_rate,
            "extracted pitch contour"
        );
        Ok(contour)
    }
}

/// Strongest in-band spectral peak of one frame, refined to sub-bin precision.
pub fn pick_frame_pitch(magnitudes: ArrayView1<f32>, criteria: &PeakCriteria) -> f32 {
    let bins = magnitudes.len();
    if bins < 3 {
        return 0.0;
    }
    let frame_max = magnitudes.iter().copied().fold(0.0f32, f32::max);
    let floor = (criteria.peak_threshold * frame_max).max(criteria.min_magnitude);

    let mut best: Option<usize> = None;
    for bin in 1..bins - 1 {
        let frequency = bin_frequency(bin, criteria.sample_rate, criteria.frame_length);
        if frequency < criteria.fmin_hz || frequency >= criteria.fmax_hz {
            continue;
        }
        let magnitude = magnitudes[bin];
        let is_peak = magnitude > magnitudes[bin - 1] && magnitude >= magnitudes[bin + 1];
        if !is_peak || magnitude <= floor {
            continue;
        }
        if best.map_or(true, |current| magnitude > magnitudes[current]) {
            best = Some(bin);
        }
    }

    match best {
        Some(bin) => {
            let refined = bin as f32 + parabolic_offset(&magnitudes, bin);
            let hz = refined * criteria.sample_rate as f32 / criteria.frame_length as f32;
            // refinement may cross a band edge; fall back to the in-band bin centre
            if hz.is_finite() && hz >= criteria.fmin_hz && hz < criteria.fmax_hz {
                hz
            } else {
                bin_frequency(bin, criteria.sample_rate, criteria.frame_length)
            }
        }
        None => 0.0,
    }
}

/// Vertex of the parabola through the log magnitudes around `bin`, in bins.
fn parabolic_offset(magnitudes: &ArrayView1<f32>, bin: usize) -> f32 {
    let left = magnitudes[bin - 1].max(f32::MIN_POSITIVE).ln();
    let centre = magnitudes[bin].max(f32::MIN_POSITIVE).ln();
    let right = magnitudes[bin + 1].max(f32::MIN_POSITIVE).ln();
    let denominator = left - 2.0 * centre + right;
    if denominator.abs() < 1e-9 {
        return 0.0;
    }
    (0.5 * (left - right) / denominator).clamp(-0.5, 0.5)
}
