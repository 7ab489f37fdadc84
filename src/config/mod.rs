use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Tunable parameters threaded through every analysis stage.
///
/// Missing fields in a JSON file fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Samples between consecutive pitch frames.
    pub hop_length: usize,
    /// FFT size of each analysis frame; must be a power of two.
    pub frame_length: usize,
    pub fmin_hz: f32,
    pub fmax_hz: f32,
    /// Smallest window-normalized magnitude a spectral peak may have.
    pub min_magnitude: f32,
    /// Peaks below this fraction of the frame's strongest bin are ignored.
    pub peak_threshold: f32,
    /// Absolute amplitude that marks the first voiced sample.
    pub onset_threshold: f32,
    pub segment_duration_secs: f64,
    /// Frames whose |Hz difference| exceeds this produce feedback.
    pub feedback_threshold_hz: f64,
    /// Frames whose |Hz difference| stays within this count as accurate.
    pub accuracy_threshold_hz: f64,
    pub good_accuracy_percent: f64,
    pub moderate_accuracy_percent: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            hop_length: 512,
            frame_length: 2048,
            fmin_hz: 50.0,
            fmax_hz: 8000.0,
            min_magnitude: 0.005,
            peak_threshold: 0.1,
            onset_threshold: 0.02,
            segment_duration_secs: 5.0,
            feedback_threshold_hz: 50.0,
            accuracy_threshold_hz: 50.0,
            good_accuracy_percent: 80.0,
            moderate_accuracy_percent: 50.0,
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_json::from_str(raw)
            .map_err(|err| AnalysisError::invalid_config(format!("malformed JSON: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            AnalysisError::invalid_config(format!("failed to read {}: {err}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        ensure(self.hop_length > 0, "hop_length must be greater than zero")?;
        ensure(
            self.frame_length.is_power_of_two(),
            "frame_length must be a power of two",
        )?;
        ensure(
            self.frame_length >= self.hop_length,
            "frame_length must be at least hop_length",
        )?;
        ensure(
            self.fmin_hz > 0.0 && self.fmin_hz < self.fmax_hz,
            "frequency band requires 0 < fmin_hz < fmax_hz",
        )?;
        ensure(
            self.min_magnitude >= 0.0 && self.peak_threshold >= 0.0,
            "magnitude thresholds must be non-negative",
        )?;
        ensure(
            self.onset_threshold >= 0.0,
            "onset_threshold must be non-negative",
        )?;
        ensure(
            self.segment_duration_secs > 0.0 && self.segment_duration_secs.is_finite(),
            "segment_duration_secs must be positive",
        )?;
        ensure(
            self.feedback_threshold_hz >= 0.0 && self.accuracy_threshold_hz >= 0.0,
            "Hz thresholds must be non-negative",
        )?;
        ensure(
            self.moderate_accuracy_percent <= self.good_accuracy_percent,
            "moderate_accuracy_percent must not exceed good_accuracy_percent",
        )?;
        Ok(())
    }
}

fn ensure(condition: bool, message: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(AnalysisError::invalid_config(message))
    }
}
