//! Core types for the pitch comparison pipeline

use serde::Serialize;

use crate::error::{AnalysisError, Result};

/// Mono audio clip with f32 samples normalized to roughly [-1.0, 1.0].
///
/// A waveform is never modified in place; alignment and correction always
/// allocate a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// Sample rate in Hz (e.g., 44100)
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Reject waveforms the analysis stages cannot process.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(AnalysisError::invalid_audio(
                "sample rate must be positive",
            ));
        }
        if self.samples.is_empty() {
            return Err(AnalysisError::invalid_audio("waveform contains no samples"));
        }
        if let Some(index) = self.samples.iter().position(|s| !s.is_finite()) {
            return Err(AnalysisError::invalid_audio(format!(
                "sample {index} is not a finite number"
            )));
        }
        Ok(())
    }
}

/// Per-frame fundamental frequency estimates; `0.0` marks an unvoiced frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PitchContour {
    pub frequencies: Vec<f32>,
    pub hop_length: usize,
    pub sample_rate: u32,
}

impl PitchContour {
    pub fn new(frequencies: Vec<f32>, hop_length: usize, sample_rate: u32) -> Self {
        Self {
            frequencies,
            hop_length,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Pitch of frame `index`, treating out-of-range frames as unvoiced.
    pub fn hz_at(&self, index: usize) -> f32 {
        self.frequencies.get(index).copied().unwrap_or(0.0)
    }

    pub fn is_voiced(&self, index: usize) -> bool {
        self.hz_at(index) > 0.0
    }

    pub fn voiced_count(&self) -> usize {
        self.frequencies.iter().filter(|&&hz| hz > 0.0).count()
    }

    /// Timestamp in seconds of the frame at `index`.
    pub fn frame_time(&self, index: usize) -> f64 {
        index as f64 * self.hop_length as f64 / self.sample_rate as f64
    }

    pub fn duration_secs(&self) -> f64 {
        self.frame_time(self.frequencies.len())
    }

    pub(crate) fn ensure_compatible(&self, other: &PitchContour) -> Result<()> {
        if self.hop_length != other.hop_length || self.sample_rate != other.sample_rate {
            return Err(AnalysisError::incompatible(format!(
                "hop {} @ {} Hz vs hop {} @ {} Hz",
                self.hop_length, self.sample_rate, other.hop_length, other.sample_rate
            )));
        }
        Ok(())
    }
}

/// Which side of the reference the user landed on.
///
/// Differences are always measured as user minus reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    TooHigh,
    TooLow,
    OnPitch,
}

impl Direction {
    pub fn from_difference(hz_difference: f64) -> Self {
        if hz_difference > 0.0 {
            Direction::TooHigh
        } else if hz_difference < 0.0 {
            Direction::TooLow
        } else {
            Direction::OnPitch
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::TooHigh => "too high",
            Direction::TooLow => "too low",
            Direction::OnPitch => "on pitch",
        }
    }
}

/// Deviation between user and reference for one frame where both are voiced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameDeviation {
    pub frame_index: usize,
    pub timestamp_secs: f64,
    pub user_hz: f64,
    pub reference_hz: f64,
    /// user - reference; positive means the user sang higher
    pub hz_difference: f64,
    /// Fractional MIDI difference, user - reference
    pub semitone_difference: f64,
    pub cents_difference: f64,
    pub nearest_note_user: String,
    pub nearest_note_reference: String,
}

impl FrameDeviation {
    pub fn direction(&self) -> Direction {
        Direction::from_difference(self.hz_difference)
    }

    pub fn abs_hz(&self) -> f64 {
        self.hz_difference.abs()
    }
}

/// Qualitative accuracy rating derived from a segment's accuracy percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyBand {
    Good,
    Moderate,
    Poor,
}

impl AccuracyBand {
    pub fn label(self) -> &'static str {
        match self {
            AccuracyBand::Good => "good",
            AccuracyBand::Moderate => "moderate",
            AccuracyBand::Poor => "poor",
        }
    }
}

/// Deviation statistics over one fixed-duration window of the aligned audio.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub index: usize,
    pub start_time: f64,
    pub end_time: f64,
    pub voiced_frame_count: usize,
    pub mean_abs_deviation_hz: f64,
    pub median_abs_deviation_hz: f64,
    pub accuracy_percent: f64,
    pub max_deviation_hz: f64,
    /// Standard deviation of the signed Hz difference
    pub std_deviation_hz: f64,
    pub mean_abs_deviation_cents: f64,
    pub max_deviation_cents: f64,
    pub high_pitch_frame_count: usize,
    pub low_pitch_frame_count: usize,
}

impl Segment {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn band(&self, good_percent: f64, moderate_percent: f64) -> AccuracyBand {
        if self.accuracy_percent >= good_percent {
            AccuracyBand::Good
        } else if self.accuracy_percent >= moderate_percent {
            AccuracyBand::Moderate
        } else {
            AccuracyBand::Poor
        }
    }

    pub fn time_range_label(&self) -> String {
        format!("{:.1}s - {:.1}s", self.start_time, self.end_time)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Grade by how far off the user was in cents.
    pub fn from_cents(cents: f64) -> Self {
        let cents = cents.abs();
        if cents >= 100.0 {
            Severity::High
        } else if cents >= 50.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// Human-readable note about one frame that missed the reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackItem {
    pub timestamp: f64,
    pub message: String,
    pub severity: Severity,
    pub direction: Direction,
    pub hz_difference: f64,
    pub cents_difference: f64,
    pub user_note: String,
    pub reference_note: String,
}

/// Per-segment digest of the flagged frames falling inside it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentFeedback {
    pub segment_index: usize,
    pub time_range: String,
    pub issues_count: usize,
    pub mean_abs_deviation_hz: f64,
    pub accuracy_percent: f64,
    pub band: AccuracyBand,
    pub main_issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackSummary {
    pub voiced_frame_count: usize,
    pub flagged_frame_count: usize,
    pub overall_accuracy_percent: f64,
    pub average_deviation_hz: f64,
    pub max_deviation_hz: f64,
    pub average_deviation_cents: f64,
    pub max_deviation_cents: f64,
    pub dominant_direction: Option<Direction>,
    pub verdict: String,
    pub recommendations: Vec<String>,
}

/// Complete result of comparing one user recording with one reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub sample_rate: u32,
    pub hop_length: usize,
    pub duration_secs: f64,
    pub alignment_offset_samples: usize,
    pub user_contour: PitchContour,
    pub reference_contour: PitchContour,
    pub deviations: Vec<FrameDeviation>,
    pub segments: Vec<Segment>,
    pub feedback: Vec<FeedbackItem>,
    pub segment_feedback: Vec<SegmentFeedback>,
    pub summary: FeedbackSummary,
}

impl AnalysisReport {
    pub fn alignment_offset_secs(&self) -> f64 {
        self.alignment_offset_samples as f64 / self.sample_rate as f64
    }
}
