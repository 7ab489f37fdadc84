//! Error taxonomy shared by every analysis stage.

use thiserror::Error;

/// Convenient alias for results returned by the analysis core.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Fatal conditions that abort an analysis request.
///
/// Unvoiced frames, silent channels and missing onsets are not errors; they
/// degrade to vacuous values inside the individual stages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Malformed or empty waveform, or a non-positive sample rate.
    #[error("invalid audio: {0}")]
    InvalidAudio(String),
    /// The aligner was handed a zero-length waveform.
    #[error("alignment failed: {0}")]
    Alignment(String),
    /// A configuration value is outside its valid domain.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Two pitch contours were produced with different framing parameters.
    #[error("incompatible pitch contours: {0}")]
    IncompatibleContours(String),
}

impl AnalysisError {
    pub fn invalid_audio(message: impl Into<String>) -> Self {
        Self::InvalidAudio(message.into())
    }

    pub fn alignment(message: impl Into<String>) -> Self {
        Self::Alignment(message.into())
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    pub fn incompatible(message: impl Into<String>) -> Self {
        Self::IncompatibleContours(message.into())
    }
}
