//! Pitch feedback for vocal practice: compare a learner's recording with a
//! reference, report where the pitch drifts, and optionally correct it.

pub mod alignment;
pub mod analysis;
pub mod audio;
pub mod cli;
pub mod config;
pub mod correction;
pub mod error;
pub mod pipeline;
pub mod types;

pub use config::AnalysisConfig;
pub use error::{AnalysisError, Result};
pub use types::{
    AnalysisReport, FeedbackItem, FrameDeviation, PitchContour, Segment, Severity, Waveform,
};
