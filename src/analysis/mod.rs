//! Pitch extraction, contour comparison and the statistics built on top of it.

pub mod compare;
pub mod feedback;
pub mod notes;
pub mod pitch;
pub mod segments;
pub mod spectrum;

pub use compare::compare_contours;
pub use feedback::{Feedback, FeedbackGenerator};
pub use pitch::PitchExtractor;
pub use segments::analyze_segments;
