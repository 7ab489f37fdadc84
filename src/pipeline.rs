//! End-to-end orchestration: align, extract, compare, aggregate, report.

use tracing::info;

use crate::alignment::{align_by_onset, Alignment};
use crate::analysis::{analyze_segments, compare_contours, FeedbackGenerator, PitchExtractor};
use crate::config::AnalysisConfig;
use crate::correction::correct_pitch;
use crate::error::Result;
use crate::types::{AnalysisReport, Waveform};

/// Compare a user recording against a reference and build the full report.
///
/// Either a complete report is produced or the first fatal error is returned.
pub fn analyze(
    user: &Waveform,
    reference: &Waveform,
    config: &AnalysisConfig,
) -> Result<AnalysisReport> {
    config.validate()?;
    let alignment = align_by_onset(user, reference, config.onset_threshold)?;
    analyze_aligned(&alignment, config)
}

/// Run every stage after alignment on an already aligned pair.
pub fn analyze_aligned(alignment: &Alignment, config: &AnalysisConfig) -> Result<AnalysisReport> {
    config.validate()?;
    let extractor = PitchExtractor::new(config.clone());
    let user_contour = extractor.extract(&alignment.user)?;
    let reference_contour = extractor.extract(&alignment.reference)?;

    let deviations = compare_contours(&user_contour, &reference_contour)?;
    let duration_secs = alignment.duration_secs();
    let segments = analyze_segments(&deviations, duration_secs, config)?;
    let feedback = FeedbackGenerator::new(config.clone()).generate(&deviations, &segments);

    info!(
        frames = user_contour.len(),
        compared = deviations.len(),
        segments = segments.len(),
        flagged = feedback.items.len(),
        accuracy = feedback.summary.overall_accuracy_percent,
        "analysis complete"
    );
    Ok(AnalysisReport {
        sample_rate: alignment.user.sample_rate(),
        hop_length: config.hop_length,
        duration_secs,
        alignment_offset_samples: alignment.offset_samples,
        user_contour,
        reference_contour,
        deviations,
        segments,
        feedback: feedback.items,
        segment_feedback: feedback.segments,
        summary: feedback.summary,
    })
}

/// Align both recordings and pull the user's pitch toward the aligned reference.
pub fn autotune(user: &Waveform, reference: &Waveform, config: &AnalysisConfig) -> Result<Waveform> {
    config.validate()?;
    let alignment = align_by_onset(user, reference, config.onset_threshold)?;
    let extractor = PitchExtractor::new(config.clone());
    let user_contour = extractor.extract(&alignment.user)?;
    let target = extractor.extract(&alignment.reference)?;
    correct_pitch(&alignment.user, &user_contour, &target)
}

/// Correct the aligned user recording using contours an earlier report already holds.
pub fn autotune_from_report(alignment: &Alignment, report: &AnalysisReport) -> Result<Waveform> {
    correct_pitch(
        &alignment.user,
        &report.user_contour,
        &report.reference_contour,
    )
}
