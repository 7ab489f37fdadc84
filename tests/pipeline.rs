use std::f64::consts::PI;

use approx::assert_abs_diff_eq;
use pitchmatch::analysis::PitchExtractor;
use pitchmatch::pipeline::{analyze, autotune};
use pitchmatch::types::Direction;
use pitchmatch::{AnalysisConfig, AnalysisError, Result, Waveform};

const SAMPLE_RATE: u32 = 44_100;
const A4: f32 = 440.0;
const B4: f32 = 493.88;

#[test]
fn sharp_take_is_reported_two_semitones_high() -> Result<()> {
    let config = AnalysisConfig::default();
    let user = tone(&[], B4, 10.0);
    let reference = tone(&[], A4, 10.0);

    let report = analyze(&user, &reference, &config)?;

    assert_eq!(report.alignment_offset_samples, 0);
    assert!(report.deviations.len() > 850);
    let mean_semitones = report
        .deviations
        .iter()
        .map(|d| d.semitone_difference)
        .sum::<f64>()
        / report.deviations.len() as f64;
    assert_abs_diff_eq!(mean_semitones, 2.0, epsilon = 0.05);
    for deviation in &report.deviations {
        assert_abs_diff_eq!(deviation.semitone_difference, 2.0, epsilon = 0.15);
        assert_eq!(deviation.nearest_note_user, "B4");
        assert_eq!(deviation.nearest_note_reference, "A4");
    }

    let summary = &report.summary;
    assert!(summary.overall_accuracy_percent < 5.0);
    assert_eq!(summary.dominant_direction, Some(Direction::TooHigh));
    assert_eq!(summary.flagged_frame_count, report.feedback.len());
    assert!(summary.verdict.starts_with("Moderate"));
    assert!(report
        .feedback
        .iter()
        .all(|item| item.direction == Direction::TooHigh));
    assert_eq!(report.segments.len(), 2);
    assert!(report.segments.iter().all(|s| s.accuracy_percent < 5.0));
    Ok(())
}

#[test]
fn autotune_pulls_sharp_take_onto_the_reference() -> Result<()> {
    let config = AnalysisConfig::default();
    let user = tone(&[], B4, 10.0);
    let reference = tone(&[], A4, 10.0);

    let corrected = autotune(&user, &reference, &config)?;
    assert_eq!(corrected.len(), user.len());
    assert_eq!(corrected.sample_rate(), SAMPLE_RATE);

    // frames whose analysis window reaches past either end of the clip
    let edge = config.frame_length / config.hop_length;
    let extractor = PitchExtractor::new(config);
    let corrected_contour = extractor.extract(&corrected)?;
    let reference_contour = extractor.extract(&reference)?;
    let frames = corrected_contour.len();
    let mut compared = 0;
    for (index, (&fixed, &target)) in corrected_contour
        .frequencies
        .iter()
        .zip(&reference_contour.frequencies)
        .enumerate()
    {
        if index < edge || index + edge >= frames {
            continue;
        }
        if fixed > 0.0 && target > 0.0 {
            assert!(
                (fixed - target).abs() < 5.0,
                "frame {index}: corrected {fixed} Hz, reference {target} Hz"
            );
            compared += 1;
        }
    }
    assert!(compared > 850);
    Ok(())
}

#[test]
fn autotune_against_itself_is_identity() -> Result<()> {
    let user = tone(&[], 311.13, 1.0);
    let corrected = autotune(&user, &user, &AnalysisConfig::default())?;
    assert_eq!(corrected, user);
    Ok(())
}

#[test]
fn leading_silence_in_reference_sets_offset() -> Result<()> {
    let lead = vec![0.0; 3_000];
    let reference = tone(&lead, A4, 1.5);
    let user = tone(&[], A4, 1.5);

    let report = analyze(&user, &reference, &AnalysisConfig::default())?;
    assert_eq!(report.alignment_offset_samples, 3_000);
    assert_abs_diff_eq!(report.alignment_offset_secs(), 3_000.0 / 44_100.0, epsilon = 1e-12);
    assert!(report.summary.average_deviation_hz < 2.0);
    assert_eq!(report.summary.overall_accuracy_percent, 100.0);
    assert!(report.feedback.is_empty());
    assert!(report.summary.verdict.starts_with("Excellent"));
    Ok(())
}

#[test]
fn late_user_entry_keeps_reference_in_place() -> Result<()> {
    let user = tone(&vec![0.0; 2_000], A4, 1.0);
    let reference = tone(&[], A4, 1.0);
    let report = analyze(&user, &reference, &AnalysisConfig::default())?;
    assert_eq!(report.alignment_offset_samples, 0);
    assert_eq!(report.user_contour.len(), report.reference_contour.len());
    Ok(())
}

#[test]
fn segments_follow_configured_duration() -> Result<()> {
    let config = AnalysisConfig {
        segment_duration_secs: 0.4,
        ..AnalysisConfig::default()
    };
    let user = tone(&[], B4, 1.0);
    let reference = tone(&[], A4, 1.0);
    let report = analyze(&user, &reference, &config)?;

    assert_eq!(report.segments.len(), 3);
    assert_abs_diff_eq!(report.segments[2].end_time, 1.0, epsilon = 1e-9);
    let counted: usize = report.segments.iter().map(|s| s.voiced_frame_count).sum();
    assert_eq!(counted, report.deviations.len());
    assert_eq!(report.segment_feedback.len(), 3);
    Ok(())
}

#[test]
fn empty_user_recording_fails_alignment() {
    let reference = tone(&[], A4, 0.5);
    let empty = Waveform::new(Vec::new(), SAMPLE_RATE);
    let result = analyze(&empty, &reference, &AnalysisConfig::default());
    assert!(matches!(result, Err(AnalysisError::Alignment(_))));
}

fn tone(lead: &[f32], frequency: f32, seconds: f32) -> Waveform {
    let total = (SAMPLE_RATE as f32 * seconds) as usize;
    let mut samples = lead.to_vec();
    samples.extend(
        (0..total).map(|index| {
            let t = index as f64 / SAMPLE_RATE as f64;
            (0.5 * (2.0 * PI * frequency as f64 * t).sin()) as f32
        }),
    );
    Waveform::new(samples, SAMPLE_RATE)
}
