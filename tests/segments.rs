use approx::assert_abs_diff_eq;
use pitchmatch::analysis::compare::frame_deviation;
use pitchmatch::analysis::{analyze_segments, FeedbackGenerator};
use pitchmatch::{AnalysisConfig, FrameDeviation, Result};

#[test]
fn segments_tile_the_duration_without_gaps() -> Result<()> {
    for (duration, length) in [(10.0, 5.0), (12.3, 5.0), (0.7, 5.0), (9.0, 2.5), (1.0, 0.1)] {
        let config = AnalysisConfig {
            segment_duration_secs: length,
            ..AnalysisConfig::default()
        };
        let segments = analyze_segments(&[], duration, &config)?;

        let expected = ((duration / length) - 1e-9).ceil().max(1.0) as usize;
        assert_eq!(segments.len(), expected, "D={duration} L={length}");
        assert_abs_diff_eq!(segments[0].start_time, 0.0);
        assert_abs_diff_eq!(segments.last().unwrap().end_time, duration, epsilon = 1e-9);
        for pair in segments.windows(2) {
            assert_abs_diff_eq!(pair[0].end_time, pair[1].start_time, epsilon = 1e-9);
        }
        for (index, segment) in segments.iter().enumerate() {
            assert_eq!(segment.index, index);
            assert!(segment.duration() > 0.0);
            assert!(segment.duration() <= length + 1e-9);
            assert_eq!(segment.accuracy_percent, 100.0);
        }
    }
    Ok(())
}

#[test]
fn every_deviation_lands_in_exactly_one_segment() -> Result<()> {
    let deviations: Vec<FrameDeviation> = (0..400)
        .map(|i| {
            let t = i as f64 * 0.03;
            frame_deviation(i, t, 440.0 + (i % 7) as f64 * 12.0, 440.0)
        })
        .collect();
    let duration = 12.0;
    let segments = analyze_segments(&deviations, duration, &AnalysisConfig::default())?;

    assert_eq!(segments.len(), 3);
    let counted: usize = segments.iter().map(|s| s.voiced_frame_count).sum();
    assert_eq!(counted, deviations.len());
    for segment in &segments {
        let inside = deviations
            .iter()
            .filter(|d| d.timestamp_secs >= segment.start_time && d.timestamp_secs < segment.end_time)
            .count();
        assert_eq!(inside, segment.voiced_frame_count);
        assert!(segment.max_deviation_hz >= segment.mean_abs_deviation_hz);
        assert!(
            segment.high_pitch_frame_count + segment.low_pitch_frame_count
                <= segment.voiced_frame_count
        );
    }
    Ok(())
}

#[test]
fn accuracy_counts_frames_at_the_threshold() -> Result<()> {
    let deviations = vec![
        frame_deviation(0, 0.0, 490.0, 440.0),
        frame_deviation(1, 0.1, 490.5, 440.0),
        frame_deviation(2, 0.2, 440.0, 440.0),
        frame_deviation(3, 0.3, 380.0, 440.0),
    ];
    let config = AnalysisConfig::default();
    let segments = analyze_segments(&deviations, 1.0, &config)?;
    let segment = &segments[0];

    assert_abs_diff_eq!(segment.accuracy_percent, 50.0, epsilon = 1e-9);
    assert_eq!(segment.high_pitch_frame_count, 2);
    assert_eq!(segment.low_pitch_frame_count, 1);

    let feedback = FeedbackGenerator::new(config).generate(&deviations, &segments);
    // 50.0 Hz is accurate and not flagged; 50.5 Hz is both inaccurate and flagged
    assert_eq!(feedback.items.len(), 2);
    assert_abs_diff_eq!(feedback.summary.overall_accuracy_percent, 50.0, epsilon = 1e-9);
    Ok(())
}

#[test]
fn zero_duration_is_rejected() {
    assert!(analyze_segments(&[], 0.0, &AnalysisConfig::default()).is_err());
}
