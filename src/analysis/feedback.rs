use tracing::debug;

use crate::config::AnalysisConfig;
use crate::types::{
    Direction, FeedbackItem, FeedbackSummary, FrameDeviation, Segment, SegmentFeedback, Severity,
};

use super::segments::segment_slot;

/// Mean segment deviation below which the overall verdict is "good".
const VERDICT_GOOD_HZ: f64 = 30.0;
/// Mean segment deviation below which the overall verdict is "moderate".
const VERDICT_MODERATE_HZ: f64 = 60.0;

/// Everything the feedback stage derives from deviations and segments.
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub items: Vec<FeedbackItem>,
    pub segments: Vec<SegmentFeedback>,
    pub summary: FeedbackSummary,
}

/// Builds threshold-triggered feedback; purely descriptive.
#[derive(Debug, Clone, Default)]
pub struct FeedbackGenerator {
    config: AnalysisConfig,
}

impl FeedbackGenerator {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn generate(&self, deviations: &[FrameDeviation], segments: &[Segment]) -> Feedback {
        let threshold = self.config.feedback_threshold_hz;
        let flagged: Vec<&FrameDeviation> = deviations
            .iter()
            .filter(|deviation| exceeds_threshold(deviation, threshold))
            .collect();
        let items: Vec<FeedbackItem> = flagged.iter().map(|d| feedback_item(d)).collect();
        let segment_feedback = self.segment_feedback(&flagged, segments);
        let summary = self.summarize(deviations, &flagged, segments, &segment_feedback);
        debug!(
            flagged = items.len(),
            segments_with_issues = segment_feedback.len(),
            "generated feedback"
        );
        Feedback {
            items,
            segments: segment_feedback,
            summary,
        }
    }

    fn segment_feedback(
        &self,
        flagged: &[&FrameDeviation],
        segments: &[Segment],
    ) -> Vec<SegmentFeedback> {
        let length = self.config.segment_duration_secs;
        let mut buckets: Vec<Vec<&FrameDeviation>> = vec![Vec::new(); segments.len()];
        for &deviation in flagged {
            if let Some(bucket) =
                buckets.get_mut(segment_slot(deviation.timestamp_secs, length, segments.len()))
            {
                bucket.push(deviation);
            }
        }

        segments
            .iter()
            .zip(buckets)
            .filter_map(|(segment, inside)| {
                if inside.is_empty() {
                    return None;
                }
                Some(SegmentFeedback {
                    segment_index: segment.index,
                    time_range: segment.time_range_label(),
                    issues_count: inside.len(),
                    mean_abs_deviation_hz: segment.mean_abs_deviation_hz,
                    accuracy_percent: segment.accuracy_percent,
                    band: segment.band(
                        self.config.good_accuracy_percent,
                        self.config.moderate_accuracy_percent,
                    ),
                    main_issues: main_issues(&inside),
                })
            })
            .collect()
    }

    fn summarize(
        &self,
        deviations: &[FrameDeviation],
        flagged: &[&FrameDeviation],
        segments: &[Segment],
        segment_feedback: &[SegmentFeedback],
    ) -> FeedbackSummary {
        let count = deviations.len();
        let (average_hz, max_hz) = mean_and_max(deviations.iter().map(|d| d.abs_hz()));
        let (average_cents, max_cents) =
            mean_and_max(deviations.iter().map(|d| d.cents_difference.abs()));
        let overall_accuracy_percent = if count == 0 {
            100.0
        } else {
            let accurate = deviations
                .iter()
                .filter(|d| d.abs_hz() <= self.config.accuracy_threshold_hz)
                .count();
            accurate as f64 / count as f64 * 100.0
        };
        let dominant_direction = dominant_direction(segments, segment_feedback);

        FeedbackSummary {
            voiced_frame_count: count,
            flagged_frame_count: flagged.len(),
            overall_accuracy_percent,
            average_deviation_hz: average_hz,
            max_deviation_hz: max_hz,
            average_deviation_cents: average_cents,
            max_deviation_cents: max_cents,
            dominant_direction,
            verdict: verdict(segment_feedback).to_string(),
            recommendations: recommendations(dominant_direction, segment_feedback),
        }
    }
}

/// Strictly greater than: a deviation equal to the threshold is acceptable.
pub fn exceeds_threshold(deviation: &FrameDeviation, threshold_hz: f64) -> bool {
    deviation.abs_hz() > threshold_hz
}

pub fn feedback_item(deviation: &FrameDeviation) -> FeedbackItem {
    let direction = deviation.direction();
    let message = format!(
        "Pitch {} by {:.1} Hz ({:+.0} cents) at {:.2} s: sang {}, reference {}",
        direction.label(),
        deviation.abs_hz(),
        deviation.cents_difference,
        deviation.timestamp_secs,
        deviation.nearest_note_user,
        deviation.nearest_note_reference
    );
    FeedbackItem {
        timestamp: deviation.timestamp_secs,
        message,
        severity: Severity::from_cents(deviation.cents_difference),
        direction,
        hz_difference: deviation.hz_difference,
        cents_difference: deviation.cents_difference,
        user_note: deviation.nearest_note_user.clone(),
        reference_note: deviation.nearest_note_reference.clone(),
    }
}

fn main_issues(flagged: &[&FrameDeviation]) -> Vec<String> {
    let mut issues = Vec::new();
    for (direction, label) in [(Direction::TooHigh, "Too high"), (Direction::TooLow, "Too low")] {
        let (average, _) = mean_and_max(
            flagged
                .iter()
                .filter(|d| d.direction() == direction)
                .map(|d| d.abs_hz()),
        );
        if flagged.iter().any(|d| d.direction() == direction) {
            issues.push(format!("{label}: {average:.1} Hz average"));
        }
    }
    issues
}

/// Direction most voiced frames lean in, over the segments that have issues.
fn dominant_direction(
    segments: &[Segment],
    segment_feedback: &[SegmentFeedback],
) -> Option<Direction> {
    let (mut high, mut low) = (0usize, 0usize);
    for digest in segment_feedback {
        if let Some(segment) = segments.get(digest.segment_index) {
            high += segment.high_pitch_frame_count;
            low += segment.low_pitch_frame_count;
        }
    }
    match high.cmp(&low) {
        std::cmp::Ordering::Greater => Some(Direction::TooHigh),
        std::cmp::Ordering::Less => Some(Direction::TooLow),
        std::cmp::Ordering::Equal => None,
    }
}

fn verdict(segment_feedback: &[SegmentFeedback]) -> &'static str {
    if segment_feedback.is_empty() {
        return "Excellent! No significant pitch issues detected.";
    }
    let average = segment_feedback
        .iter()
        .map(|s| s.mean_abs_deviation_hz)
        .sum::<f64>()
        / segment_feedback.len() as f64;
    if average < VERDICT_GOOD_HZ {
        "Good performance! Minor pitch adjustments needed."
    } else if average < VERDICT_MODERATE_HZ {
        "Moderate pitch issues detected. Focus on the problematic segments."
    } else {
        "Significant pitch issues detected. Practice the highlighted segments."
    }
}

fn recommendations(
    dominant: Option<Direction>,
    segment_feedback: &[SegmentFeedback],
) -> Vec<String> {
    if segment_feedback.is_empty() {
        return Vec::new();
    }
    let mut lines = Vec::new();
    match dominant {
        Some(Direction::TooHigh) => {
            lines.push("Overall tendency: you are singing higher than the reference".to_string())
        }
        Some(Direction::TooLow) => {
            lines.push("Overall tendency: you are singing lower than the reference".to_string())
        }
        _ => lines.push("Overall tendency: deviations are balanced above and below".to_string()),
    }
    if let Some(worst) = segment_feedback
        .iter()
        .max_by(|a, b| a.mean_abs_deviation_hz.total_cmp(&b.mean_abs_deviation_hz))
    {
        lines.push(format!(
            "Focus on segment {} (highest deviation: {:.1} Hz)",
            worst.time_range, worst.mean_abs_deviation_hz
        ));
    }
    lines.push("Practice each problematic segment individually".to_string());
    lines.push("Listen to the reference audio for each segment".to_string());
    lines
}

fn mean_and_max<I>(values: I) -> (f64, f64)
where
    I: Iterator<Item = f64>,
{
    let mut total = 0.0;
    let mut count = 0usize;
    let mut max = 0.0f64;
    for value in values {
        total += value;
        count += 1;
        max = max.max(value);
    }
    if count == 0 {
        (0.0, 0.0)
    } else {
        (total / count as f64, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::compare::frame_deviation;
    use crate::analysis::segments::analyze_segments;
    use approx::assert_abs_diff_eq;

    fn generator() -> FeedbackGenerator {
        FeedbackGenerator::new(AnalysisConfig::default())
    }

    #[test]
    fn threshold_is_strict() {
        let at_threshold = frame_deviation(0, 0.0, 490.0, 440.0);
        let above = frame_deviation(1, 0.1, 491.0, 440.0);
        assert!(!exceeds_threshold(&at_threshold, 50.0));
        assert!(exceeds_threshold(&above, 50.0));

        let deviations = vec![at_threshold, above];
        let segments = analyze_segments(&deviations, 1.0, &AnalysisConfig::default()).unwrap();
        let feedback = generator().generate(&deviations, &segments);
        assert_eq!(feedback.items.len(), 1);
        assert_eq!(feedback.items[0].direction, Direction::TooHigh);
        assert!(feedback.items[0].message.contains("too high"));
    }

    #[test]
    fn clean_take_gets_excellent_verdict() {
        let deviations = vec![
            frame_deviation(0, 0.0, 441.0, 440.0),
            frame_deviation(1, 0.1, 439.0, 440.0),
        ];
        let segments = analyze_segments(&deviations, 1.0, &AnalysisConfig::default()).unwrap();
        let feedback = generator().generate(&deviations, &segments);
        assert!(feedback.items.is_empty());
        assert!(feedback.segments.is_empty());
        assert_eq!(feedback.summary.overall_accuracy_percent, 100.0);
        assert_eq!(feedback.summary.dominant_direction, None);
        assert!(feedback.summary.verdict.starts_with("Excellent"));
        assert!(feedback.summary.recommendations.is_empty());
    }

    #[test]
    fn summary_reports_dominant_low_direction() {
        let deviations = vec![
            frame_deviation(0, 0.0, 300.0, 440.0),
            frame_deviation(1, 0.1, 320.0, 440.0),
            frame_deviation(2, 6.0, 520.0, 440.0),
            frame_deviation(3, 6.1, 438.0, 440.0),
        ];
        let segments = analyze_segments(&deviations, 7.0, &AnalysisConfig::default()).unwrap();
        let feedback = generator().generate(&deviations, &segments);
        let summary = &feedback.summary;

        assert_eq!(summary.flagged_frame_count, 3);
        assert_eq!(summary.voiced_frame_count, 4);
        assert_eq!(summary.dominant_direction, Some(Direction::TooLow));
        assert_abs_diff_eq!(summary.overall_accuracy_percent, 25.0, epsilon = 1e-9);
        assert_abs_diff_eq!(summary.max_deviation_hz, 140.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            summary.average_deviation_hz,
            (140.0 + 120.0 + 80.0 + 2.0) / 4.0,
            epsilon = 1e-9
        );
        assert!(summary.verdict.starts_with("Significant"));
        assert!(summary.recommendations[0].contains("lower"));

        assert_eq!(feedback.segments.len(), 2);
        assert_eq!(feedback.segments[0].issues_count, 2);
        assert_eq!(feedback.segments[0].main_issues, vec!["Too low: 130.0 Hz average"]);
        assert_eq!(feedback.segments[1].main_issues, vec!["Too high: 80.0 Hz average"]);
        assert!(summary.recommendations[1].contains("0.0s - 5.0s"));
    }

    #[test]
    fn segment_issues_match_segment_statistics_for_short_segments() {
        let config = AnalysisConfig {
            segment_duration_secs: 0.1,
            ..AnalysisConfig::default()
        };
        for (sample_rate, hop) in [(8_000u32, 128usize), (44_100, 512), (22_050, 256), (16_000, 160)] {
            let deviations: Vec<FrameDeviation> = (0..2_000)
                .map(|i| {
                    let t = i as f64 * hop as f64 / sample_rate as f64;
                    frame_deviation(i, t, 600.0, 440.0)
                })
                .collect();
            let duration = 2_000.0 * hop as f64 / sample_rate as f64;
            let segments = analyze_segments(&deviations, duration, &config).unwrap();
            let feedback = FeedbackGenerator::new(config.clone()).generate(&deviations, &segments);

            let issues: usize = feedback.segments.iter().map(|s| s.issues_count).sum();
            assert_eq!(issues, deviations.len());
            for digest in &feedback.segments {
                assert_eq!(
                    digest.issues_count,
                    segments[digest.segment_index].voiced_frame_count,
                    "{sample_rate} Hz hop {hop} segment {}",
                    digest.segment_index
                );
            }
        }
    }

    #[test]
    fn dominant_direction_counts_every_voiced_frame_in_flagged_segments() {
        // one sharp frame is flagged, three slightly flat ones are not
        let deviations = vec![
            frame_deviation(0, 0.0, 520.0, 440.0),
            frame_deviation(1, 0.1, 435.0, 440.0),
            frame_deviation(2, 0.2, 436.0, 440.0),
            frame_deviation(3, 0.3, 437.0, 440.0),
            // clean segment: its flat frames do not vote
            frame_deviation(4, 6.0, 430.0, 440.0),
            frame_deviation(5, 6.1, 431.0, 440.0),
        ];
        let segments = analyze_segments(&deviations, 7.0, &AnalysisConfig::default()).unwrap();
        let feedback = generator().generate(&deviations, &segments);
        assert_eq!(feedback.summary.flagged_frame_count, 1);
        assert_eq!(feedback.summary.dominant_direction, Some(Direction::TooLow));

        let balanced = vec![
            frame_deviation(0, 0.0, 520.0, 440.0),
            frame_deviation(1, 0.1, 435.0, 440.0),
        ];
        let segments = analyze_segments(&balanced, 1.0, &AnalysisConfig::default()).unwrap();
        let feedback = generator().generate(&balanced, &segments);
        assert_eq!(feedback.summary.dominant_direction, None);
    }

    #[test]
    fn severity_tracks_cents() {
        let item = feedback_item(&frame_deviation(0, 0.0, 880.0, 440.0));
        assert_eq!(item.severity, Severity::High);
        assert_eq!(item.user_note, "A5");
        assert_eq!(item.reference_note, "A4");
    }
}
