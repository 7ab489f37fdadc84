use tracing::debug;

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::types::{FrameDeviation, Segment};

/// Slack when deciding whether the duration is an exact multiple of the segment length.
const BOUNDARY_EPSILON: f64 = 1e-9;
/// Upper bound on the number of windows one analysis may produce.
const MAX_SEGMENTS: usize = 1_000_000;

/// Partition `[0, duration_secs)` into contiguous fixed-length windows and
/// aggregate the deviations falling in each one.
///
/// The final segment may be shorter than `segment_duration_secs`. Windows with
/// no voiced frame pairs report 100% accuracy and zero deviation.
pub fn analyze_segments(
    deviations: &[FrameDeviation],
    duration_secs: f64,
    config: &AnalysisConfig,
) -> Result<Vec<Segment>> {
    if !(duration_secs > 0.0 && duration_secs.is_finite()) {
        return Err(AnalysisError::invalid_audio(format!(
            "aligned duration must be positive, got {duration_secs}"
        )));
    }
    let length = config.segment_duration_secs;
    let ratio = duration_secs / length;
    if !(ratio.is_finite() && ratio <= MAX_SEGMENTS as f64) {
        return Err(AnalysisError::invalid_config(format!(
            "segment_duration_secs {length} splits {duration_secs:.3} s into more than \
             {MAX_SEGMENTS} segments"
        )));
    }
    let count = segment_count(duration_secs, length);

    let mut buckets: Vec<Vec<&FrameDeviation>> = vec![Vec::new(); count];
    for deviation in deviations {
        buckets[segment_slot(deviation.timestamp_secs, length, count)].push(deviation);
    }

    let segments: Vec<Segment> = buckets
        .iter()
        .enumerate()
        .map(|(index, frames)| {
            let start = index as f64 * length;
            let end = ((index + 1) as f64 * length).min(duration_secs);
            segment_statistics(index, start, end, frames, config.accuracy_threshold_hz)
        })
        .collect();
    debug!(
        segments = segments.len(),
        duration_secs,
        segment_secs = length,
        "partitioned deviations into segments"
    );
    Ok(segments)
}

/// Index of the segment a frame at `timestamp_secs` belongs to.
///
/// Frames past the last boundary fold into the final segment.
pub(crate) fn segment_slot(timestamp_secs: f64, length: f64, count: usize) -> usize {
    ((timestamp_secs / length).floor().max(0.0) as usize).min(count.saturating_sub(1))
}

fn segment_count(duration_secs: f64, length: f64) -> usize {
    ((duration_secs / length - BOUNDARY_EPSILON).ceil() as usize).max(1)
}

/// Statistics over one window; `accuracy_threshold_hz` bounds "close enough".
pub fn segment_statistics(
    index: usize,
    start_time: f64,
    end_time: f64,
    frames: &[&FrameDeviation],
    accuracy_threshold_hz: f64,
) -> Segment {
    let mut segment = Segment {
        index,
        start_time,
        end_time,
        voiced_frame_count: frames.len(),
        mean_abs_deviation_hz: 0.0,
        median_abs_deviation_hz: 0.0,
        accuracy_percent: 100.0,
        max_deviation_hz: 0.0,
        std_deviation_hz: 0.0,
        mean_abs_deviation_cents: 0.0,
        max_deviation_cents: 0.0,
        high_pitch_frame_count: 0,
        low_pitch_frame_count: 0,
    };
    if frames.is_empty() {
        return segment;
    }

    let count = frames.len() as f64;
    let abs_hz: Vec<f64> = frames.iter().map(|f| f.abs_hz()).collect();
    let abs_cents: Vec<f64> = frames.iter().map(|f| f.cents_difference.abs()).collect();
    let signed_mean = frames.iter().map(|f| f.hz_difference).sum::<f64>() / count;
    let variance = frames
        .iter()
        .map(|f| (f.hz_difference - signed_mean).powi(2))
        .sum::<f64>()
        / count;
    let accurate = abs_hz
        .iter()
        .filter(|&&value| value <= accuracy_threshold_hz)
        .count();

    segment.mean_abs_deviation_hz = abs_hz.iter().sum::<f64>() / count;
    segment.median_abs_deviation_hz = median(&abs_hz);
    segment.accuracy_percent = accurate as f64 / count * 100.0;
    segment.max_deviation_hz = abs_hz.iter().copied().fold(0.0, f64::max);
    segment.std_deviation_hz = variance.sqrt();
    segment.mean_abs_deviation_cents = abs_cents.iter().sum::<f64>() / count;
    segment.max_deviation_cents = abs_cents.iter().copied().fold(0.0, f64::max);
    segment.high_pitch_frame_count = frames.iter().filter(|f| f.hz_difference > 0.0).count();
    segment.low_pitch_frame_count = frames.iter().filter(|f| f.hz_difference < 0.0).count();
    segment
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
