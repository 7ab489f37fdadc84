use dasp::interpolate::linear::Linear;
use dasp::interpolate::Interpolator;

/// Resample one frame of `source` by `ratio` into `output`, additively.
///
/// The output sample at absolute index `t` reads the source near `t * ratio`,
/// folded back by whole source periods (`period`, in samples) so the read
/// stays next to the frame. Each call depends only on its own arguments; a
/// steady tone shifted frame by frame keeps its phase because every frame
/// uses the same absolute reference.
pub(crate) fn shift_frame(
    source: &[f32],
    start: usize,
    output: &mut [f32],
    ratio: f64,
    period: f64,
) {
    let anchor = read_anchor(start, ratio, period);
    for (offset, slot) in output.iter_mut().enumerate() {
        *slot += sample_at(source, anchor + offset as f64 * ratio);
    }
}

/// Source position read for the first sample of a frame starting at `start`.
fn read_anchor(start: usize, ratio: f64, period: f64) -> f64 {
    let start = start as f64;
    if !(period.is_finite() && period > 0.0) {
        return start;
    }
    let drift = start * (ratio - 1.0);
    start + drift - (drift / period).round() * period
}

/// Linearly interpolated read; positions outside the source are silent.
fn sample_at(source: &[f32], position: f64) -> f32 {
    if position < 0.0 {
        return 0.0;
    }
    let index = position.floor() as usize;
    let Some(&left) = source.get(index) else {
        return 0.0;
    };
    let right = source.get(index + 1).copied().unwrap_or(0.0);
    Linear::new(left, right).interpolate(position - index as f64)
}
