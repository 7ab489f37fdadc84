use dasp::interpolate::linear::Linear;
use dasp::{signal, Signal};
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::types::Waveform;

/// Linearly resample a waveform to `target_rate`.
///
/// The output holds `ceil(len * target / source)` samples; any tail the
/// interpolator cannot reach is filled with the last converted sample.
pub fn resample(waveform: &Waveform, target_rate: u32) -> Result<Waveform> {
    let source_rate = waveform.sample_rate();
    if source_rate == 0 || target_rate == 0 {
        return Err(AnalysisError::invalid_audio(format!(
            "cannot resample from {source_rate} Hz to {target_rate} Hz"
        )));
    }
    if waveform.is_empty() || source_rate == target_rate {
        return Ok(Waveform::new(waveform.samples().to_vec(), target_rate));
    }

    let output_len =
        (waveform.len() as u64 * target_rate as u64).div_ceil(source_rate as u64) as usize;
    let mut source = signal::from_iter(waveform.samples().iter().copied());
    let first = source.next();
    let second = source.next();
    let converter = source.from_hz_to_hz(
        Linear::new(first, second),
        source_rate as f64,
        target_rate as f64,
    );

    let mut output: Vec<f32> = converter.until_exhausted().take(output_len).collect();
    let fill = output.last().copied().unwrap_or(0.0);
    output.resize(output_len, fill);

    debug!(
        from = source_rate,
        to = target_rate,
        samples = output.len(),
        "resampled audio"
    );
    Ok(Waveform::new(output, target_rate))
}
