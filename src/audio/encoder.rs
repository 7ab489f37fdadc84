use crate::types::Waveform;
use anyhow::{Context, Result};
use std::path::Path;

/// Write a waveform as 16-bit mono PCM WAV
pub fn encode_audio<P: AsRef<Path>>(waveform: &Waveform, path: P) -> Result<()> {
    let path = path.as_ref();

    // 16-bit mono PCM at the waveform's rate
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: waveform.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    // Create WAV writer
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;

    // Write samples, clamped to [-1.0, 1.0]
    for &sample in waveform.samples() {
        let scaled = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(scaled)
            .context("Failed to write audio sample")?;
    }

    // Finalize the file
    writer.finalize().context("Failed to finalize WAV file")?;

    Ok(())
}
