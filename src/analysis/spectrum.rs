use ndarray::Array2;
use rustfft::{num_complex::Complex, FftPlanner};

/// Magnitude spectrogram with one row per centred analysis frame.
///
/// Magnitudes are normalized by the window gain, so a full-scale sine of
/// amplitude `A` peaks near `A`.
#[derive(Debug, Clone)]
pub struct Spectrogram {
    pub magnitudes: Array2<f32>,
    pub frame_length: usize,
    pub hop_length: usize,
    pub sample_rate: u32,
}

impl Spectrogram {
    pub fn frame_count(&self) -> usize {
        self.magnitudes.nrows()
    }

    pub fn bin_count(&self) -> usize {
        self.magnitudes.ncols()
    }

    pub fn bin_frequency(&self, bin: usize) -> f32 {
        bin_frequency(bin, self.sample_rate, self.frame_length)
    }
}

pub(crate) fn bin_frequency(bin: usize, sample_rate: u32, frame_length: usize) -> f32 {
    bin as f32 * sample_rate as f32 / frame_length as f32
}

/// Number of frames for a signal of `len` samples: `ceil(len / hop)`, at least one.
pub fn frame_count(len: usize, hop_length: usize) -> usize {
    len.div_ceil(hop_length).max(1)
}

/// Short-time magnitude spectrum; frame `i` is centred on sample `i * hop_length`
/// and zero-padded wherever it reaches past either end of the signal.
pub fn magnitude_spectrogram(
    samples: &[f32],
    sample_rate: u32,
    frame_length: usize,
    hop_length: usize,
) -> Spectrogram {
    let frames = frame_count(samples.len(), hop_length);
    let bins = frame_length / 2 + 1;
    let window = hann_window(frame_length);
    let gain = 2.0 / window.iter().sum::<f32>().max(f32::EPSILON);

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(frame_length);
    let mut buffer = vec![Complex::new(0.0, 0.0); frame_length];
    let mut magnitudes = Array2::<f32>::zeros((frames, bins));

    for frame in 0..frames {
        fill_frame(&mut buffer, samples, frame * hop_length, &window);
        fft.process(&mut buffer);
        for (bin, value) in buffer.iter().take(bins).enumerate() {
            magnitudes[[frame, bin]] = value.norm() * gain;
        }
    }

    Spectrogram {
        magnitudes,
        frame_length,
        hop_length,
        sample_rate,
    }
}

fn fill_frame(buffer: &mut [Complex<f32>], samples: &[f32], centre: usize, window: &[f32]) {
    let half = buffer.len() / 2;
    for (offset, slot) in buffer.iter_mut().enumerate() {
        let sample = (centre + offset)
            .checked_sub(half)
            .and_then(|index| samples.get(index))
            .copied()
            .unwrap_or(0.0);
        *slot = Complex::new(sample * window[offset], 0.0);
    }
}

/// Periodic Hann window.
fn hann_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / len as f32).cos())
        .collect()
}
