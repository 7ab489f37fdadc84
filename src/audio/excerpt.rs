use crate::types::Waveform;

/// Cut `[start_secs, end_secs)` out of a waveform, clamped to its extent.
///
/// Start rounds down and end rounds up to whole samples, so a flagged
/// timestamp is always inside the excerpt around it.
pub fn excerpt(waveform: &Waveform, start_secs: f64, end_secs: f64) -> Waveform {
    let rate = waveform.sample_rate() as f64;
    let total = waveform.len();

    let start = ((start_secs * rate).floor().max(0.0) as usize).min(total);
    let end = ((end_secs * rate).ceil().max(start as f64) as usize).min(total);

    Waveform::new(waveform.samples()[start..end].to_vec(), waveform.sample_rate())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Waveform {
        Waveform::new((0..1_000).map(|i| i as f32 / 1_000.0).collect(), 1_000)
    }

    #[test]
    fn cuts_requested_range() {
        let cut = excerpt(&ramp(), 0.25, 0.5);
        assert_eq!(cut.len(), 250);
        assert_eq!(cut.samples()[0], 0.25);
        assert_eq!(cut.sample_rate(), 1_000);
    }

    #[test]
    fn range_past_end_is_clamped() {
        let cut = excerpt(&ramp(), 0.5, 2.0);
        assert_eq!(cut.len(), 500);
    }

    #[test]
    fn inverted_or_out_of_range_is_empty() {
        assert!(excerpt(&ramp(), 0.6, 0.4).is_empty());
        assert!(excerpt(&ramp(), 3.0, 4.0).is_empty());
    }
}
