//! Loading, writing and reshaping audio around the analysis core.

pub mod decoder;
pub mod encoder;
pub mod excerpt;
pub mod resample;
