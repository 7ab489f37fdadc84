use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::config::AnalysisConfig;

/// Pitchmatch - compare a sung take against a reference recording
#[derive(Parser, Debug)]
#[command(name = "pitchmatch", version, about = "Vocal pitch comparison and correction")]
pub struct Cli {
    /// Log debug detail from every pipeline stage
    #[arg(long, short, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compare a user recording against a reference and print feedback.
    Analyze(AnalyzeArgs),
    /// Write the user recording pitch-corrected toward the reference.
    Correct(CorrectArgs),
    /// Cut a time range out of an audio file.
    Excerpt(ExcerptArgs),
}

/// Settings shared by every command that runs the analysis pipeline.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// JSON file with analysis settings; missing keys keep their defaults.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Samples between successive pitch frames.
    #[arg(long = "hop-length", value_name = "SAMPLES")]
    pub hop_length: Option<usize>,
    /// Length of each analysis segment in seconds.
    #[arg(long = "segment-duration", value_name = "SECONDS")]
    pub segment_duration: Option<f64>,
    /// Deviation in Hz above which a frame is reported.
    #[arg(long = "feedback-threshold", value_name = "HZ")]
    pub feedback_threshold: Option<f64>,
    /// Deviation in Hz up to which a frame counts as accurate.
    #[arg(long = "accuracy-threshold", value_name = "HZ")]
    pub accuracy_threshold: Option<f64>,
    /// Amplitude a sample must exceed to mark the onset.
    #[arg(long = "onset-threshold", value_name = "AMPLITUDE")]
    pub onset_threshold: Option<f32>,
    /// Lowest pitch the extractor considers.
    #[arg(long = "fmin", value_name = "HZ")]
    pub fmin: Option<f32>,
    /// Highest pitch the extractor considers.
    #[arg(long = "fmax", value_name = "HZ")]
    pub fmax: Option<f32>,
}

impl ConfigArgs {
    /// Load the config file (or defaults), apply overrides, then validate.
    pub fn resolve(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {:?}", path))?,
            None => AnalysisConfig::default(),
        };
        if let Some(value) = self.hop_length {
            config.hop_length = value;
        }
        if let Some(value) = self.segment_duration {
            config.segment_duration_secs = value;
        }
        if let Some(value) = self.feedback_threshold {
            config.feedback_threshold_hz = value;
        }
        if let Some(value) = self.accuracy_threshold {
            config.accuracy_threshold_hz = value;
        }
        if let Some(value) = self.onset_threshold {
            config.onset_threshold = value;
        }
        if let Some(value) = self.fmin {
            config.fmin_hz = value;
        }
        if let Some(value) = self.fmax {
            config.fmax_hz = value;
        }
        config.validate().context("Invalid analysis settings")?;
        Ok(config)
    }
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// The user's sung recording (MP3, OGG, FLAC, WAV, ...)
    #[arg(value_name = "USER")]
    pub user: PathBuf,
    /// The reference recording to compare against
    #[arg(value_name = "REFERENCE")]
    pub reference: PathBuf,
    #[command(flatten)]
    pub settings: ConfigArgs,
    /// Write the full report as JSON
    #[arg(long, value_name = "FILE")]
    pub json: Option<PathBuf>,
    /// Write the aligned recordings (and the corrected take) as WAV files here
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
    /// Also produce a pitch-corrected user recording (requires --output-dir)
    #[arg(long, requires = "output_dir")]
    pub autotune: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CorrectArgs {
    #[arg(value_name = "USER")]
    pub user: PathBuf,
    #[arg(value_name = "REFERENCE")]
    pub reference: PathBuf,
    /// Destination WAV file
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,
    #[command(flatten)]
    pub settings: ConfigArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ExcerptArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
    /// Destination WAV file
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,
    /// Start time (seconds or HH:MM:SS.mmm)
    #[arg(long, value_name = "TIME")]
    pub start: String,
    /// End time (seconds or HH:MM:SS.mmm)
    #[arg(long, value_name = "TIME")]
    pub end: String,
}

impl ExcerptArgs {
    pub fn time_range(&self) -> Result<(f64, f64)> {
        let start = parse_time(&self.start, "start")?;
        let end = parse_time(&self.end, "end")?;
        ensure!(end > start, "End time must be greater than start time");
        Ok((start, end))
    }
}

/// Fail early with a readable message when an input path is unusable.
pub fn ensure_input_file(path: &Path) -> Result<()> {
    ensure!(path.exists(), "Input file does not exist: {:?}", path);
    ensure!(path.is_file(), "Input path is not a file: {:?}", path);
    Ok(())
}

/// Create `dir` if needed, refusing paths that exist as something else.
pub fn prepare_output_dir(dir: &Path) -> Result<()> {
    ensure!(
        !dir.exists() || dir.is_dir(),
        "Output path must be a directory: {:?}",
        dir
    );
    fs::create_dir_all(dir).with_context(|| format!("Failed to create output directory {:?}", dir))
}

fn parse_time(raw: &str, label: &str) -> Result<f64> {
    parse_time_to_seconds(raw).with_context(|| format!("Invalid {} time '{}'", label, raw))
}

/// Seconds (`12.5`) or clock time (`MM:SS.mmm`, `HH:MM:SS.mmm`).
pub fn parse_time_to_seconds(raw: &str) -> Result<f64> {
    if raw.contains(':') {
        return parse_clock_time(raw);
    }

    let seconds: f64 = raw
        .parse()
        .with_context(|| format!("Failed to parse seconds value '{}'", raw))?;
    ensure!(
        seconds.is_finite() && seconds >= 0.0,
        "Time values must be non-negative"
    );
    Ok(seconds)
}

fn parse_clock_time(raw: &str) -> Result<f64> {
    let parts: Vec<&str> = raw.split(':').collect();
    ensure!(
        (2..=3).contains(&parts.len()),
        "Time format must be MM:SS or HH:MM:SS"
    );

    let mut total = 0.0;
    for (part, (name, scale)) in parts.iter().rev().zip([
        ("seconds", 1.0),
        ("minutes", 60.0),
        ("hours", 3600.0),
    ]) {
        let value = part
            .parse::<f64>()
            .with_context(|| format!("Invalid {} component '{}'", name, part))?;
        ensure!(value >= 0.0, "{} must be non-negative", name);
        total += value * scale;
    }
    Ok(total)
}
