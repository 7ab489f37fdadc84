use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pitchmatch::alignment::align_by_onset;
use pitchmatch::audio::{decoder, encoder, excerpt, resample};
use pitchmatch::cli::{
    ensure_input_file, prepare_output_dir, AnalyzeArgs, Cli, Command, CorrectArgs, ExcerptArgs,
};
use pitchmatch::pipeline;
use pitchmatch::types::{AnalysisReport, Waveform};

/// Flagged frames printed before the listing is cut short.
const MAX_PRINTED_ITEMS: usize = 20;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "pitchmatch=debug"
    } else {
        "pitchmatch=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::Analyze(args) => run_analyze(&args),
        Command::Correct(args) => run_correct(&args),
        Command::Excerpt(args) => run_excerpt(&args),
    }
}

fn run_analyze(args: &AnalyzeArgs) -> Result<()> {
    let config = args.settings.resolve()?;
    println!("Pitchmatch v{}", env!("CARGO_PKG_VERSION"));
    println!("User:      {:?}", args.user);
    println!("Reference: {:?}", args.reference);

    println!("\n1. Decoding recordings...");
    let (user, reference) = load_pair(&args.user, &args.reference)?;

    println!("\n2. Aligning reference to the user's onset...");
    let alignment = align_by_onset(&user, &reference, config.onset_threshold)
        .context("Failed to align recordings")?;
    println!(
        "   Reference offset: {} samples ({:.3}s)",
        alignment.offset_samples,
        alignment.offset_seconds()
    );

    println!("\n3. Extracting and comparing pitch...");
    let report = pipeline::analyze_aligned(&alignment, &config).context("Analysis failed")?;
    println!(
        "   {} frames, {} voiced in both, {} segments",
        report.user_contour.len(),
        report.deviations.len(),
        report.segments.len()
    );

    print_report(&report);

    if let Some(path) = &args.json {
        write_json_report(&report, path)?;
        println!("\nWrote JSON report to {:?}", path);
    }

    if let Some(dir) = &args.output_dir {
        prepare_output_dir(dir)?;
        write_wav(&alignment.user, &dir.join("user_aligned.wav"))?;
        write_wav(&alignment.reference, &dir.join("reference_aligned.wav"))?;
        if args.autotune {
            println!("\n4. Correcting user pitch toward the reference...");
            let corrected = pipeline::autotune_from_report(&alignment, &report)
                .context("Pitch correction failed")?;
            write_wav(&corrected, &dir.join("user_autotuned.wav"))?;
        }
        println!("\nWrote aligned audio under {:?}", dir);
    }

    println!("\n✓ Analysis complete!");
    Ok(())
}

fn run_correct(args: &CorrectArgs) -> Result<()> {
    let config = args.settings.resolve()?;

    println!("1. Decoding recordings...");
    let (user, reference) = load_pair(&args.user, &args.reference)?;

    println!("\n2. Correcting user pitch toward the reference...");
    let corrected =
        pipeline::autotune(&user, &reference, &config).context("Pitch correction failed")?;

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        prepare_output_dir(parent)?;
    }
    write_wav(&corrected, &args.output)?;
    println!("\n✓ Correction complete!");
    Ok(())
}

fn run_excerpt(args: &ExcerptArgs) -> Result<()> {
    ensure_input_file(&args.input)?;
    let (start, end) = args.time_range()?;
    let audio = decoder::decode_audio(&args.input).context("Failed to decode input audio")?;
    let cut = excerpt::excerpt(&audio, start, end);
    println!(
        "Cut {:.3}s - {:.3}s ({} samples at {} Hz)",
        start,
        end.min(audio.duration_secs()),
        cut.len(),
        cut.sample_rate()
    );
    write_wav(&cut, &args.output)
}

/// Decode both recordings and bring the reference to the user's sample rate.
fn load_pair(user_path: &Path, reference_path: &Path) -> Result<(Waveform, Waveform)> {
    ensure_input_file(user_path)?;
    ensure_input_file(reference_path)?;

    let user = decoder::decode_audio(user_path).context("Failed to decode user audio")?;
    println!(
        "   User: {} samples at {} Hz ({:.2}s)",
        user.len(),
        user.sample_rate(),
        user.duration_secs()
    );
    let mut reference =
        decoder::decode_audio(reference_path).context("Failed to decode reference audio")?;
    println!(
        "   Reference: {} samples at {} Hz ({:.2}s)",
        reference.len(),
        reference.sample_rate(),
        reference.duration_secs()
    );

    if reference.sample_rate() != user.sample_rate() && !reference.is_empty() {
        println!(
            "   Resampling reference {} Hz -> {} Hz",
            reference.sample_rate(),
            user.sample_rate()
        );
        reference = resample::resample(&reference, user.sample_rate())
            .context("Failed to resample reference audio")?;
    }
    Ok((user, reference))
}

fn write_wav(waveform: &Waveform, path: &Path) -> Result<()> {
    encoder::encode_audio(waveform, path)
        .with_context(|| format!("Failed to write audio to {:?}", path))?;
    println!("   Wrote {:?}", path);
    Ok(())
}

fn write_json_report(report: &AnalysisReport, path: &Path) -> Result<()> {
    let file =
        fs::File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), report)
        .context("Failed to serialize analysis report")
}

fn print_report(report: &AnalysisReport) {
    let summary = &report.summary;
    println!("\n=== Pitch Report ===");
    println!("Overall accuracy:  {:.1}%", summary.overall_accuracy_percent);
    println!(
        "Average deviation: {:.1} Hz ({:.0} cents)",
        summary.average_deviation_hz, summary.average_deviation_cents
    );
    println!(
        "Max deviation:     {:.1} Hz ({:.0} cents)",
        summary.max_deviation_hz, summary.max_deviation_cents
    );
    println!(
        "Flagged frames:    {} of {}",
        summary.flagged_frame_count, summary.voiced_frame_count
    );

    println!("\nSegments:");
    for segment in &report.segments {
        println!(
            "  {:>2}. {:<14} accuracy {:5.1}%  mean {:6.1} Hz  max {:6.1} Hz",
            segment.index + 1,
            segment.time_range_label(),
            segment.accuracy_percent,
            segment.mean_abs_deviation_hz,
            segment.max_deviation_hz
        );
    }

    for segment in &report.segment_feedback {
        println!(
            "\n[{}] {} issue(s), {}",
            segment.time_range,
            segment.issues_count,
            segment.band.label()
        );
        for issue in &segment.main_issues {
            println!("  - {issue}");
        }
    }

    if !report.feedback.is_empty() {
        println!("\nFlagged moments:");
        for item in report.feedback.iter().take(MAX_PRINTED_ITEMS) {
            println!("  [{:?}] {}", item.severity, item.message);
        }
        if report.feedback.len() > MAX_PRINTED_ITEMS {
            println!(
                "  ... and {} more",
                report.feedback.len() - MAX_PRINTED_ITEMS
            );
        }
    }

    println!("\n{}", summary.verdict);
    for line in &summary.recommendations {
        println!("  * {line}");
    }
}
