//! Compare a learner's recording with a reference and write an intonation report.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};
use warble::classify::AccuracyThresholds;
use warble::io::load_wav;
use warble::pipeline::{compare_recordings, CompareConfig, VocalSeparator};
use warble::separate::{DemucsSeparator, Passthrough};
use warble::track::{PyinConfig, PyinTracker};
use warble::{report, Result};

#[derive(Debug, Parser)]
#[command(name = "warble", about = "Vocal intonation comparison")]
struct Args {
    /// Reference recording (WAV)
    reference: PathBuf,

    /// Learner recording (WAV)
    candidate: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Skip vocal separation (inputs are already isolated vocals)
    #[arg(long)]
    no_separation: bool,

    /// demucs executable used for vocal separation
    #[arg(long, default_value = "demucs")]
    demucs: PathBuf,

    /// Deviations below this many cents count as accurate
    #[arg(long, default_value_t = 25.0)]
    accurate_cents: f32,

    /// Deviations below this many cents count as slightly off
    #[arg(long, default_value_t = 50.0)]
    slight_cents: f32,

    /// Frame hop of the pitch tracker, in samples
    #[arg(long, default_value_t = 512)]
    hop_length: usize,
}

fn run(args: &Args) -> Result<()> {
    fs::create_dir_all(&args.output)?;

    let thresholds = AccuracyThresholds::new()
        .with_accurate_cents(args.accurate_cents)
        .with_slight_cents(args.slight_cents);
    thresholds.validate()?;
    let config = CompareConfig::new().with_thresholds(thresholds);

    info!("loading {}", args.reference.display());
    let reference = load_wav(&args.reference)?;
    info!("loading {}", args.candidate.display());
    let candidate = load_wav(&args.candidate)?;

    let separator: Box<dyn VocalSeparator + Sync> = if args.no_separation {
        Box::new(Passthrough)
    } else {
        Box::new(DemucsSeparator::new(args.output.join("separated")).with_program(&args.demucs))
    };
    let tracker = PyinTracker::new(PyinConfig::new().with_hop_length(args.hop_length));

    info!("separating vocals, tracking pitch and aligning");
    let result = compare_recordings(
        separator.as_ref(),
        &tracker,
        &reference,
        &candidate,
        &config,
    )?;

    let text = report::render_text(&result.comparison.report, &thresholds);
    fs::write(args.output.join("analysis.txt"), &text)?;
    let json = serde_json::to_string_pretty(&result)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    fs::write(args.output.join("report.json"), json)?;

    #[cfg(feature = "display")]
    write_plots(&args.output, &result, &thresholds)?;

    println!("{}", text);
    info!(
        "timing: mean offset {:.3}s, max offset {:.3}s",
        result.comparison.timing.mean_offset, result.comparison.timing.max_abs_offset
    );
    print_outputs(&args.output);
    Ok(())
}

#[cfg(feature = "display")]
fn write_plots(
    dir: &Path,
    result: &warble::pipeline::RecordingComparison,
    thresholds: &AccuracyThresholds,
) -> Result<()> {
    use warble::{align, deviation, display};

    let path = &result.comparison.alignment.path;
    display::contour_plot(&result.reference, &result.candidate, 1400, 300)
        .save_ppm(dir.join("pitch_raw.ppm"))?;
    let frames = deviation::aligned_contour(&result.reference, &result.candidate, path)?;
    display::aligned_contour_plot(&frames, 1400, 300).save_ppm(dir.join("pitch_aligned.ppm"))?;
    display::deviation_plot(&result.comparison.deviations, thresholds, 1400, 300)
        .save_ppm(dir.join("pitch_deviation.ppm"))?;
    let map = align::time_map(&result.reference, &result.candidate, path)?;
    display::rhythm_plot(&map, 600, 600).save_ppm(dir.join("rhythm.ppm"))?;
    display::spectrogram_comparison(
        &result.reference_vocals,
        &result.candidate_vocals,
        display::SPECTROGRAM_MAX_HZ,
    )?
    .save_ppm(dir.join("spectrogram_comparison.ppm"))?;
    Ok(())
}

fn print_outputs(dir: &Path) {
    println!("Results written to {}/", dir.display());
    println!("- analysis.txt: intonation report");
    println!("- report.json: alignment, deviations and statistics");
    if cfg!(feature = "display") {
        println!("- pitch_raw.ppm, pitch_aligned.ppm: pitch contours");
        println!("- pitch_deviation.ppm: deviation by tier");
        println!("- rhythm.ppm: timing alignment");
        println!("- spectrogram_comparison.ppm: vocal spectrograms up to 2 kHz");
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
