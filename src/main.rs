use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use slidecast::{
    config::Config,
    render::{RenderJob, VideoAssembler},
    timing::TimingSource,
    SlidecastError,
};

#[derive(Parser)]
#[command(
    name = "slidecast",
    version,
    about = "Turn a PDF slide deck and a narration track into an MP4",
    long_about = "Slidecast rasterizes a PDF, decides how long each slide stays on screen \
                  (equal split, a timings table or start markers) and encodes a video \
                  synchronized with the narration."
)]
struct Cli {
    /// PDF slide deck
    #[arg(long)]
    pdf: PathBuf,

    /// Narration audio (MP3, M4A, WAV, ...)
    #[arg(long)]
    audio: PathBuf,

    /// Output video file path
    #[arg(long)]
    out: PathBuf,

    /// CSV with `index,seconds` rows; unlisted slides share the rest
    #[arg(long, conflicts_with = "markers")]
    timings: Option<PathBuf>,

    /// JSON with `{ "markers": [{ "t": 0, "slide": 1 }, ...] }`
    #[arg(long)]
    markers: Option<PathBuf>,

    /// Working directory (default: work/slidecast-YYYYMMDD-HHMMSS)
    #[arg(long)]
    workdir: Option<PathBuf>,

    /// Keep the working directory after the run
    #[arg(long)]
    keep_work: bool,

    /// Probe the audio and print the planned steps without rendering
    #[arg(long)]
    dry_run: bool,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<SlidecastError>() {
            Some(err) => {
                eprintln!("Error: {}", err.user_message());
                if err.is_recoverable() {
                    eprintln!("This may be temporary; running the same command again can succeed.");
                }
            }
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!("Starting Slidecast v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => Config::default(),
    };

    let timing = match (&cli.timings, &cli.markers) {
        (Some(path), _) => {
            info!("Using timings from {:?}", path);
            TimingSource::from_csv_file(path)?
        }
        (None, Some(path)) => {
            info!("Using markers from {:?}", path);
            TimingSource::from_markers_file(path)?
        }
        (None, None) => TimingSource::Equal,
    };

    let job = RenderJob {
        pdf: cli.pdf,
        audio: cli.audio,
        output: cli.out,
        timing,
        workdir: cli.workdir,
        keep_work: cli.keep_work,
        dry_run: cli.dry_run,
    };

    let report = VideoAssembler::new(config).assemble(&job).await?;

    if job.dry_run {
        println!("Working directory: {}", report.workdir.display());
        println!("Audio duration:    {:.3}s", report.audio_seconds);
        println!("Planned steps:");
        for (number, step) in report.planned_steps.iter().enumerate() {
            println!("  {}. {}", number + 1, step);
        }
    } else {
        println!(
            "Done: {} ({} slides, {:.1}s audio, {:.1} MB, {:.1}s)",
            job.output.display(),
            report.slides,
            report.audio_seconds,
            report.output_bytes as f64 / 1024.0 / 1024.0,
            report.elapsed.as_secs_f64()
        );
    }

    Ok(())
}
