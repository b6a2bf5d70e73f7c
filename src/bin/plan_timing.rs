// Offline planner: prints the timing plan for an already rasterized deck

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use slidecast::{
    config::Config,
    render::render_concat,
    slides::SlideIndexer,
    timing::{DurationPlanner, TimingSource},
};

#[derive(Parser)]
#[command(
    name = "plan_timing",
    version,
    about = "Show how long each slide stays on screen, without running any external tool"
)]
struct Cli {
    /// Directory containing slide-<n>.png images
    #[arg(long)]
    slides: PathBuf,

    /// Audio duration in seconds
    #[arg(long)]
    duration: f64,

    /// CSV with `index,seconds` rows
    #[arg(long, conflicts_with = "markers")]
    timings: Option<PathBuf>,

    /// JSON marker document
    #[arg(long)]
    markers: Option<PathBuf>,

    /// Write the concat playlist to this file
    #[arg(long)]
    concat: Option<PathBuf>,

    /// Print the playlist to stdout as well
    #[arg(long)]
    show_playlist: bool,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let source = match (&cli.timings, &cli.markers) {
        (Some(path), _) => TimingSource::from_csv_file(path)?,
        (None, Some(path)) => TimingSource::from_markers_file(path)?,
        (None, None) => TimingSource::Equal,
    };

    let slides = SlideIndexer::scan(&cli.slides)?;
    let plan = DurationPlanner::new(config.timing).plan(&source, &slides, cli.duration)?;

    println!("📋 {} slides, {:.3}s audio, {}", slides.len(), cli.duration, source.describe());
    println!("{:>4}  {:>10}  {:>10}  image", "#", "start", "duration");

    for (position, ((image, duration), start)) in plan.entries().zip(plan.start_times()).enumerate() {
        let name = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| image.display().to_string());
        println!("{:>4}  {:>9.3}s  {:>9.3}s  {}", position + 1, start, duration, name);
    }
    println!("{:>4}  {:>10}  {:>9.3}s", "", "total", plan.total_duration());

    let playlist = render_concat(&plan, &std::env::current_dir()?);

    if cli.show_playlist {
        println!();
        print!("{}", playlist);
    }

    if let Some(path) = &cli.concat {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, playlist)?;
        println!("✅ Playlist written to {}", path.display());
    }

    Ok(())
}
