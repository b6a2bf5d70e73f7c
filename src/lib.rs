//! # Slidecast
//!
//! Turn a PDF slide deck and a narration track into an MP4 where every slide
//! is shown exactly while it is being talked about.
//!
//! The heart of the library is the timing engine: it decides which slide
//! image is on screen for how long so that the durations add up to the audio
//! length. External programs (pdftoppm, ffprobe, ffmpeg) do the pixel work.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use slidecast::{
//!     config::Config,
//!     render::{RenderJob, VideoAssembler},
//!     timing::TimingSource,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let mut job = RenderJob::new("deck.pdf", "narration.m4a", "out/talk.mp4");
//! job.timing = TimingSource::from_csv_file("timings.csv")?;
//!
//! let report = VideoAssembler::new(Config::default()).assemble(&job).await?;
//! println!("Rendered {} slides in {:.1}s", report.slides, report.elapsed.as_secs_f64());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`slides`] - Slide image discovery and ordering
//! - [`timing`] - Equal split, timings tables and marker repair
//! - [`render`] - Concat playlist, external tools and the render pipeline
//! - [`assist`] - Helpers for AI-suggested markers and slide summaries
//! - [`config`] - Configuration management

pub mod assist;
pub mod config;
pub mod error;
pub mod render;
pub mod slides;
pub mod timing;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    error::{Result, SlidecastError},
    render::{RenderJob, RenderReport, VideoAssembler},
    slides::{SlideIndexer, SlideSet},
    timing::{DurationPlanner, MarkerNormalizer, TimingPlan, TimingSource},
};
