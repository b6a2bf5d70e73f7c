//! # Rendering
//!
//! Everything that touches external programs: the concat playlist handed to
//! ffmpeg, the tool runner, the per-job working directory and the
//! [`VideoAssembler`] that ties them together.
//!
//! ```rust,no_run
//! use slidecast::config::Config;
//! use slidecast::render::{RenderJob, VideoAssembler};
//!
//! # #[tokio::main]
//! # async fn main() -> slidecast::Result<()> {
//! let job = RenderJob::new("deck.pdf", "narration.m4a", "out/talk.mp4");
//! let report = VideoAssembler::new(Config::default()).assemble(&job).await?;
//! println!("{} slides, {} bytes", report.slides, report.output_bytes);
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod concat;
pub mod tools;
pub mod workdir;

pub use assembler::{RenderJob, RenderReport, VideoAssembler};
pub use concat::{render_concat, write_concat_file, CONCAT_FILE_NAME};
pub use tools::ToolRunner;
pub use workdir::WorkDir;
