//! # Slide Discovery
//!
//! Finds the page images a rasterizer wrote into a working directory and
//! orders them by the page number embedded in their file names.
//!
//! ```rust,no_run
//! use slidecast::slides::SlideIndexer;
//!
//! # fn main() -> slidecast::Result<()> {
//! let slides = SlideIndexer::scan("work/job-1")?;
//! for slide in slides.iter() {
//!     println!("{:>3} {}", slide.index, slide.path.display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod indexer;
pub mod types;

pub use indexer::SlideIndexer;
pub use types::{Slide, SlideSet};
