//! # Timing Engine
//!
//! Partitions the narration timeline into one display interval per slide
//! entry. Three strategies are available:
//!
//! - **Equal split**: every slide gets the same share
//! - **Timings table**: explicit seconds for some slides, the rest share what is left
//! - **Markers**: `(time, slide)` start points, repaired by [`MarkerNormalizer`]
//!
//! Every strategy yields a [`TimingPlan`] whose durations are strictly
//! positive and sum to the audio duration.
//!
//! ```rust
//! use slidecast::slides::{Slide, SlideSet};
//! use slidecast::timing::{DurationPlanner, RawMarker, TimingSource};
//!
//! # fn main() -> slidecast::Result<()> {
//! let slides: SlideSet = (1..=3)
//!     .map(|i| Slide::new(i, format!("/tmp/slide-{}.png", i)))
//!     .collect();
//!
//! let source = TimingSource::Markers(vec![
//!     RawMarker::new(0.0, 1.0),
//!     RawMarker::new(0.0, 2.0), // duplicate time, repaired
//!     RawMarker::new(5.0, 3.0),
//! ]);
//!
//! let plan = DurationPlanner::default().plan(&source, &slides, 10.0)?;
//! assert_eq!(plan.len(), 3);
//! assert!((plan.total_duration() - 10.0).abs() < 1e-9);
//! # Ok(())
//! # }
//! ```

pub mod csv;
pub mod equal;
pub mod markers;
pub mod planner;
pub mod types;

pub use csv::{parse_timings, plan_from_csv, TimingEntry};
pub use equal::equal_split;
pub use markers::MarkerNormalizer;
pub use planner::{DurationPlanner, TimingSource};
pub use types::{Marker, MarkerDocument, MarkerTimeline, RawMarker, TimingPlan};
