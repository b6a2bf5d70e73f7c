//! # AI Integration Glue
//!
//! Model-agnostic helpers for working with AI services around a render:
//!
//! - [`extract_markers`] turns a free-form reply into raw markers for the
//!   [`MarkerNormalizer`](crate::timing::MarkerNormalizer)
//! - [`SummaryCache`] keeps per-slide summaries per uploaded document
//! - [`summarize_deck`] fans slides out to a [`SlideSummarizer`] with bounded
//!   concurrency, timeouts and retries
//!
//! No HTTP client lives here; callers plug one in by implementing
//! [`SlideSummarizer`].
//!
//! ```rust
//! use slidecast::assist::extract_markers;
//! use slidecast::slides::{Slide, SlideSet};
//! use slidecast::timing::MarkerNormalizer;
//!
//! # fn main() -> slidecast::Result<()> {
//! let reply = "```json\n{\"markers\": [{\"t\": 0, \"slide\": 1}, {\"t\": 12, \"slide\": 7}]}\n```";
//! let raw = extract_markers(reply)?;
//!
//! let slides: SlideSet = (1..=3)
//!     .map(|i| Slide::new(i, format!("/tmp/slide-{}.png", i)))
//!     .collect();
//! let plan = MarkerNormalizer::default().normalize(&raw, &slides, 30.0)?;
//! assert_eq!(plan.durations(), &[12.0, 18.0]);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod payload;
pub mod pool;

pub use cache::{ContentKey, SlideSummary, SummaryCache};
pub use payload::extract_markers;
pub use pool::{summarize_deck, with_retry, DeckSummarizer, RetryPolicy, SlideSummarizer};
