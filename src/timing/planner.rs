use std::path::Path;

use tracing::{debug, info};

use crate::config::TimingConfig;
use crate::error::{PlanError, Result};
use crate::slides::SlideSet;
use crate::timing::csv::plan_from_csv;
use crate::timing::equal::equal_split;
use crate::timing::markers::MarkerNormalizer;
use crate::timing::types::{MarkerDocument, RawMarker, TimingPlan};

/// Where slide timings come from
#[derive(Debug, Clone, Default)]
pub enum TimingSource {
    /// Every slide gets the same share of the audio
    #[default]
    Equal,

    /// An `index,seconds` table
    Csv(String),

    /// Start markers from the editor, an imported file or an AI suggestion
    Markers(Vec<RawMarker>),
}

impl TimingSource {
    /// Read a timings table from disk
    pub fn from_csv_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::Csv(std::fs::read_to_string(path)?))
    }

    /// Read a `{ "markers": [...] }` document from disk
    pub fn from_markers_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::Markers(MarkerDocument::from_json(&text)?.markers))
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::Equal => "equal split",
            Self::Csv(_) => "timings table",
            Self::Markers(_) => "markers",
        }
    }
}

/// Computes a timing plan for a set of slides and an audio duration
#[derive(Debug, Clone, Default)]
pub struct DurationPlanner {
    normalizer: MarkerNormalizer,
}

impl DurationPlanner {
    pub fn new(config: TimingConfig) -> Self {
        Self {
            normalizer: MarkerNormalizer::new(config),
        }
    }

    pub fn plan(
        &self,
        source: &TimingSource,
        slides: &SlideSet,
        total_seconds: f64,
    ) -> Result<TimingPlan> {
        if slides.is_empty() {
            return Err(PlanError::InvalidSlideCount { count: 0 }.into());
        }

        info!(
            "Planning {} slides over {:.3}s using {}",
            slides.len(),
            total_seconds,
            source.describe()
        );

        let plan = match source {
            TimingSource::Markers(raw) if !raw.is_empty() => {
                self.normalizer.normalize(raw, slides, total_seconds)?
            }
            TimingSource::Markers(_) => {
                info!("No markers given; falling back to an equal split");
                TimingPlan::new(slides.paths(), equal_split(total_seconds, slides.len())?)?
            }
            TimingSource::Equal => {
                TimingPlan::new(slides.paths(), equal_split(total_seconds, slides.len())?)?
            }
            TimingSource::Csv(text) => {
                TimingPlan::new(slides.paths(), plan_from_csv(text, slides.len(), total_seconds)?)?
            }
        };

        for ((path, duration), start) in plan.entries().zip(plan.start_times()) {
            debug!("  {:>9.3}s +{:.3}s {}", start, duration, path.display());
        }

        Ok(plan)
    }
}
