use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{PlanError, Result};
use crate::slides::SlideSet;

/// Reject audio durations the planners cannot partition
pub fn ensure_total(total_seconds: f64) -> Result<()> {
    if !total_seconds.is_finite() || total_seconds <= 0.0 {
        return Err(PlanError::InvalidAudioDuration { seconds: total_seconds }.into());
    }
    Ok(())
}

/// Ordered image paths with the time each one stays on screen
///
/// Invariant: both vectors have the same non-zero length and every duration
/// is finite and strictly positive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingPlan {
    sequence: Vec<PathBuf>,
    durations: Vec<f64>,
}

impl TimingPlan {
    pub fn new(sequence: Vec<PathBuf>, durations: Vec<f64>) -> Result<Self> {
        if sequence.is_empty() || sequence.len() != durations.len() {
            return Err(PlanError::EmptyPlan.into());
        }

        if let Some((position, &duration)) = durations
            .iter()
            .enumerate()
            .find(|(_, d)| !d.is_finite() || **d <= 0.0)
        {
            return Err(PlanError::NonPositiveDuration {
                position: position + 1,
                duration,
            }
            .into());
        }

        Ok(Self { sequence, durations })
    }

    pub fn sequence(&self) -> &[PathBuf] {
        &self.sequence
    }

    pub fn durations(&self) -> &[f64] {
        &self.durations
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// `(image, seconds)` pairs in display order
    pub fn entries(&self) -> impl Iterator<Item = (&Path, f64)> {
        self.sequence
            .iter()
            .map(PathBuf::as_path)
            .zip(self.durations.iter().copied())
    }

    /// Start time of every entry
    pub fn start_times(&self) -> Vec<f64> {
        self.durations
            .iter()
            .scan(0.0, |elapsed, &duration| {
                let start = *elapsed;
                *elapsed += duration;
                Some(start)
            })
            .collect()
    }

    pub fn total_duration(&self) -> f64 {
        self.durations.iter().sum()
    }
}

/// A marker as received from a user, an imported file or an AI reply.
///
/// Fields stay untyped until the normalizer coerces them; numbers and numeric
/// strings are accepted, anything else is dropped.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawMarker {
    #[serde(default)]
    pub t: Value,

    #[serde(default)]
    pub slide: Value,
}

impl RawMarker {
    pub fn new(t: f64, slide: f64) -> Self {
        Self {
            t: Value::from(t),
            slide: Value::from(slide),
        }
    }

    /// Pick `t` and `slide` out of an arbitrary JSON value. Missing fields and
    /// non-object entries come through as nulls for the normalizer to drop.
    pub fn from_value(entry: &Value) -> Self {
        let field = |name: &str| entry.get(name).cloned().unwrap_or(Value::Null);
        Self {
            t: field("t"),
            slide: field("slide"),
        }
    }

    /// Coerce both fields to finite numbers
    pub fn coerce(&self) -> Option<(f64, f64)> {
        Some((coerce_number(&self.t)?, coerce_number(&self.slide)?))
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

/// `{ "markers": [{ "t": 0, "slide": 1 }, ...] }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkerDocument {
    #[serde(deserialize_with = "lenient_markers")]
    pub markers: Vec<RawMarker>,
}

fn lenient_markers<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<RawMarker>, D::Error> {
    let entries = Vec::<Value>::deserialize(deserializer)?;
    Ok(entries.iter().map(RawMarker::from_value).collect())
}

impl MarkerDocument {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text.trim_start_matches('\u{feff}')).map_err(|e| {
            PlanError::InvalidMarkerDocument {
                reason: e.to_string(),
            }
            .into()
        })
    }
}

/// A coerced marker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    /// Offset into the audio in seconds
    pub t: f64,

    /// Page number the marker switches to
    pub slide: u32,

    /// Position in the input, used to keep simultaneous markers stable
    pub order: usize,
}

/// Repaired marker times with their slide assignments
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerTimeline {
    /// Start times in seconds, strictly increasing, first one zero
    pub times: Vec<f64>,

    /// Which page to show from each start time (aligned with `times`)
    pub slides: Vec<u32>,
}

impl MarkerTimeline {
    pub fn from_markers(markers: &[Marker]) -> Self {
        Self {
            times: markers.iter().map(|m| m.t).collect(),
            slides: markers.iter().map(|m| m.slide).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Length of the interval starting at `index`
    pub fn segment_duration(&self, index: usize, total_duration: f64) -> f64 {
        let Some(&start) = self.times.get(index) else {
            return 0.0;
        };
        let end = self.times.get(index + 1).copied().unwrap_or(total_duration);
        end - start
    }

    /// Map slides to images and intervals to durations
    pub fn resolve(&self, slides: &SlideSet, total_duration: f64) -> Result<TimingPlan> {
        let sequence = self
            .slides
            .iter()
            .map(|&slide| {
                slides
                    .path_for(slide)
                    .map(Path::to_path_buf)
                    .ok_or(PlanError::UnknownSlideReference { slide })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut durations = Vec::with_capacity(self.len());
        for index in 0..self.len() {
            let duration = self.segment_duration(index, total_duration);
            if !duration.is_finite() || duration <= 0.0 {
                return Err(PlanError::NonPositiveDuration {
                    position: index + 1,
                    duration,
                }
                .into());
            }
            durations.push(duration);
        }

        TimingPlan::new(sequence, durations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SlidecastError;
    use crate::slides::Slide;
    use crate::timing::MarkerNormalizer;

    fn slides(count: u32) -> SlideSet {
        (1..=count)
            .map(|i| Slide::new(i, format!("/w/slide-{}.png", i)))
            .collect()
    }

    #[test]
    fn test_plan_rejects_bad_durations() {
        let result = TimingPlan::new(vec!["/a.png".into(), "/b.png".into()], vec![1.0, 0.0]);
        assert!(matches!(
            result,
            Err(SlidecastError::Plan(PlanError::NonPositiveDuration { position: 2, .. }))
        ));

        let result = TimingPlan::new(vec!["/a.png".into()], vec![1.0, 2.0]);
        assert!(matches!(result, Err(SlidecastError::Plan(PlanError::EmptyPlan))));
    }

    #[test]
    fn test_plan_start_times() {
        let plan = TimingPlan::new(
            vec!["/a.png".into(), "/b.png".into(), "/c.png".into()],
            vec![1.5, 2.0, 0.5],
        )
        .unwrap();

        assert_eq!(plan.start_times(), vec![0.0, 1.5, 3.5]);
        assert_eq!(plan.total_duration(), 4.0);
    }

    #[test]
    fn test_raw_marker_coercion() {
        let doc = MarkerDocument::from_json(
            r#"{"markers": [
                {"t": 0, "slide": 1},
                {"t": "12.5", "slide": "2"},
                {"t": null, "slide": 3},
                {"t": "soon", "slide": 4},
                {"slide": 5}
            ]}"#,
        )
        .unwrap();

        let coerced: Vec<Option<(f64, f64)>> = doc.markers.iter().map(RawMarker::coerce).collect();
        assert_eq!(coerced[0], Some((0.0, 1.0)));
        assert_eq!(coerced[1], Some((12.5, 2.0)));
        assert_eq!(coerced[2], None);
        assert_eq!(coerced[3], None);
        assert_eq!(coerced[4], None);

        assert_eq!(RawMarker::new(f64::NAN, 1.0).coerce(), None);
    }

    #[test]
    fn test_junk_entries_are_kept_for_the_normalizer() {
        let doc = MarkerDocument::from_json(
            r#"{"markers":[{"t":0,"slide":1},null,"oops",{"t":5,"slide":2}]}"#,
        )
        .unwrap();

        assert_eq!(doc.markers.len(), 4);
        assert_eq!(doc.markers[1], RawMarker::default());
        assert_eq!(doc.markers[2], RawMarker::default());
        assert_eq!(doc.markers[3], RawMarker::new(5.0, 2.0));

        let plan = MarkerNormalizer::default()
            .normalize(&doc.markers, &slides(2), 10.0)
            .unwrap();
        assert_eq!(plan.durations(), &[5.0, 5.0]);
    }

    #[test]
    fn test_invalid_document() {
        let result = MarkerDocument::from_json(r#"{"markers": 3}"#);
        assert!(matches!(
            result,
            Err(SlidecastError::Plan(PlanError::InvalidMarkerDocument { .. }))
        ));
    }

    #[test]
    fn test_timeline_resolve() {
        let timeline = MarkerTimeline {
            times: vec![0.0, 4.0, 6.0],
            slides: vec![1, 3, 2],
        };

        let plan = timeline.resolve(&slides(3), 10.0).unwrap();
        assert_eq!(plan.durations(), &[4.0, 2.0, 4.0]);
        assert_eq!(plan.sequence()[1], PathBuf::from("/w/slide-3.png"));
    }

    #[test]
    fn test_timeline_unknown_slide() {
        let timeline = MarkerTimeline {
            times: vec![0.0, 4.0],
            slides: vec![1, 9],
        };

        let result = timeline.resolve(&slides(3), 10.0);
        assert!(matches!(
            result,
            Err(SlidecastError::Plan(PlanError::UnknownSlideReference { slide: 9 }))
        ));
    }

    #[test]
    fn test_timeline_overlapping_times() {
        let timeline = MarkerTimeline {
            times: vec![0.0, 5.0, 5.0],
            slides: vec![1, 2, 3],
        };

        let result = timeline.resolve(&slides(3), 10.0);
        assert!(matches!(
            result,
            Err(SlidecastError::Plan(PlanError::NonPositiveDuration { position: 2, .. }))
        ));
    }
}
