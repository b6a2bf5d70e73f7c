//! Repair of untrusted `(time, slide)` markers.
//!
//! Markers come from manual entry, imported files and AI suggestions, and any
//! of them may be unsorted, duplicated, out of range or crammed together. The
//! normalizer never rejects input that is merely messy: it drops entries it
//! cannot read, clamps the rest into range, orders them, forces a start at
//! zero and spreads them out until every interval has positive width. Only a
//! structurally impossible result is reported as an error.

use tracing::{debug, info, warn};

use crate::config::TimingConfig;
use crate::error::{PlanError, Result};
use crate::slides::SlideSet;
use crate::timing::types::{ensure_total, Marker, MarkerTimeline, RawMarker, TimingPlan};

/// Turns raw markers into a gap-free, strictly increasing timeline
#[derive(Debug, Clone, Default)]
pub struct MarkerNormalizer {
    config: TimingConfig,
}

impl MarkerNormalizer {
    pub fn new(config: TimingConfig) -> Self {
        Self { config }
    }

    /// Repair `raw` and resolve it against `slides` into a timing plan
    pub fn normalize(
        &self,
        raw: &[RawMarker],
        slides: &SlideSet,
        total_seconds: f64,
    ) -> Result<TimingPlan> {
        let (Some(first), Some(last)) = (slides.first_index(), slides.last_index()) else {
            return Err(PlanError::InvalidSlideCount { count: 0 }.into());
        };

        let timeline = self.repair(raw, first..=last, total_seconds)?;
        let plan = timeline.resolve(slides, total_seconds)?;

        info!(
            "Marker plan: {} intervals over {:.3}s ({} raw markers)",
            plan.len(),
            total_seconds,
            raw.len()
        );
        Ok(plan)
    }

    /// Repair `raw` into a timeline whose slides lie within `slide_range`
    pub fn repair(
        &self,
        raw: &[RawMarker],
        slide_range: std::ops::RangeInclusive<u32>,
        total_seconds: f64,
    ) -> Result<MarkerTimeline> {
        ensure_total(total_seconds)?;

        let mut markers = self.coerce_and_clamp(raw, &slide_range, total_seconds)?;

        markers.sort_by(|a, b| a.t.total_cmp(&b.t).then(a.order.cmp(&b.order)));

        self.anchor_at_zero(&mut markers, *slide_range.start());

        let mut timeline = MarkerTimeline::from_markers(&markers);
        let min_gap = self.min_gap(total_seconds, timeline.len());

        let pushed = enforce_increasing(&mut timeline.times, min_gap);
        if pushed > 0 {
            warn!("Pushed {} marker(s) forward to keep a {:.3}s gap", pushed, min_gap);
        }

        let ceiling = total_seconds - self.config.epsilon;
        if timeline.times.last().is_some_and(|&t| t > ceiling) {
            warn!("Markers overrun the audio ({:.3}s); pulling them back", total_seconds);

            if !pull_back(&mut timeline.times, total_seconds, min_gap) {
                warn!(
                    "{} markers do not fit into {:.3}s; spacing them evenly",
                    timeline.len(),
                    total_seconds
                );
                spread_evenly(&mut timeline.times, total_seconds);
            }
        }

        debug!("Repaired marker times: {:?}", timeline.times);
        Ok(timeline)
    }

    /// Minimum spacing between consecutive repaired markers
    pub fn min_gap(&self, total_seconds: f64, marker_count: usize) -> f64 {
        (total_seconds / (2.0 * marker_count.max(1) as f64)).max(self.config.min_gap_floor)
    }

    fn coerce_and_clamp(
        &self,
        raw: &[RawMarker],
        slide_range: &std::ops::RangeInclusive<u32>,
        total_seconds: f64,
    ) -> Result<Vec<Marker>> {
        let lowest = *slide_range.start() as f64;
        let highest = *slide_range.end() as f64;
        let latest = (total_seconds - self.config.epsilon).max(0.0);

        let mut markers = Vec::with_capacity(raw.len() + 1);
        let mut dropped = 0;
        let mut clamped = 0;

        for (position, entry) in raw.iter().enumerate() {
            let Some((t, slide)) = entry.coerce() else {
                debug!("Dropping unreadable marker #{}: {:?}", position + 1, entry);
                dropped += 1;
                continue;
            };

            let slide_clamped = slide.round().clamp(lowest, highest);
            let t_clamped = t.clamp(0.0, latest);
            if slide_clamped != slide.round() || t_clamped != t {
                debug!(
                    "Clamped marker #{} from ({}, {}) to ({}, {})",
                    position + 1,
                    t,
                    slide,
                    t_clamped,
                    slide_clamped
                );
                clamped += 1;
            }

            markers.push(Marker {
                t: t_clamped,
                slide: slide_clamped as u32,
                order: position + 1,
            });
        }

        if dropped > 0 {
            warn!("Dropped {} marker(s) without a numeric time and slide", dropped);
        }
        if clamped > 0 {
            warn!("Clamped {} marker(s) into the slide and time range", clamped);
        }

        if markers.is_empty() {
            return Err(PlanError::NoUsableMarkers { dropped }.into());
        }

        Ok(markers)
    }

    /// Make the first marker start at exactly zero, synthesizing one for the
    /// first slide when the earliest marker is clearly later than zero
    fn anchor_at_zero(&self, markers: &mut Vec<Marker>, first_slide: u32) {
        let near_zero = markers
            .first()
            .is_some_and(|first| first.t <= self.config.zero_snap_tolerance);

        if near_zero {
            markers[0].t = 0.0;
        } else {
            warn!("No marker at 0s; showing slide {} from the start", first_slide);
            markers.insert(
                0,
                Marker {
                    t: 0.0,
                    slide: first_slide,
                    order: 0,
                },
            );
        }
    }
}

/// Push each time forward to at least `min_gap` after its predecessor.
/// Returns how many times moved.
fn enforce_increasing(times: &mut [f64], min_gap: f64) -> usize {
    let mut pushed = 0;
    for i in 1..times.len() {
        if times[i] <= times[i - 1] {
            times[i] = times[i - 1] + min_gap;
            pushed += 1;
        }
    }
    pushed
}

/// Walk back from the end keeping every time at least `min_gap` before its
/// successor (the end of the audio for the last one). Returns `false` when
/// the first time would have to go below zero.
fn pull_back(times: &mut [f64], total_seconds: f64, min_gap: f64) -> bool {
    let mut limit = total_seconds;
    for t in times.iter_mut().rev() {
        if *t > limit - min_gap {
            *t = limit - min_gap;
        }
        limit = *t;
    }
    times.first().map_or(true, |&first| first >= 0.0)
}

fn spread_evenly(times: &mut [f64], total_seconds: f64) {
    let count = times.len() as f64;
    for (i, t) in times.iter_mut().enumerate() {
        *t = total_seconds * i as f64 / count;
    }
}
