//! Explicit per-slide timings from a small `index,seconds` table.
//!
//! ```text
//! # intro is short
//! index,seconds
//! 1,3
//! 2,
//! 4,12.5
//! ```
//!
//! Rows with an empty seconds cell, and slides without a row, share whatever
//! time the explicit rows leave over.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{PlanError, Result};
use crate::timing::types::ensure_total;

/// Specified totals may exceed the audio by this much before it is an overrun
const OVERRUN_TOLERANCE: f64 = 1e-9;

/// Shared durations are cut to the playlist's millisecond resolution
const SHARE_RESOLUTION: f64 = 1000.0;

/// One parsed row of a timings table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingEntry {
    /// 1-based position of the slide in display order
    pub slide: usize,

    /// Explicit duration, or `None` to share the leftover time
    pub seconds: Option<f64>,

    /// Source line, 1-based, for error messages
    pub line: usize,
}

/// Parse a timings table, validating every row against `slide_count`.
///
/// Blank lines and lines starting with `#` are skipped. The first data row
/// is treated as a header when its index cell is not a number.
pub fn parse_timings(text: &str, slide_count: usize) -> Result<Vec<TimingEntry>> {
    let mut entries = Vec::new();
    let mut seen = HashSet::new();
    let mut first_row = true;

    for (number, raw) in text.trim_start_matches('\u{feff}').lines().enumerate() {
        let line = number + 1;
        let row = raw.trim();
        if row.is_empty() || row.starts_with('#') {
            continue;
        }

        let mut cells = row.split(',').map(str::trim);
        let index_cell = cells.next().unwrap_or("");
        let seconds_cell = cells.next().unwrap_or("");

        let is_first = std::mem::replace(&mut first_row, false);

        let slide = match index_cell.parse::<i64>() {
            Ok(slide) => slide,
            Err(_) if is_first && index_cell.parse::<f64>().is_err() => {
                debug!("Skipping header row: {}", row);
                continue;
            }
            Err(_) => {
                return Err(PlanError::MalformedTimingRow {
                    line,
                    content: row.to_string(),
                }
                .into());
            }
        };

        if slide < 1 || slide as u64 > slide_count as u64 {
            return Err(PlanError::IndexOutOfRange {
                slide,
                max: slide_count,
                line,
            }
            .into());
        }

        if !seen.insert(slide) {
            return Err(PlanError::DuplicateTiming { slide, line }.into());
        }

        let seconds = if seconds_cell.is_empty() {
            None
        } else {
            match seconds_cell.parse::<f64>() {
                Ok(value) if value.is_finite() && value > 0.0 => Some(value),
                _ => {
                    return Err(PlanError::InvalidTimingValue {
                        slide,
                        value: seconds_cell.to_string(),
                        line,
                    }
                    .into());
                }
            }
        };

        entries.push(TimingEntry {
            slide: slide as usize,
            seconds,
            line,
        });
    }

    Ok(entries)
}

/// Turn parsed entries into one duration per slide summing to `total_seconds`
pub fn allocate(entries: &[TimingEntry], slide_count: usize, total_seconds: f64) -> Result<Vec<f64>> {
    if slide_count == 0 {
        return Err(PlanError::InvalidSlideCount { count: slide_count }.into());
    }
    ensure_total(total_seconds)?;

    let mut explicit: Vec<Option<f64>> = vec![None; slide_count];
    for entry in entries {
        if let Some(cell) = explicit.get_mut(entry.slide.wrapping_sub(1)) {
            *cell = entry.seconds;
        }
    }

    let specified: f64 = explicit.iter().flatten().sum();
    if specified > total_seconds + OVERRUN_TOLERANCE {
        return Err(PlanError::TimingOverrun {
            specified,
            total: total_seconds,
        }
        .into());
    }

    let remaining = total_seconds - specified;
    let unspecified = explicit.iter().filter(|d| d.is_none()).count();

    if unspecified == 0 {
        let mut durations: Vec<f64> = explicit.into_iter().flatten().collect();
        // Rounding slack goes to the last slide so the total stays exact
        if remaining != 0.0 {
            let last = slide_count - 1;
            durations[last] += remaining;
            if durations[last] <= 0.0 {
                return Err(PlanError::DegenerateDuration {
                    slide: slide_count,
                    duration: durations[last],
                }
                .into());
            }
        }
        return Ok(durations);
    }

    let exact_share = remaining / unspecified as f64;
    if exact_share <= 0.0 {
        return Err(PlanError::InsufficientRemainingTime {
            remaining,
            slides: unspecified,
        }
        .into());
    }

    // The last unspecified slide absorbs what the truncation drops
    let share = match (exact_share * SHARE_RESOLUTION + 1e-6).floor() / SHARE_RESOLUTION {
        truncated if truncated > 0.0 => truncated,
        _ => exact_share,
    };
    let last_unspecified = explicit.iter().rposition(Option::is_none).unwrap_or(slide_count - 1);
    let last_share = remaining - share * (unspecified - 1) as f64;

    let durations = explicit
        .into_iter()
        .enumerate()
        .map(|(position, explicit)| match explicit {
            Some(seconds) => seconds,
            None if position == last_unspecified => last_share,
            None => share,
        })
        .collect();

    Ok(durations)
}

/// Parse and allocate in one step
pub fn plan_from_csv(text: &str, slide_count: usize, total_seconds: f64) -> Result<Vec<f64>> {
    let entries = parse_timings(text, slide_count)?;
    debug!("Parsed {} timing rows for {} slides", entries.len(), slide_count);
    allocate(&entries, slide_count, total_seconds)
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::error::SlidecastError;
    use crate::render::render_concat;
    use crate::timing::TimingPlan;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{:?} vs {:?}", actual, expected);
        }
    }

    #[test]
    fn test_partial_timings_share_the_rest() {
        let durations = plan_from_csv("1,3\n", 4, 10.0).unwrap();

        assert_close(&durations, &[3.0, 2.333, 2.333, 2.334]);
        let sum: f64 = durations.iter().sum();
        assert!((sum - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_shared_time_survives_the_playlist() {
        let paths: Vec<PathBuf> = (1..=4).map(|i| PathBuf::from(format!("/w/slide-{}.png", i))).collect();
        let durations = plan_from_csv("1,3\n", 4, 10.0).unwrap();
        let plan = TimingPlan::new(paths, durations).unwrap();

        let playlist = render_concat(&plan, Path::new("/w"));
        let written: Vec<&str> = playlist
            .lines()
            .filter_map(|line| line.strip_prefix("duration "))
            .collect();
        assert_eq!(written, vec!["3.000", "2.333", "2.333", "2.334"]);

        let millis: i64 = written
            .iter()
            .map(|d| (d.parse::<f64>().unwrap() * 1000.0).round() as i64)
            .sum();
        assert_eq!(millis, 10_000);
    }

    #[test]
    fn test_tiny_remainder_is_not_truncated_away() {
        let durations = plan_from_csv("1,9.9995\n", 2, 10.0).unwrap();
        assert!(durations[1] > 0.0);
        let sum: f64 = durations.iter().sum();
        assert!((sum - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_comments_and_header_are_ignored() {
        let text = "# narration timings\nindex,seconds\n\n2,4\n# trailing note\n";
        let durations = plan_from_csv(text, 3, 10.0).unwrap();
        assert_close(&durations, &[3.0, 4.0, 3.0]);
    }

    #[test]
    fn test_byte_order_mark_header() {
        let durations = plan_from_csv("\u{feff}slide,secs\n1,2\n2,8\n", 2, 10.0).unwrap();
        assert_close(&durations, &[2.0, 8.0]);
    }

    #[test]
    fn test_empty_seconds_cell_is_unset() {
        let durations = plan_from_csv("1,\n2,6\n", 3, 10.0).unwrap();
        assert_close(&durations, &[2.0, 6.0, 2.0]);
    }

    #[test]
    fn test_out_of_range_index() {
        for text in ["5,2\n", "0,2\n", "-1,2\n"] {
            let result = plan_from_csv(text, 4, 10.0);
            assert!(
                matches!(result, Err(SlidecastError::Plan(PlanError::IndexOutOfRange { .. }))),
                "{:?}",
                result
            );
        }
    }

    #[test]
    fn test_duplicate_index() {
        let result = plan_from_csv("1,2\n2,2\n1,3\n", 4, 10.0);
        assert!(matches!(
            result,
            Err(SlidecastError::Plan(PlanError::DuplicateTiming { slide: 1, line: 3 }))
        ));
    }

    #[test]
    fn test_invalid_seconds() {
        for text in ["1,0\n", "1,-2\n", "1,abc\n", "1,inf\n", "1,NaN\n"] {
            let result = plan_from_csv(text, 4, 10.0);
            assert!(
                matches!(result, Err(SlidecastError::Plan(PlanError::InvalidTimingValue { .. }))),
                "{:?}",
                result
            );
        }
    }

    #[test]
    fn test_header_only_allowed_first() {
        let result = plan_from_csv("1,2\nslide,seconds\n", 4, 10.0);
        assert!(matches!(
            result,
            Err(SlidecastError::Plan(PlanError::MalformedTimingRow { line: 2, .. }))
        ));

        let result = plan_from_csv("1.5,2\n", 4, 10.0);
        assert!(matches!(
            result,
            Err(SlidecastError::Plan(PlanError::MalformedTimingRow { line: 1, .. }))
        ));
    }

    #[test]
    fn test_overrun() {
        let result = plan_from_csv("1,6\n2,6\n", 3, 10.0);
        assert!(matches!(
            result,
            Err(SlidecastError::Plan(PlanError::TimingOverrun { .. }))
        ));
    }

    #[test]
    fn test_nothing_left_for_unspecified() {
        let result = plan_from_csv("1,4\n2,6\n", 3, 10.0);
        assert!(matches!(
            result,
            Err(SlidecastError::Plan(PlanError::InsufficientRemainingTime { slides: 1, .. }))
        ));
    }

    #[test]
    fn test_fully_specified_slack_goes_to_last() {
        let durations = plan_from_csv("1,2\n2,3\n3,4\n", 3, 10.0).unwrap();
        assert_close(&durations, &[2.0, 3.0, 5.0]);

        let durations = plan_from_csv("1,5\n2,5\n", 2, 10.0).unwrap();
        assert_close(&durations, &[5.0, 5.0]);
    }

    #[test]
    fn test_no_rows_is_equal_split() {
        let durations = plan_from_csv("# nothing yet\n", 4, 10.0).unwrap();
        assert_close(&durations, &[2.5, 2.5, 2.5, 2.5]);
    }
}
