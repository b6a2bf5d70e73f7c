use crate::error::{PlanError, Result};
use crate::timing::types::ensure_total;

/// Split `total_seconds` into `count` equal shares.
///
/// The last share absorbs the floating-point remainder so the durations sum
/// to `total_seconds` exactly instead of drifting across many slivers.
pub fn equal_split(total_seconds: f64, count: usize) -> Result<Vec<f64>> {
    if count == 0 {
        return Err(PlanError::InvalidSlideCount { count }.into());
    }
    ensure_total(total_seconds)?;

    let base = total_seconds / count as f64;
    if base <= 0.0 {
        return Err(PlanError::DegenerateDuration { slide: 1, duration: base }.into());
    }

    let mut durations = vec![base; count];
    let last = total_seconds - base * (count - 1) as f64;
    if last <= 0.0 {
        return Err(PlanError::DegenerateDuration { slide: count, duration: last }.into());
    }
    durations[count - 1] = last;

    Ok(durations)
}
