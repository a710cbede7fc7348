//! Angle arithmetic on the circle, in degrees.

use crate::error::{AlignmentError, AlignmentResult};

pub const FULL_TURN_DEG: f64 = 360.0;

/// Reduce any real angle to [0, 360).
pub fn normalize_degrees(x: f64) -> f64 {
    let r = x.rem_euclid(FULL_TURN_DEG);
    // rem_euclid rounds tiny negative inputs up to exactly 360.0
    if r >= FULL_TURN_DEG {
        0.0
    } else {
        r
    }
}

/// Width of the smallest arc containing every angle.
///
/// The largest gap between neighbouring points (including the wrap from the
/// last point back to the first) is the empty arc; the spread is its
/// complement. One angle gives 0; the result never exceeds 360 - 360/N and,
/// for the two-point case, never exceeds 180.
pub fn circular_min_spread(angles: &[f64]) -> AlignmentResult<f64> {
    if angles.is_empty() {
        return Err(AlignmentError::domain(
            "circular spread of an empty angle set is undefined",
        ));
    }
    if let Some(bad) = angles.iter().find(|a| !a.is_finite()) {
        return Err(AlignmentError::domain(format!(
            "non-finite angle in spread input: {}",
            bad
        )));
    }
    if angles.len() == 1 {
        return Ok(0.0);
    }

    let mut sorted: Vec<f64> = angles.iter().map(|a| normalize_degrees(*a)).collect();
    sorted.sort_by(f64::total_cmp);

    let wrap_gap = sorted[0] + FULL_TURN_DEG - sorted[sorted.len() - 1];
    let largest_gap = sorted
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold(wrap_gap, f64::max);

    Ok((FULL_TURN_DEG - largest_gap).max(0.0))
}

/// Signed difference `a - b` wrapped to (-180, 180].
pub fn signed_separation(a: f64, b: f64) -> f64 {
    let d = normalize_degrees(a - b);
    if d > 180.0 {
        d - FULL_TURN_DEG
    } else {
        d
    }
}
