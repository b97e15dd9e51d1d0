//! Geometry helpers for the rectangular domain.

use crate::types::Point2;

pub(crate) fn bounding_box(points: &[Point2]) -> (f64, f64, f64, f64) {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for p in points {
        min_x = min_x.min(p[0]);
        max_x = max_x.max(p[0]);
        min_y = min_y.min(p[1]);
        max_y = max_y.max(p[1]);
    }
    (min_x, max_x, min_y, max_y)
}

/// Mirror image of `value` across the wall at `bound`.
#[inline]
pub(crate) fn reflect_across(value: f64, bound: f64) -> f64 {
    2.0 * bound - value
}

#[inline]
pub(crate) fn within(value: f64, lower: f64, upper: f64) -> bool {
    value >= lower && value <= upper
}
