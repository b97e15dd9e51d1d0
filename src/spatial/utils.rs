//! Shared mathematical utilities for the spatial module.

use std::f64::consts::{PI, TAU};

pub(crate) fn vector_norm(vec: &[f64]) -> f64 {
    vec.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Displacement of length `length` along `heading` (radians from +x).
pub(crate) fn heading_step(heading: f64, length: f64) -> [f64; 2] {
    let (sin_a, cos_a) = heading.sin_cos();
    [length * cos_a, length * sin_a]
}

/// Wraps an unwrapped angle into `(-PI, PI]`.
pub fn wrap_angle(angle: f64) -> f64 {
    let mut result = angle % TAU;
    if result <= -PI {
        result += TAU;
    } else if result > PI {
        result -= TAU;
    }
    result
}
