//! The Arnold-type chaotic flow driving the planar drift.

use crate::config::ChaosCoefficients;
use crate::types::ChaosState;

/// Right-hand side of an ODE system with `N` state variables.
pub trait VectorField<const N: usize> {
    fn eval(&self, t: f64, state: &[f64; N]) -> [f64; N];
}

/// Three coupled phase angles `x1, x2, x3`; `x3` doubles as the heading of a
/// constant-speed drift in the plane.
///
/// ```text
/// dx1 = A sin(x3) + C cos(x2)
/// dx2 = B sin(x1) + A cos(x3)
/// dx3 = C sin(x2) + B cos(x1)
/// dx  = v cos(x3)
/// dy  = v sin(x3)
/// ```
///
/// The flow is autonomous and position never feeds back into the phases.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArnoldField {
    coefficients: ChaosCoefficients,
}

impl ArnoldField {
    pub fn new(coefficients: ChaosCoefficients) -> Self {
        Self { coefficients }
    }

    pub fn coefficients(&self) -> &ChaosCoefficients {
        &self.coefficients
    }

    pub fn derivative(&self, state: &ChaosState) -> ChaosState {
        let ChaosCoefficients { a, b, c, v } = self.coefficients;
        let (sin_x1, cos_x1) = state.x1.sin_cos();
        let (sin_x2, cos_x2) = state.x2.sin_cos();
        let (sin_x3, cos_x3) = state.x3.sin_cos();
        ChaosState {
            x1: a * sin_x3 + c * cos_x2,
            x2: b * sin_x1 + a * cos_x3,
            x3: c * sin_x2 + b * cos_x1,
            x: v * cos_x3,
            y: v * sin_x3,
        }
    }

    /// `A cos(x3) + B sin(x1)`. Constant along trajectories when `C = 0`, in
    /// which case it is also the rate of `x2`.
    pub fn phase_invariant(&self, state: &ChaosState) -> f64 {
        self.coefficients.a * state.x3.cos() + self.coefficients.b * state.x1.sin()
    }
}

impl VectorField<5> for ArnoldField {
    fn eval(&self, _t: f64, state: &[f64; 5]) -> [f64; 5] {
        self.derivative(&ChaosState::from(*state)).to_array()
    }
}
