//! Deterministic chaos: the Arnold flow and its time integration.

pub mod field;
pub mod integrator;

pub use field::{ArnoldField, VectorField};
pub use integrator::{
    integrate_chaos, integrate_params, DormandPrince, IntegrationOutcome, IntegrationStats,
    SolverFailure, SolverOptions,
};
