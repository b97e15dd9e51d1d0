//! Chaotic drift versus random walk inside a rectangle.
//!
//! An Arnold-type flow steers a constant-speed drift through its third phase
//! angle; a memoryless walker takes fixed-length steps in uniformly random
//! directions. Both paths are folded back into the rectangle by the
//! cumulative mirror mapping in [`spatial::mirror`] and handed to a
//! [`comparison::TrajectoryComparator`].

pub mod comparison;
pub mod config;
pub mod dynamics;
pub mod error;
pub mod spatial;
pub mod types;

#[cfg(feature = "python")]
pub mod python;

pub use comparison::{
    ComparisonPair, ComparisonSummary, Simulation, SummaryComparator, TrajectoryComparator,
    TrajectorySummary,
};
pub use config::{
    load_config, ChaosCoefficients, PhaseAngles, Rectangle, SimulationParams, StartPosition,
    TimeGrid, WalkOptions,
};
pub use dynamics::{integrate_chaos, ArnoldField, DormandPrince, SolverOptions, VectorField};
pub use error::{ConfigError, SimulationError, SimulationResult};
pub use spatial::{mirror_map, FoldEvent, MirrorMap, RandomWalk};
pub use types::{Axis, ChaosState, ChaosTrajectory, PlanarTrajectory, Point2, Trajectory};

#[cfg(feature = "python")]
use pyo3::prelude::*;

#[cfg(feature = "python")]
#[pymodule]
fn _arnold_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    python::register_classes(m)
}
