// Type definition modules
pub mod primitives;
pub mod results;

// Re-export public types
pub use primitives::{Axis, ChaosState, Point2};
pub use results::{ChaosTrajectory, PlanarTrajectory, Trajectory};
