//! Planar motion inside a rectangular domain: the random walk generator and
//! the mirror mapping that folds any planar trajectory back into the box.

pub(crate) mod geometry;
pub mod mirror;
pub(crate) mod utils;
pub mod walk;

pub use mirror::{mirror_map, FoldEvent, MirrorMap};
pub use utils::wrap_angle;
pub use walk::RandomWalk;
