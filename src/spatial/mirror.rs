//! Mirror mapping: folds a planar trajectory back into a rectangle.
//!
//! Walking the samples in time order, whenever sample `i` lies beyond a wall
//! on some axis, that coordinate of sample `i` *and of every later sample* is
//! replaced by its mirror image `2 * wall - value`. Folds therefore compound:
//! later samples are tested after all earlier folds have been applied to
//! them. The result is exact billiard reflection only while the raw path
//! never crosses the whole rectangle within one sample interval; it is kept
//! as is rather than replaced by an exact reflection scheme.
//!
//! Only a single rectangle without interior obstacles is supported.

use crate::config::Rectangle;
use crate::error::SimulationResult;
use crate::spatial::geometry::reflect_across;
use crate::types::{Axis, ChaosState, ChaosTrajectory, PlanarTrajectory, Point2};
use log::{debug, trace};

/// A fold triggered by sample `index` crossing the wall at `bound`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoldEvent {
    pub index: usize,
    pub axis: Axis,
    pub bound: f64,
}

/// Folds applied so far on one axis. Replaying them in order on a raw
/// coordinate reproduces what a suffix rewrite would have left there.
///
/// Each fold is an affine map `v -> 2b - v`, so the history could be collapsed
/// into a single sign and offset. Doing so changes the rounding of the result,
/// and the walls are replayed one by one to stay bit-identical with the suffix
/// rewrite. The cost is linear in the number of folds per sample, and the
/// history grows with every fold.
#[derive(Debug, Clone, Default)]
struct FoldState {
    walls: Vec<f64>,
}

impl FoldState {
    fn apply(&self, raw: f64) -> f64 {
        self.walls
            .iter()
            .fold(raw, |value, &wall| reflect_across(value, wall))
    }

    fn push(&mut self, wall: f64) {
        self.walls.push(wall);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MirrorMap {
    domain: Rectangle,
}

impl MirrorMap {
    /// Fails with `InvalidDomain` for a degenerate or inverted rectangle.
    pub fn new(domain: Rectangle) -> SimulationResult<Self> {
        domain.validate()?;
        Ok(Self { domain })
    }

    pub fn domain(&self) -> &Rectangle {
        &self.domain
    }

    pub fn reflect(&self, trajectory: &PlanarTrajectory) -> PlanarTrajectory {
        self.reflect_with_events(trajectory).0
    }

    pub fn reflect_with_events(
        &self,
        trajectory: &PlanarTrajectory,
    ) -> (PlanarTrajectory, Vec<FoldEvent>) {
        let (points, events) = self.fold_points(trajectory.points());
        (PlanarTrajectory::new(points), events)
    }

    /// Folds the planar part of chaos states; phase angles pass through.
    pub fn reflect_states(&self, trajectory: &ChaosTrajectory) -> ChaosTrajectory {
        let positions: Vec<Point2> = trajectory.iter().map(ChaosState::position).collect();
        let (folded, _) = self.fold_points(&positions);
        ChaosTrajectory::new(
            trajectory
                .iter()
                .zip(folded)
                .map(|(state, [x, y])| ChaosState { x, y, ..*state })
                .collect(),
        )
    }

    fn fold_points(&self, raw: &[Point2]) -> (Vec<Point2>, Vec<FoldEvent>) {
        let mut states = [FoldState::default(), FoldState::default()];
        let mut events = Vec::new();
        let mut output = Vec::with_capacity(raw.len());

        for (index, point) in raw.iter().enumerate() {
            let mut folded = *point;
            for axis in Axis::ALL {
                let state = &mut states[axis.index()];
                let mut value = state.apply(axis.of(point));
                let upper = self.domain.upper(axis);
                let lower = self.domain.lower(axis);
                let wall = if value > upper {
                    Some(upper)
                } else if value < lower {
                    Some(lower)
                } else {
                    None
                };
                if let Some(bound) = wall {
                    trace!(
                        "fold at sample {index}: {} = {value} crosses {bound}",
                        axis.as_str()
                    );
                    state.push(bound);
                    value = reflect_across(value, bound);
                    events.push(FoldEvent { index, axis, bound });
                }
                axis.set(&mut folded, value);
            }
            output.push(folded);
        }

        if !events.is_empty() {
            debug!(
                "mirror mapping folded {} times over {} samples",
                events.len(),
                raw.len()
            );
        }
        (output, events)
    }
}

/// One-shot convenience over [`MirrorMap`].
pub fn mirror_map(
    trajectory: &PlanarTrajectory,
    domain: &Rectangle,
) -> SimulationResult<PlanarTrajectory> {
    Ok(MirrorMap::new(*domain)?.reflect(trajectory))
}
