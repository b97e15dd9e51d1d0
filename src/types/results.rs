use crate::spatial::geometry::bounding_box;
use crate::spatial::utils::vector_norm;
use crate::types::primitives::{Axis, ChaosState, Point2};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Time-ordered samples produced by a generator. Index `i` is the `i`-th
/// point of the time grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trajectory<P> {
    points: Vec<P>,
}

pub type ChaosTrajectory = Trajectory<ChaosState>;
pub type PlanarTrajectory = Trajectory<Point2>;

impl<P> Trajectory<P> {
    pub fn new(points: Vec<P>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[P] {
        &self.points
    }

    pub fn into_points(self) -> Vec<P> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&P> {
        self.points.get(index)
    }

    pub fn first(&self) -> Option<&P> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&P> {
        self.points.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, P> {
        self.points.iter()
    }
}

impl<P> From<Vec<P>> for Trajectory<P> {
    fn from(points: Vec<P>) -> Self {
        Self::new(points)
    }
}

impl<'a, P> IntoIterator for &'a Trajectory<P> {
    type Item = &'a P;
    type IntoIter = std::slice::Iter<'a, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl Trajectory<ChaosState> {
    /// Projects the trailing `(x, y)` components onto a planar trajectory.
    pub fn positions(&self) -> PlanarTrajectory {
        Trajectory::new(self.points.iter().map(ChaosState::position).collect())
    }

    pub fn is_finite(&self) -> bool {
        self.points.iter().all(ChaosState::is_finite)
    }
}

impl Trajectory<Point2> {
    pub fn axis_values(&self, axis: Axis) -> Vec<f64> {
        self.points.iter().map(|p| axis.of(p)).collect()
    }

    pub fn is_finite(&self) -> bool {
        self.points.iter().all(|p| p[0].is_finite() && p[1].is_finite())
    }

    /// Sum of Euclidean distances between consecutive samples.
    pub fn path_length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| vector_norm(&[w[1][0] - w[0][0], w[1][1] - w[0][1]]))
            .sum()
    }

    /// `(min_x, max_x, min_y, max_y)`; infinite extents for an empty trajectory.
    pub fn extent(&self) -> (f64, f64, f64, f64) {
        bounding_box(&self.points)
    }

    /// Row-per-sample `(n, 2)` array, the layout plotting layers consume.
    pub fn to_array(&self) -> Array2<f64> {
        let mut array = Array2::<f64>::zeros((self.points.len(), 2));
        for (row_idx, row) in self.points.iter().enumerate() {
            for axis in Axis::ALL {
                array[(row_idx, axis.index())] = axis.of(row);
            }
        }
        array
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn planar_array_has_one_row_per_sample() {
        let traj = PlanarTrajectory::new(vec![[0.0, 1.0], [2.0, 3.0], [4.0, 5.0]]);
        let array = traj.to_array();
        assert_eq!(array.shape(), &[3, 2]);
        assert_eq!(array[(1, 0)], 2.0);
        assert_eq!(array[(2, 1)], 5.0);
        assert_eq!(traj.axis_values(Axis::Y), vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn path_length_and_extent() {
        let traj = PlanarTrajectory::new(vec![[0.0, 0.0], [3.0, 4.0], [3.0, 0.0]]);
        assert_relative_eq!(traj.path_length(), 9.0, epsilon = 1e-12);
        assert_eq!(traj.extent(), (0.0, 3.0, 0.0, 4.0));
    }

    #[test]
    fn chaos_positions_keep_order() {
        let traj = ChaosTrajectory::new(vec![
            ChaosState::new(0.0, 0.0, 0.0, 1.0, 2.0),
            ChaosState::new(0.0, 0.0, 0.0, 3.0, 4.0),
        ]);
        assert_eq!(traj.positions().points(), &[[1.0, 2.0], [3.0, 4.0]]);
    }
}
