//! Fixed-step random walk with uniformly distributed headings.

use crate::config::SimulationParams;
use crate::error::{SimulationError, SimulationResult};
use crate::spatial::utils::heading_step;
use crate::types::{PlanarTrajectory, Point2};
use log::debug;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{thread_rng, Rng, SeedableRng};
use std::f64::consts::TAU;

/// Memoryless walker: every step has length `speed * dt` and a fresh heading
/// drawn from `[0, 2π)`, independent of all earlier headings.
#[derive(Debug, Clone)]
pub struct RandomWalk<R: Rng> {
    rng: R,
    start: Point2,
    step_length: f64,
    samples: usize,
    headings: Uniform<f64>,
}

impl RandomWalk<StdRng> {
    pub fn seeded(start: Point2, speed: f64, dt: f64, samples: usize, seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), start, speed, dt, samples)
    }

    /// Walker for a full parameter set; uses the configured seed when present.
    pub fn from_params(params: &SimulationParams) -> SimulationResult<Self> {
        params.validate()?;
        let rng = match params.walk.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(thread_rng()).map_err(seed_error)?,
        };
        Ok(Self::with_rng(
            rng,
            params.start.point(),
            params.chaos.v,
            params.time.spacing(),
            params.walk_steps(),
        ))
    }
}

fn seed_error(err: rand::Error) -> SimulationError {
    SimulationError::Seed {
        reason: err.to_string(),
    }
}

impl<R: Rng> RandomWalk<R> {
    pub fn with_rng(rng: R, start: Point2, speed: f64, dt: f64, samples: usize) -> Self {
        Self {
            rng,
            start,
            step_length: speed * dt,
            samples,
            headings: Uniform::new(0.0, TAU),
        }
    }

    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    pub fn step_length(&self) -> f64 {
        self.step_length
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Draws a new trajectory. Point 0 is always the start position; repeated
    /// calls continue consuming the same random stream.
    pub fn generate(&mut self) -> PlanarTrajectory {
        let mut points = Vec::with_capacity(self.samples);
        if self.samples == 0 {
            return PlanarTrajectory::new(points);
        }
        let mut current = self.start;
        points.push(current);
        for _ in 1..self.samples {
            let heading = self.headings.sample(&mut self.rng);
            let [dx, dy] = heading_step(heading, self.step_length);
            current = [current[0] + dx, current[1] + dy];
            points.push(current);
        }
        debug!(
            "random walk: {} samples, step length {}",
            points.len(),
            self.step_length
        );
        PlanarTrajectory::new(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{TimeGrid, WalkOptions};
    use crate::spatial::utils::vector_norm;
    use approx::assert_relative_eq;

    #[test]
    fn every_step_has_length_speed_times_spacing() {
        let grid = TimeGrid::new(0.0, 10.0, 41).unwrap();
        let mut walk = RandomWalk::seeded([5.0, 5.0], 1.7, grid.spacing(), 500, 11);
        let traj = walk.generate();
        assert_eq!(traj.len(), 500);
        assert_eq!(traj.first(), Some(&[5.0, 5.0]));
        for pair in traj.points().windows(2) {
            let step = vector_norm(&[pair[1][0] - pair[0][0], pair[1][1] - pair[0][1]]);
            assert_relative_eq!(step, 1.7 * 0.25, max_relative = 1e-9);
        }
    }

    #[test]
    fn same_seed_gives_bit_identical_walks() {
        let a = RandomWalk::seeded([1.0, 2.0], 1.0, 1.0, 200, 1234).generate();
        let b = RandomWalk::seeded([1.0, 2.0], 1.0, 1.0, 200, 1234).generate();
        assert_eq!(a, b);
        let c = RandomWalk::seeded([1.0, 2.0], 1.0, 1.0, 200, 4321).generate();
        assert_ne!(a, c);
    }

    #[test]
    fn params_walk_has_one_fewer_sample_than_grid() {
        let mut params = SimulationParams::default();
        params.walk = WalkOptions {
            seed: Some(3),
            steps: None,
        };
        let mut walk = RandomWalk::from_params(&params).unwrap();
        assert_relative_eq!(walk.step_length(), 1.0);
        let traj = walk.generate();
        assert_eq!(traj.len(), 100);
        assert_eq!(traj.first(), Some(&params.start.point()));
    }

    #[test]
    fn step_length_uses_actual_grid_spacing() {
        let mut params = SimulationParams::default();
        params.time = TimeGrid::new(0.0, 100.0, 401).unwrap();
        params.walk.seed = Some(9);
        let walk = RandomWalk::from_params(&params).unwrap();
        assert_relative_eq!(walk.step_length(), 0.25);
        assert_eq!(walk.samples(), 400);
    }

    #[test]
    fn headings_cover_all_quadrants() {
        let traj = RandomWalk::seeded([0.0, 0.0], 1.0, 1.0, 400, 5).generate();
        let mut quadrants = [false; 4];
        for pair in traj.points().windows(2) {
            let dx = pair[1][0] - pair[0][0];
            let dy = pair[1][1] - pair[0][1];
            let q = match (dx >= 0.0, dy >= 0.0) {
                (true, true) => 0,
                (false, true) => 1,
                (false, false) => 2,
                (true, false) => 3,
            };
            quadrants[q] = true;
        }
        assert!(quadrants.iter().all(|q| *q));
    }

    #[test]
    fn custom_sample_count_and_empty_walk() {
        let traj = RandomWalk::seeded([0.0, 0.0], 1.0, 1.0, 10, 1)
            .with_samples(3)
            .generate();
        assert_eq!(traj.len(), 3);
        let empty = RandomWalk::seeded([0.0, 0.0], 1.0, 1.0, 0, 1).generate();
        assert!(empty.is_empty());
    }

    #[test]
    fn seeding_failure_is_not_a_domain_error() {
        let err = seed_error(rand::Error::new("entropy source unavailable"));
        assert!(matches!(err, SimulationError::Seed { .. }));
        let message = err.to_string();
        assert!(message.contains("entropy source unavailable"));
        assert!(!message.contains("domain"));
    }

    #[test]
    fn unseeded_walk_draws_from_thread_rng() {
        let params = SimulationParams::default();
        let traj = RandomWalk::from_params(&params).unwrap().generate();
        assert_eq!(traj.len(), 100);
    }
}
