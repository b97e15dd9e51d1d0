//! Runs both motion models, folds them into the domain and hands the pair to
//! a comparator.

use crate::config::{Rectangle, SimulationParams};
use crate::dynamics::integrator::{integrate_params, IntegrationOutcome};
use crate::error::{SimulationError, SimulationResult};
use crate::spatial::{MirrorMap, RandomWalk};
use crate::types::PlanarTrajectory;
use log::{debug, info};
use serde::Serialize;

/// The two folded trajectories, ready for rendering. `chaotic` has one sample
/// per grid time, `random` one fewer by default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonPair {
    pub domain: Rectangle,
    pub chaotic: PlanarTrajectory,
    pub random: PlanarTrajectory,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectorySummary {
    pub samples: usize,
    pub path_length: f64,
    /// `(min_x, max_x, min_y, max_y)`
    pub extent: (f64, f64, f64, f64),
    /// Share of samples inside the closed rectangle. Compounded folds can
    /// leave samples outside, so this is not always 1.
    pub inside_fraction: f64,
}

impl TrajectorySummary {
    fn of(trajectory: &PlanarTrajectory, domain: &Rectangle) -> Self {
        let inside = trajectory.iter().filter(|p| domain.contains(p)).count();
        let inside_fraction = if trajectory.is_empty() {
            0.0
        } else {
            inside as f64 / trajectory.len() as f64
        };
        Self {
            samples: trajectory.len(),
            path_length: trajectory.path_length(),
            extent: trajectory.extent(),
            inside_fraction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComparisonSummary {
    pub chaotic: TrajectorySummary,
    pub random: TrajectorySummary,
}

impl ComparisonPair {
    pub fn summary(&self) -> ComparisonSummary {
        ComparisonSummary {
            chaotic: TrajectorySummary::of(&self.chaotic, &self.domain),
            random: TrajectorySummary::of(&self.random, &self.domain),
        }
    }
}

/// Consumer of a finished pair, typically a plotting layer.
pub trait TrajectoryComparator {
    type Output;

    fn compare(&mut self, pair: &ComparisonPair) -> SimulationResult<Self::Output>;
}

/// Comparator that only reduces the pair to summary statistics.
#[derive(Debug, Default)]
pub struct SummaryComparator;

impl TrajectoryComparator for SummaryComparator {
    type Output = ComparisonSummary;

    fn compare(&mut self, pair: &ComparisonPair) -> SimulationResult<ComparisonSummary> {
        let summary = pair.summary();
        info!(
            "chaotic path {:.3} ({} samples), random path {:.3} ({} samples)",
            summary.chaotic.path_length,
            summary.chaotic.samples,
            summary.random.path_length,
            summary.random.samples
        );
        Ok(summary)
    }
}

#[derive(Debug, Clone)]
pub struct Simulation {
    params: SimulationParams,
    mirror: MirrorMap,
}

impl Simulation {
    pub fn new(params: SimulationParams) -> SimulationResult<Self> {
        params.validate()?;
        let mirror = MirrorMap::new(params.domain)?;
        Ok(Self { params, mirror })
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn mirror(&self) -> &MirrorMap {
        &self.mirror
    }

    /// Unfolded chaos trajectory.
    pub fn integrate(&self) -> SimulationResult<IntegrationOutcome> {
        integrate_params(&self.params)
    }

    /// Unfolded random walk.
    pub fn walk(&self) -> SimulationResult<PlanarTrajectory> {
        Ok(RandomWalk::from_params(&self.params)?.generate())
    }

    pub fn run(&self) -> SimulationResult<ComparisonPair> {
        let (chaos, walk) = self.generate_raw();
        let chaos = chaos?;
        let walk = walk?;

        let chaotic = self.mirror.reflect(&chaos.trajectory.positions());
        let random = self.mirror.reflect(&walk);
        self.ensure_finite(&chaotic)?;
        self.ensure_finite(&random)?;

        debug!(
            "run complete: {} chaotic samples, {} random samples",
            chaotic.len(),
            random.len()
        );
        Ok(ComparisonPair {
            domain: self.params.domain,
            chaotic,
            random,
        })
    }

    pub fn run_with<C: TrajectoryComparator>(&self, comparator: &mut C) -> SimulationResult<C::Output> {
        let pair = self.run()?;
        comparator.compare(&pair)
    }

    #[cfg(feature = "parallel")]
    fn generate_raw(
        &self,
    ) -> (
        SimulationResult<IntegrationOutcome>,
        SimulationResult<PlanarTrajectory>,
    ) {
        rayon::join(|| self.integrate(), || self.walk())
    }

    #[cfg(not(feature = "parallel"))]
    fn generate_raw(
        &self,
    ) -> (
        SimulationResult<IntegrationOutcome>,
        SimulationResult<PlanarTrajectory>,
    ) {
        (self.integrate(), self.walk())
    }

    fn ensure_finite(&self, trajectory: &PlanarTrajectory) -> SimulationResult<()> {
        match trajectory
            .iter()
            .position(|p| !(p[0].is_finite() && p[1].is_finite()))
        {
            Some(index) => Err(SimulationError::integration(
                self.params.time.time(index),
                format!("non-finite position at sample {index}"),
                self.params.chaos,
            )),
            None => Ok(()),
        }
    }
}
