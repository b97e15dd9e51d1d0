//! Run parameters, their reference defaults and TOML loading.
//!
//! Every section of the configuration file is optional; a missing key falls
//! back to the reference parameterization (a 10×10 box with the walker
//! starting in the middle, `A = 0.5`, `B = 0.25`, `C = 0.25`, `v = 1` and a
//! 100-unit horizon sampled once per unit).

use crate::dynamics::integrator::SolverOptions;
use crate::error::{ConfigError, SimulationError, SimulationResult};
use crate::spatial::geometry::within;
use crate::types::{Axis, ChaosState, Point2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rectangle {
    pub xl: f64,
    pub yl: f64,
    pub xr: f64,
    pub yr: f64,
}

impl Default for Rectangle {
    fn default() -> Self {
        Self {
            xl: 0.0,
            yl: 0.0,
            xr: 10.0,
            yr: 10.0,
        }
    }
}

impl Rectangle {
    pub fn new(xl: f64, yl: f64, xr: f64, yr: f64) -> SimulationResult<Self> {
        let rect = Self { xl, yl, xr, yr };
        rect.validate()?;
        Ok(rect)
    }

    pub fn validate(&self) -> SimulationResult<()> {
        if ![self.xl, self.yl, self.xr, self.yr]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(SimulationError::invalid_domain(format!(
                "rectangle bounds must be finite, got {self}"
            )));
        }
        if self.xl >= self.xr {
            return Err(SimulationError::invalid_domain(format!(
                "xl ({}) must be strictly less than xr ({})",
                self.xl, self.xr
            )));
        }
        if self.yl >= self.yr {
            return Err(SimulationError::invalid_domain(format!(
                "yl ({}) must be strictly less than yr ({})",
                self.yl, self.yr
            )));
        }
        Ok(())
    }

    pub fn lower(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.xl,
            Axis::Y => self.yl,
        }
    }

    pub fn upper(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.xr,
            Axis::Y => self.yr,
        }
    }

    pub fn width(&self) -> f64 {
        self.xr - self.xl
    }

    pub fn height(&self) -> f64 {
        self.yr - self.yl
    }

    pub fn contains(&self, point: &Point2) -> bool {
        Axis::ALL
            .iter()
            .all(|&axis| within(axis.of(point), self.lower(axis), self.upper(axis)))
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}] x [{}, {}]",
            self.xl, self.xr, self.yl, self.yr
        )
    }
}

/// Coupling coefficients of the Arnold flow plus the planar drift speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaosCoefficients {
    pub a: f64,
    pub b: f64,
    /// `0` makes the phase subsystem periodic; larger values drive it chaotic.
    pub c: f64,
    pub v: f64,
}

impl Default for ChaosCoefficients {
    fn default() -> Self {
        Self {
            a: 0.5,
            b: 0.25,
            c: 0.25,
            v: 1.0,
        }
    }
}

impl fmt::Display for ChaosCoefficients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A={}, B={}, C={}, v={}", self.a, self.b, self.c, self.v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartPosition {
    pub x: f64,
    pub y: f64,
}

impl Default for StartPosition {
    fn default() -> Self {
        Self { x: 5.0, y: 5.0 }
    }
}

impl StartPosition {
    pub fn point(&self) -> Point2 {
        [self.x, self.y]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseAngles {
    pub x1: f64,
    pub x2: f64,
    pub x3: f64,
}

impl Default for PhaseAngles {
    fn default() -> Self {
        Self {
            x1: 4.0,
            x2: 3.5,
            x3: 0.0,
        }
    }
}

/// Evenly spaced sample times from `t0` to `t_end`, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "TimeSection")]
pub struct TimeGrid {
    t0: f64,
    t_end: f64,
    samples: usize,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct TimeSection {
    t0: f64,
    t_end: u32,
    samples: Option<usize>,
}

impl Default for TimeSection {
    fn default() -> Self {
        Self {
            t0: 0.0,
            t_end: 100,
            samples: None,
        }
    }
}

impl From<TimeSection> for TimeGrid {
    fn from(section: TimeSection) -> Self {
        let samples = section
            .samples
            .unwrap_or(section.t_end as usize + 1);
        Self {
            t0: section.t0,
            t_end: f64::from(section.t_end),
            samples,
        }
    }
}

impl Default for TimeGrid {
    fn default() -> Self {
        Self::reference(0.0, 100)
    }
}

impl TimeGrid {
    /// `t_end + 1` samples from `t0` to `t_end`.
    pub fn reference(t0: f64, t_end: u32) -> Self {
        Self {
            t0,
            t_end: f64::from(t_end),
            samples: t_end as usize + 1,
        }
    }

    pub fn new(t0: f64, t_end: f64, samples: usize) -> SimulationResult<Self> {
        let grid = Self {
            t0,
            t_end,
            samples,
        };
        grid.validate()?;
        Ok(grid)
    }

    pub fn validate(&self) -> SimulationResult<()> {
        if !self.t0.is_finite() || !self.t_end.is_finite() || self.t_end <= self.t0 {
            return Err(SimulationError::invalid_domain(format!(
                "time horizon must satisfy t0 < t_end, got t0={} t_end={}",
                self.t0, self.t_end
            )));
        }
        if self.samples < 2 {
            return Err(SimulationError::invalid_domain(format!(
                "time grid needs at least two samples, got {}",
                self.samples
            )));
        }
        Ok(())
    }

    pub fn t0(&self) -> f64 {
        self.t0
    }

    pub fn t_end(&self) -> f64 {
        self.t_end
    }

    pub fn len(&self) -> usize {
        self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }

    pub fn spacing(&self) -> f64 {
        if self.samples < 2 {
            return 0.0;
        }
        (self.t_end - self.t0) / (self.samples - 1) as f64
    }

    /// Sample time `index`; the last sample is exactly `t_end`.
    pub fn time(&self, index: usize) -> f64 {
        if index + 1 >= self.samples {
            return self.t_end;
        }
        self.t0 + index as f64 * self.spacing()
    }

    pub fn times(&self) -> Vec<f64> {
        (0..self.samples).map(|i| self.time(i)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct WalkOptions {
    /// Fixed RNG seed; `None` seeds from the thread-local generator.
    pub seed: Option<u64>,
    /// Number of walk samples; `None` uses one fewer than the time grid.
    pub steps: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub domain: Rectangle,
    pub start: StartPosition,
    pub chaos: ChaosCoefficients,
    pub phases: PhaseAngles,
    pub time: TimeGrid,
    pub solver: SolverOptions,
    pub walk: WalkOptions,
}

impl SimulationParams {
    pub fn validate(&self) -> SimulationResult<()> {
        self.domain.validate()?;
        let start = self.start.point();
        if !self.domain.contains(&start) {
            return Err(SimulationError::invalid_domain(format!(
                "start position ({}, {}) lies outside {}",
                start[0], start[1], self.domain
            )));
        }
        let c = &self.chaos;
        if ![c.a, c.b, c.c].iter().all(|v| v.is_finite()) {
            return Err(SimulationError::invalid_domain(format!(
                "chaos coefficients must be finite ({c})"
            )));
        }
        if !(c.v.is_finite() && c.v > 0.0) {
            return Err(SimulationError::invalid_domain(format!(
                "drift speed must be positive, got v={}",
                c.v
            )));
        }
        let p = &self.phases;
        if ![p.x1, p.x2, p.x3].iter().all(|v| v.is_finite()) {
            return Err(SimulationError::invalid_domain(
                "initial phase angles must be finite",
            ));
        }
        self.time.validate()?;
        self.solver.validate()?;
        if self.walk.steps == Some(0) {
            return Err(SimulationError::invalid_domain(
                "random walk needs at least one sample",
            ));
        }
        Ok(())
    }

    /// Chaos state at `t0`: the configured phases and the start position.
    pub fn initial_state(&self) -> ChaosState {
        ChaosState::new(
            self.phases.x1,
            self.phases.x2,
            self.phases.x3,
            self.start.x,
            self.start.y,
        )
    }

    pub fn walk_steps(&self) -> usize {
        self.walk
            .steps
            .unwrap_or_else(|| self.time.len().saturating_sub(1).max(1))
    }

    pub fn from_toml_str(contents: &str) -> SimulationResult<Self> {
        let params: SimulationParams =
            toml::from_str(contents).map_err(|err| ConfigError::Parse {
                details: err.to_string(),
            })?;
        params.validate()?;
        Ok(params)
    }
}

pub fn load_config(path: &Path) -> SimulationResult<SimulationParams> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    SimulationParams::from_toml_str(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    #[test]
    fn defaults_match_reference_parameterization() {
        let params = SimulationParams::default();
        params.validate().expect("reference parameters are valid");
        assert_eq!(params.domain, Rectangle::new(0.0, 0.0, 10.0, 10.0).unwrap());
        assert_eq!(params.initial_state().to_array(), [4.0, 3.5, 0.0, 5.0, 5.0]);
        assert_eq!(params.time.len(), 101);
        assert_relative_eq!(params.time.spacing(), 1.0);
        assert_eq!(params.walk_steps(), 100);
    }

    #[test]
    fn grid_spacing_follows_the_horizon() {
        let grid = TimeGrid::new(2.0, 4.0, 9).unwrap();
        assert_relative_eq!(grid.spacing(), 0.25);
        assert_eq!(grid.time(0), 2.0);
        assert_eq!(grid.time(8), 4.0);
        assert_relative_eq!(grid.time(3), 2.75);
        assert!(TimeGrid::new(1.0, 1.0, 5).is_err());
        assert!(TimeGrid::new(0.0, 1.0, 1).is_err());
    }

    #[test]
    fn degenerate_rectangle_is_rejected() {
        for (xl, yl, xr, yr) in [
            (0.0, 0.0, 0.0, 10.0),
            (0.0, 0.0, 10.0, 0.0),
            (5.0, 0.0, 1.0, 10.0),
            (0.0, f64::NAN, 10.0, 10.0),
        ] {
            let err = Rectangle::new(xl, yl, xr, yr).unwrap_err();
            assert!(matches!(err, SimulationError::InvalidDomain { .. }));
        }
    }

    #[test]
    fn start_outside_rectangle_is_rejected() {
        let mut params = SimulationParams::default();
        params.start = StartPosition { x: 11.0, y: 5.0 };
        let err = params.validate().unwrap_err();
        assert!(matches!(err, SimulationError::InvalidDomain { .. }));
        assert!(err.to_string().contains("outside"));
    }

    #[test]
    fn toml_overrides_keep_other_defaults() {
        let params = SimulationParams::from_toml_str(
            r#"
            [domain]
            xr = 20.0

            [chaos]
            c = 0.0

            [time]
            t_end = 50

            [walk]
            seed = 7
            "#,
        )
        .expect("config parses");
        assert_eq!(params.domain.xr, 20.0);
        assert_eq!(params.domain.yr, 10.0);
        assert_eq!(params.chaos.c, 0.0);
        assert_eq!(params.chaos.a, 0.5);
        assert_eq!(params.time.len(), 51);
        assert_eq!(params.walk.seed, Some(7));
    }

    #[test]
    fn invalid_toml_reports_parse_error() {
        let err = SimulationParams::from_toml_str("[domain\nxr = ").unwrap_err();
        assert!(matches!(
            err,
            SimulationError::Config(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn load_config_reads_file_and_validates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[start]\nx = 1.0\ny = 2.0").unwrap();
        let params = load_config(file.path()).expect("config loads");
        assert_eq!(params.start.point(), [1.0, 2.0]);

        let missing = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(
            missing,
            SimulationError::Config(ConfigError::Io { .. })
        ));
    }
}
