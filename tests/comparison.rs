use approx::{assert_abs_diff_eq, assert_relative_eq};
use arnold_mirror::{
    integrate_chaos, mirror_map, ArnoldField, Axis, ChaosCoefficients, ChaosState,
    PlanarTrajectory, RandomWalk, Rectangle, Simulation, SimulationError, SimulationParams,
    SolverOptions, TimeGrid, TrajectoryComparator,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct Recorder {
    seen: Vec<(usize, usize)>,
}

impl TrajectoryComparator for Recorder {
    type Output = ();

    fn compare(&mut self, pair: &arnold_mirror::ComparisonPair) -> Result<(), SimulationError> {
        self.seen.push((pair.chaotic.len(), pair.random.len()));
        Ok(())
    }
}

#[test]
fn right_wall_scenario_folds_remaining_samples() {
    let domain = Rectangle::new(0.0, 0.0, 10.0, 10.0).unwrap();
    let raw = PlanarTrajectory::new(vec![[5.0, 5.0], [12.0, 5.0], [12.0, 5.0]]);
    let folded = mirror_map(&raw, &domain).unwrap();
    assert_eq!(folded.points(), &[[5.0, 5.0], [8.0, 5.0], [8.0, 5.0]]);
}

#[test]
fn walk_then_mirror_keeps_cardinality_and_start() {
    init_logging();
    let params = SimulationParams::default();
    let raw = RandomWalk::seeded(params.start.point(), 1.0, params.time.spacing(), 100, 2024)
        .generate();
    let folded = mirror_map(&raw, &params.domain).unwrap();
    assert_eq!(folded.len(), raw.len());
    assert_eq!(folded.first(), raw.first());
    for pair in raw.points().windows(2) {
        let step = (pair[1][0] - pair[0][0]).hypot(pair[1][1] - pair[0][1]);
        assert_relative_eq!(step, 1.0, max_relative = 1e-9);
    }
}

#[test]
fn uncoupled_flow_is_a_straight_line() {
    let heading = -2.2;
    let field = ArnoldField::new(ChaosCoefficients {
        a: 0.0,
        b: 0.0,
        c: 0.0,
        v: 0.8,
    });
    let grid = TimeGrid::reference(0.0, 50);
    let initial = ChaosState::new(0.0, 0.0, heading, 3.0, 4.0);
    let outcome = integrate_chaos(&field, initial, &grid, SolverOptions::default()).unwrap();
    let xs = outcome.trajectory.positions().axis_values(Axis::X);
    let ys = outcome.trajectory.positions().axis_values(Axis::Y);
    for (i, t) in grid.times().into_iter().enumerate() {
        assert_abs_diff_eq!(xs[i], 3.0 + 0.8 * t * heading.cos(), epsilon = 1e-6);
        assert_abs_diff_eq!(ys[i], 4.0 + 0.8 * t * heading.sin(), epsilon = 1e-6);
    }
}

#[test]
fn toml_driven_run_reaches_the_comparator() {
    init_logging();
    let params = SimulationParams::from_toml_str(
        r#"
        [domain]
        xl = -5.0
        yl = -5.0
        xr = 5.0
        yr = 5.0

        [start]
        x = 0.0
        y = 0.0

        [chaos]
        c = 0.6

        [time]
        t_end = 60

        [walk]
        seed = 8
        "#,
    )
    .unwrap();
    let sim = Simulation::new(params).unwrap();
    let mut recorder = Recorder { seen: Vec::new() };
    sim.run_with(&mut recorder).unwrap();
    sim.run_with(&mut recorder).unwrap();
    assert_eq!(recorder.seen, vec![(61, 60), (61, 60)]);
}

#[test]
fn comparison_pair_arrays_have_two_columns() {
    let mut params = SimulationParams::default();
    params.walk.seed = Some(31);
    let pair = Simulation::new(params).unwrap().run().unwrap();
    assert_eq!(pair.chaotic.to_array().shape(), &[101, 2]);
    assert_eq!(pair.random.to_array().shape(), &[100, 2]);
}

#[test]
fn pathological_configuration_is_rejected_up_front() {
    let err = SimulationParams::from_toml_str("[domain]\nxl = 10.0\nxr = 10.0\n").unwrap_err();
    assert!(matches!(err, SimulationError::InvalidDomain { .. }));
}
