//! Python-facing bindings returning NumPy arrays for an external plotting layer.

use crate::comparison::Simulation;
use crate::config::{Rectangle, SimulationParams, TimeGrid};
use crate::spatial::mirror::mirror_map as fold_trajectory;
use crate::types::{PlanarTrajectory, Point2};
use ndarray::Array2;
use numpy::{IntoPyArray, PyArray1, PyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyType};

fn update_from_dict(params: &mut SimulationParams, dict: &Bound<'_, PyDict>) -> PyResult<()> {
    for (key, value) in dict.iter() {
        let key_str: String = key.extract()?;
        match key_str.as_str() {
            "xl" => params.domain.xl = value.extract()?,
            "yl" => params.domain.yl = value.extract()?,
            "xr" => params.domain.xr = value.extract()?,
            "yr" => params.domain.yr = value.extract()?,
            "xS" => params.start.x = value.extract()?,
            "yS" => params.start.y = value.extract()?,
            "A" => params.chaos.a = value.extract()?,
            "B" => params.chaos.b = value.extract()?,
            "C" => params.chaos.c = value.extract()?,
            "v" => params.chaos.v = value.extract()?,
            "x1_0" => params.phases.x1 = value.extract()?,
            "x2_0" => params.phases.x2 = value.extract()?,
            "x3_0" => params.phases.x3 = value.extract()?,
            "rtol" => params.solver.rtol = value.extract()?,
            "atol" => params.solver.atol = value.extract()?,
            "max_steps" => params.solver.max_steps = value.extract()?,
            "seed" => params.walk.seed = value.extract()?,
            "walk_steps" => params.walk.steps = value.extract()?,
            "t0" | "tEnd" | "samples" => {}
            other => {
                return Err(PyValueError::new_err(format!(
                    "Unknown simulation parameter '{other}'"
                )));
            }
        }
    }

    // The grid keys depend on each other, so they are applied together.
    let t0: f64 = match dict.get_item("t0")? {
        Some(v) => v.extract()?,
        None => params.time.t0(),
    };
    let t_end: f64 = match dict.get_item("tEnd")? {
        Some(v) => v.extract()?,
        None => params.time.t_end(),
    };
    let samples: Option<usize> = match dict.get_item("samples")? {
        Some(v) => v.extract()?,
        None => None,
    };
    if dict.contains("t0")? || dict.contains("tEnd")? || samples.is_some() {
        let samples = match samples {
            Some(samples) => samples,
            None => reference_samples(t_end)?,
        };
        params.time = TimeGrid::new(t0, t_end, samples)?;
    }
    Ok(())
}

/// One sample per unit time, which needs an integral `tEnd`.
fn reference_samples(t_end: f64) -> PyResult<usize> {
    if t_end.fract() != 0.0 || !(0.0..=f64::from(u32::MAX)).contains(&t_end) {
        return Err(PyValueError::new_err(format!(
            "tEnd must be a whole number of time units when samples is not given, got {t_end}"
        )));
    }
    Ok(t_end as usize + 1)
}

fn to_pyarray(py: Python<'_>, trajectory: &PlanarTrajectory) -> Py<PyArray2<f64>> {
    trajectory.to_array().into_pyarray(py).unbind()
}

#[pyclass(name = "Simulation", module = "arnold_mirror._arnold_core")]
pub struct PySimulation {
    inner: Simulation,
}

impl PySimulation {
    fn with_seed(&self, seed: Option<u64>) -> PyResult<Simulation> {
        let mut params = *self.inner.params();
        if seed.is_some() {
            params.walk.seed = seed;
        }
        Ok(Simulation::new(params)?)
    }
}

#[pymethods]
impl PySimulation {
    #[new]
    #[pyo3(signature = (params = None))]
    pub fn new(params: Option<&Bound<'_, PyDict>>) -> PyResult<Self> {
        let mut sim_params = SimulationParams::default();
        if let Some(p) = params {
            update_from_dict(&mut sim_params, p)?;
        }
        Ok(Self {
            inner: Simulation::new(sim_params)?,
        })
    }

    #[classmethod]
    pub fn from_toml(_cls: &Bound<'_, PyType>, contents: &str) -> PyResult<Self> {
        Ok(Self {
            inner: Simulation::new(SimulationParams::from_toml_str(contents)?)?,
        })
    }

    #[classmethod]
    pub fn default_params(_cls: &Bound<'_, PyType>, py: Python<'_>) -> PyResult<Py<PyDict>> {
        let params = SimulationParams::default();
        let dict = PyDict::new(py);
        dict.set_item("xl", params.domain.xl)?;
        dict.set_item("yl", params.domain.yl)?;
        dict.set_item("xr", params.domain.xr)?;
        dict.set_item("yr", params.domain.yr)?;
        dict.set_item("xS", params.start.x)?;
        dict.set_item("yS", params.start.y)?;
        dict.set_item("A", params.chaos.a)?;
        dict.set_item("B", params.chaos.b)?;
        dict.set_item("C", params.chaos.c)?;
        dict.set_item("v", params.chaos.v)?;
        dict.set_item("x1_0", params.phases.x1)?;
        dict.set_item("x2_0", params.phases.x2)?;
        dict.set_item("x3_0", params.phases.x3)?;
        dict.set_item("t0", params.time.t0())?;
        dict.set_item("tEnd", params.time.t_end())?;
        dict.set_item("rtol", params.solver.rtol)?;
        dict.set_item("atol", params.solver.atol)?;
        dict.set_item("max_steps", params.solver.max_steps)?;
        Ok(dict.into())
    }

    #[getter]
    pub fn domain(&self) -> (f64, f64, f64, f64) {
        let d = self.inner.params().domain;
        (d.xl, d.yl, d.xr, d.yr)
    }

    pub fn times(&self, py: Python<'_>) -> Py<PyArray1<f64>> {
        self.inner.params().time.times().into_pyarray(py).unbind()
    }

    /// Raw `(n, 5)` chaos states `x1, x2, x3, x, y`.
    pub fn chaos_states(&self, py: Python<'_>) -> PyResult<Py<PyArray2<f64>>> {
        let outcome = self.inner.integrate()?;
        let mut array = Array2::<f64>::zeros((outcome.trajectory.len(), 5));
        for (row_idx, state) in outcome.trajectory.iter().enumerate() {
            for (col_idx, value) in state.to_array().iter().enumerate() {
                array[(row_idx, col_idx)] = *value;
            }
        }
        Ok(array.into_pyarray(py).unbind())
    }

    #[pyo3(signature = (reflect = true))]
    pub fn chaotic_trajectory(&self, py: Python<'_>, reflect: bool) -> PyResult<Py<PyArray2<f64>>> {
        let positions = self.inner.integrate()?.trajectory.positions();
        let positions = if reflect {
            self.inner.mirror().reflect(&positions)
        } else {
            positions
        };
        Ok(to_pyarray(py, &positions))
    }

    #[pyo3(signature = (seed = None, reflect = true))]
    pub fn random_walk(
        &self,
        py: Python<'_>,
        seed: Option<u64>,
        reflect: bool,
    ) -> PyResult<Py<PyArray2<f64>>> {
        let sim = self.with_seed(seed)?;
        let walk = sim.walk()?;
        let walk = if reflect { sim.mirror().reflect(&walk) } else { walk };
        Ok(to_pyarray(py, &walk))
    }

    /// Folded `(chaotic, random)` arrays for overlay plotting.
    #[pyo3(signature = (seed = None))]
    pub fn compare(
        &self,
        py: Python<'_>,
        seed: Option<u64>,
    ) -> PyResult<(Py<PyArray2<f64>>, Py<PyArray2<f64>>)> {
        let pair = self.with_seed(seed)?.run()?;
        Ok((to_pyarray(py, &pair.chaotic), to_pyarray(py, &pair.random)))
    }

    fn __repr__(&self) -> String {
        let p = self.inner.params();
        format!(
            "Simulation(domain={}, {}, samples={})",
            p.domain,
            p.chaos,
            p.time.len()
        )
    }
}

/// Mirror-maps an `(n, 2)` point list into `bounds = (xl, yl, xr, yr)`.
#[pyfunction]
#[pyo3(name = "mirror_map")]
pub fn py_mirror_map(
    py: Python<'_>,
    points: Vec<Point2>,
    bounds: (f64, f64, f64, f64),
) -> PyResult<Py<PyArray2<f64>>> {
    let (xl, yl, xr, yr) = bounds;
    let domain = Rectangle::new(xl, yl, xr, yr)?;
    let folded = fold_trajectory(&PlanarTrajectory::new(points), &domain)?;
    Ok(to_pyarray(py, &folded))
}

/// Register classes and functions on the extension module.
pub fn register_classes(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PySimulation>()?;
    m.add_function(wrap_pyfunction!(py_mirror_map, m)?)?;
    Ok(())
}

#[cfg(all(test, feature = "python"))]
mod tests {
    use super::*;
    use numpy::{PyArrayMethods, PyUntypedArrayMethods};
    use pyo3::Python;

    fn simulation(py: Python<'_>, entries: &[(&str, f64)]) -> PyResult<PySimulation> {
        let dict = PyDict::new(py);
        for (key, value) in entries {
            dict.set_item(*key, *value)?;
        }
        PySimulation::new(Some(&dict))
    }

    #[test]
    fn end_time_alone_sets_one_sample_per_unit() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let sim = simulation(py, &[("tEnd", 50.0)]).expect("simulation");
            let grid = sim.inner.params().time;
            assert_eq!(grid.len(), 51);
            assert_eq!(grid.t_end(), 50.0);
            assert_eq!(sim.times(py).bind(py).len(), 51);
        });
    }

    #[test]
    fn start_time_alone_keeps_reference_sample_count() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let sim = simulation(py, &[("t0", 10.0)]).expect("simulation");
            let grid = sim.inner.params().time;
            assert_eq!(grid.len(), 101);
            assert_eq!(grid.t0(), 10.0);
            assert_eq!(grid.t_end(), 100.0);
        });
    }

    #[test]
    fn fractional_end_time_needs_explicit_samples() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let err = simulation(py, &[("tEnd", 50.5)])
                .err()
                .expect("fractional tEnd rejected");
            assert!(err.is_instance_of::<PyValueError>(py));

            let err = simulation(py, &[("tEnd", 1e30)])
                .err()
                .expect("oversized tEnd rejected");
            assert!(err.is_instance_of::<PyValueError>(py));

            let dict = PyDict::new(py);
            dict.set_item("tEnd", 50.5).expect("set tEnd");
            dict.set_item("samples", 11).expect("set samples");
            let sim = PySimulation::new(Some(&dict)).expect("explicit samples");
            assert_eq!(sim.inner.params().time.len(), 11);
        });
    }

    #[test]
    fn unknown_key_raises_value_error() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let err = simulation(py, &[("gamma", 1.0)])
                .err()
                .expect("unknown key rejected");
            assert!(err.is_instance_of::<PyValueError>(py));
            assert!(err.to_string().contains("gamma"));
        });
    }

    #[test]
    fn compare_returns_reference_shapes() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let sim = PySimulation::new(None).expect("default simulation");
            let (chaotic, random) = sim.compare(py, Some(12)).expect("compare");
            assert_eq!(chaotic.bind(py).shape(), &[101, 2]);
            assert_eq!(random.bind(py).shape(), &[100, 2]);

            let (again, _) = sim.compare(py, Some(12)).expect("compare again");
            assert_eq!(
                chaotic.bind(py).to_vec().expect("contiguous"),
                again.bind(py).to_vec().expect("contiguous")
            );
        });
    }

    #[test]
    fn mirror_map_function_folds_points() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let folded = py_mirror_map(
                py,
                vec![[5.0, 5.0], [12.0, 5.0], [12.0, 5.0]],
                (0.0, 0.0, 10.0, 10.0),
            )
            .expect("mirror map");
            assert_eq!(
                folded.bind(py).to_vec().expect("contiguous"),
                vec![5.0, 5.0, 8.0, 5.0, 8.0, 5.0]
            );

            let err = py_mirror_map(py, vec![[0.0, 0.0]], (1.0, 0.0, 1.0, 1.0))
                .err()
                .expect("degenerate bounds rejected");
            assert!(err.is_instance_of::<PyValueError>(py));
        });
    }
}
