//! Error taxonomy shared by every stage of a simulation run.

use crate::config::ChaosCoefficients;
use std::path::PathBuf;
use thiserror::Error;

pub type SimulationResult<T> = Result<T, SimulationError>;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid domain: {reason}")]
    InvalidDomain { reason: String },
    #[error("integration failed at t={time}: {reason} ({params})")]
    Integration {
        time: f64,
        reason: String,
        params: ChaosCoefficients,
    },
    #[error("unable to seed the random walk: {reason}")]
    Seed { reason: String },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SimulationError {
    pub(crate) fn invalid_domain(reason: impl Into<String>) -> Self {
        SimulationError::InvalidDomain {
            reason: reason.into(),
        }
    }

    pub(crate) fn integration(
        time: f64,
        reason: impl Into<String>,
        params: ChaosCoefficients,
    ) -> Self {
        SimulationError::Integration {
            time,
            reason: reason.into(),
            params,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse TOML config: {details}")]
    Parse { details: String },
}

#[cfg(feature = "python")]
impl From<SimulationError> for pyo3::PyErr {
    fn from(err: SimulationError) -> Self {
        use pyo3::exceptions::{PyRuntimeError, PyValueError};
        match err {
            SimulationError::Integration { .. } | SimulationError::Seed { .. } => {
                PyRuntimeError::new_err(err.to_string())
            }
            other => PyValueError::new_err(other.to_string()),
        }
    }
}
