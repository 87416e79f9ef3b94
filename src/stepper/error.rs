//! Errors raised while setting up or running a forecast.

use thiserror::Error;

use super::StepperStatus;
use crate::export::PersistError;
use crate::grid::WindowError;
use crate::model::ModelError;
use crate::output::LabelError;
use crate::time::EncodingError;

/// Broad class of a [`ForecastError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input window, or one too close to the end of the date
    /// range; raised before any step runs.
    Precondition,
    /// Invalid setup; raised before any step runs.
    Configuration,
    /// A model or the persister failed mid-run.
    Collaborator,
    /// A model's output disagrees with the run's coordinates or timing.
    DataConsistency,
    /// The stepper was asked to advance after completing or failing.
    InvalidState,
}

/// Errors that abort a forecast run.
#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Invalid input window: {0}")]
    Window(#[from] WindowError),
    #[error("Invalid time encoding: {0}")]
    Encoding(#[from] EncodingError),
    #[error("Total steps must be at least 1")]
    NoSteps,
    #[error("Refinement requested but no refiner was supplied")]
    MissingRefiner,
    #[error("Model '{model}' requires unsupported input '{input}'")]
    UnsupportedInput { model: String, input: String },
    #[error("Model '{model}' failed at step {step}: {source}")]
    Model {
        model: String,
        step: usize,
        #[source]
        source: ModelError,
    },
    #[error("Model '{model}' returned shape {actual:?} at step {step}, expected {expected}")]
    OutputShape {
        model: String,
        step: usize,
        expected: String,
        actual: Vec<usize>,
    },
    #[error("Forecast for step {step} is inconsistent: {source}")]
    Label {
        step: usize,
        #[source]
        source: LabelError,
    },
    #[error("Persisting step {step} failed: {source}")]
    Persist {
        step: usize,
        #[source]
        source: PersistError,
    },
    #[error("Stepper is {0:?} and cannot advance")]
    NotSteppable(StepperStatus),
}

impl ForecastError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForecastError::Window(_) | ForecastError::Encoding(EncodingError::OutOfRange { .. }) => {
                ErrorKind::Precondition
            }
            ForecastError::Encoding(_)
            | ForecastError::NoSteps
            | ForecastError::MissingRefiner
            | ForecastError::UnsupportedInput { .. } => ErrorKind::Configuration,
            ForecastError::Model { .. }
            | ForecastError::OutputShape { .. }
            | ForecastError::Persist { .. } => ErrorKind::Collaborator,
            ForecastError::Label { .. } => ErrorKind::DataConsistency,
            ForecastError::NotSteppable(_) => ErrorKind::InvalidState,
        }
    }
}
