//! Stepper configuration.

use serde::{Deserialize, Serialize};

use crate::time::DEFAULT_OFFSETS;

/// Which slice of the predictor's raw output is reported as the step forecast.
///
/// The whole raw output always seeds the next window; this only selects what
/// is labeled and persisted when no refiner runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForecastSlice {
    /// Second-to-last slice along the history axis.
    Penultimate,
    /// Trailing slice along the history axis.
    Last,
}

impl Default for ForecastSlice {
    fn default() -> Self {
        Self::Penultimate
    }
}

impl ForecastSlice {
    /// Index of the reported slice in an output with `history` slices.
    ///
    /// `history` must be at least 2.
    pub fn index(&self, history: usize) -> usize {
        match self {
            ForecastSlice::Penultimate => history - 2,
            ForecastSlice::Last => history - 1,
        }
    }
}

/// Parameters of one forecast run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepperConfig {
    /// Number of forward steps to run.
    pub total_steps: usize,
    /// Base interval between steps, in hours.
    pub interval_hours: u32,
    /// Report refined output instead of the nominal slice.
    pub use_refiner: bool,
    /// Reported slice when refinement is off.
    pub forecast_slice: ForecastSlice,
    /// Sub-offsets sampled by the time embedding (odd).
    pub embedding_offsets: usize,
}

impl Default for StepperConfig {
    fn default() -> Self {
        Self {
            total_steps: 1,
            interval_hours: 6,
            use_refiner: false,
            forecast_slice: ForecastSlice::Penultimate,
            embedding_offsets: DEFAULT_OFFSETS,
        }
    }
}

impl StepperConfig {
    /// Creates a configuration for `total_steps` six-hourly steps.
    pub fn with_steps(total_steps: usize) -> Self {
        Self {
            total_steps,
            ..Default::default()
        }
    }

    /// Lead time in hours after `steps` completed steps.
    pub fn lead_time_after(&self, steps: usize) -> u32 {
        steps as u32 * self.interval_hours
    }
}
