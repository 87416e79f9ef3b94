//! Reference models usable without a learned backend.

use ndarray::{stack, Array4, Array5, ArrayView5, Axis};
use rayon::prelude::*;

use super::{Features, ForecastModel, ModelError, WINDOW_INPUT};

/// Persistence forecast: the future looks like the window.
///
/// Returns its input unchanged, so the rolling window never moves while lead
/// time still advances.
#[derive(Debug, Clone, Copy, Default)]
pub struct Persistence;

impl ForecastModel for Persistence {
    fn name(&self) -> &str {
        "persistence"
    }

    fn input_names(&self) -> Vec<String> {
        vec![WINDOW_INPUT.to_string()]
    }

    fn run(&self, window: ArrayView5<f32>, _features: &Features) -> Result<Array5<f32>, ModelError> {
        Ok(window.to_owned())
    }
}

/// Refiner reconstructing sub-steps by linear interpolation.
///
/// Emits `steps` slices between the penultimate and last history slices of
/// its input, the last one equal to the final slice.
#[derive(Debug, Clone, Copy)]
pub struct LinearInterp {
    steps: usize,
}

impl LinearInterp {
    /// Creates a refiner producing `steps` slices (at least one).
    pub fn new(steps: usize) -> Self {
        Self { steps: steps.max(1) }
    }

    pub fn steps(&self) -> usize {
        self.steps
    }
}

impl ForecastModel for LinearInterp {
    fn name(&self) -> &str {
        "linear-interp"
    }

    fn input_names(&self) -> Vec<String> {
        vec![WINDOW_INPUT.to_string()]
    }

    fn run(&self, window: ArrayView5<f32>, _features: &Features) -> Result<Array5<f32>, ModelError> {
        let history = window.len_of(Axis(1));
        if history < 2 {
            return Err(ModelError::InvalidInput(
                window.shape().to_vec(),
                "need at least two history slices".to_string(),
            ));
        }

        let from = window.index_axis(Axis(1), history - 2);
        let to = window.index_axis(Axis(1), history - 1);
        let delta = &to - &from;

        let slices: Vec<Array4<f32>> = (1..=self.steps)
            .into_par_iter()
            .map(|j| {
                let w = j as f32 / self.steps as f32;
                &from + &(&delta * w)
            })
            .collect();

        let views: Vec<_> = slices.iter().map(|s| s.view()).collect();
        stack(Axis(1), &views).map_err(|e| ModelError::Backend(e.to_string()))
    }
}
