//! Attaches coordinates to a step's raw output and checks consistency.

use std::sync::Arc;

use chrono::NaiveDateTime;
use ndarray::{Array5, Axis};
use thiserror::Error;

use super::ForecastRecord;
use crate::grid::Coordinates;

/// Mismatches between a model's output and the run it belongs to.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LabelError {
    #[error("Forecast batch size must be 1, got {0}")]
    BatchSize(usize),
    #[error("Forecast has no lead slices")]
    Empty,
    #[error("Forecast {axis} extent is {actual}, coordinates have {expected}")]
    ExtentMismatch {
        axis: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Lead time {actual} h does not match step {step} (expected {expected} h)")]
    LeadTime {
        step: usize,
        expected: u32,
        actual: u32,
    },
    #[error("{slices} lead slices do not evenly divide a {interval} h interval")]
    SubStepSpacing { slices: usize, interval: u32 },
}

/// Labels each step's forecast with the run's coordinates.
///
/// The coordinates are those of the original input window and are shared,
/// unchanged, by every record of the run.
#[derive(Debug, Clone)]
pub struct OutputLabeler {
    coords: Arc<Coordinates>,
    init_time: NaiveDateTime,
    interval_hours: u32,
}

impl OutputLabeler {
    pub fn new(coords: Arc<Coordinates>, init_time: NaiveDateTime, interval_hours: u32) -> Self {
        Self {
            coords,
            init_time,
            interval_hours,
        }
    }

    pub fn coords(&self) -> &Arc<Coordinates> {
        &self.coords
    }

    /// Validates `forecast` `(1, lead, channel, lat, lon)` and wraps it in a record.
    pub fn label(
        &self,
        forecast: Array5<f32>,
        step_index: usize,
        lead_time: u32,
        valid_time: NaiveDateTime,
    ) -> Result<ForecastRecord, LabelError> {
        let shape = forecast.shape();
        if shape[0] != 1 {
            return Err(LabelError::BatchSize(shape[0]));
        }
        let slices = shape[1];
        if slices == 0 {
            return Err(LabelError::Empty);
        }

        let (c, h, w) = self.coords.shape();
        for (axis, expected, actual) in [("channel", c, shape[2]), ("lat", h, shape[3]), ("lon", w, shape[4])] {
            if expected != actual {
                return Err(LabelError::ExtentMismatch {
                    axis,
                    expected,
                    actual,
                });
            }
        }

        let expected = (step_index as u32 + 1) * self.interval_hours;
        if lead_time != expected {
            return Err(LabelError::LeadTime {
                step: step_index,
                expected,
                actual: lead_time,
            });
        }

        let lead_times = self.sub_lead_times(lead_time, slices)?;

        Ok(ForecastRecord {
            init_time: self.init_time,
            valid_time,
            step_index,
            lead_time,
            lead_times,
            data: forecast.index_axis_move(Axis(0), 0),
            coords: Arc::clone(&self.coords),
        })
    }

    /// Lead labels for `slices` evenly spaced slices ending at `lead_time`.
    fn sub_lead_times(&self, lead_time: u32, slices: usize) -> Result<Vec<u32>, LabelError> {
        let spacing_err = LabelError::SubStepSpacing {
            slices,
            interval: self.interval_hours,
        };
        let n = u32::try_from(slices).map_err(|_| spacing_err.clone())?;
        if self.interval_hours % n != 0 {
            return Err(spacing_err);
        }
        let spacing = self.interval_hours / n;
        Ok((0..n).map(|j| lead_time - (n - 1 - j) * spacing).collect())
    }
}
