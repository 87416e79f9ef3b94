//! One step's labeled forecast.

use std::sync::Arc;

use chrono::NaiveDateTime;
use ndarray::Array4;

use crate::grid::Coordinates;

/// Immutable, coordinate-consistent forecast for one step.
///
/// `data` is laid out `(lead, channel, lat, lon)`: a single lead slice for a
/// plain step, several when a refiner reconstructed sub-steps.
#[derive(Debug, Clone)]
pub struct ForecastRecord {
    pub(crate) init_time: NaiveDateTime,
    pub(crate) valid_time: NaiveDateTime,
    pub(crate) step_index: usize,
    pub(crate) lead_time: u32,
    pub(crate) lead_times: Vec<u32>,
    pub(crate) data: Array4<f32>,
    pub(crate) coords: Arc<Coordinates>,
}

impl ForecastRecord {
    /// Anchor time of the run this record belongs to.
    pub fn init_time(&self) -> NaiveDateTime {
        self.init_time
    }

    pub fn valid_time(&self) -> NaiveDateTime {
        self.valid_time
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    /// Lead time of the step in hours.
    pub fn lead_time(&self) -> u32 {
        self.lead_time
    }

    /// Lead time in hours of each slice along the lead axis of `data`.
    pub fn lead_times(&self) -> &[u32] {
        &self.lead_times
    }

    pub fn data(&self) -> &Array4<f32> {
        &self.data
    }

    pub fn coords(&self) -> &Arc<Coordinates> {
        &self.coords
    }

    pub fn channel(&self) -> &[String] {
        &self.coords.channel
    }

    pub fn lat(&self) -> &[f64] {
        &self.coords.lat
    }

    pub fn lon(&self) -> &[f64] {
        &self.coords.lon
    }
}
