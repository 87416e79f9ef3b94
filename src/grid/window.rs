//! The two-state history window that seeds a forecast run.

use std::sync::Arc;

use chrono::NaiveDateTime;
use ndarray::{Array4, Array5, Axis};
use thiserror::Error;

use super::Coordinates;

/// Number of historical states the models consume.
pub const HISTORY_LEN: usize = 2;

/// Violations of the input window's preconditions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WindowError {
    #[error("Window shape {actual:?} does not match coordinates {expected:?}")]
    ShapeMismatch {
        expected: [usize; 4],
        actual: Vec<usize>,
    },
    #[error("Input times are {actual_hours} h apart, expected {expected_hours} h")]
    IntervalMismatch {
        expected_hours: i64,
        actual_hours: i64,
    },
    #[error("Latitude must run from 90 to -90, got {first} .. {last}")]
    LatitudeOrientation { first: f64, last: f64 },
    #[error("Latitude is not strictly decreasing at index {0}")]
    LatitudeNotDecreasing(usize),
}

/// Historical states `(history, channel, lat, lon)`, oldest first.
#[derive(Debug, Clone)]
pub struct InputWindow {
    data: Array4<f32>,
    times: [NaiveDateTime; HISTORY_LEN],
    coords: Arc<Coordinates>,
}

impl InputWindow {
    /// Creates a window, checking the array against the coordinates.
    ///
    /// Time spacing and latitude orientation are checked separately by
    /// [`InputWindow::validate`], since they depend on the run's interval.
    pub fn new(
        data: Array4<f32>,
        times: [NaiveDateTime; HISTORY_LEN],
        coords: Coordinates,
    ) -> Result<Self, WindowError> {
        let (c, h, w) = coords.shape();
        let expected = [HISTORY_LEN, c, h, w];
        if data.shape() != expected {
            return Err(WindowError::ShapeMismatch {
                expected,
                actual: data.shape().to_vec(),
            });
        }

        Ok(Self {
            data,
            times,
            coords: Arc::new(coords),
        })
    }

    /// Checks both window invariants for a run with the given base interval.
    pub fn validate(&self, interval_hours: u32) -> Result<(), WindowError> {
        self.check_interval(interval_hours)?;
        self.check_latitude()
    }

    /// The two timestamps must be exactly one base interval apart.
    pub fn check_interval(&self, interval_hours: u32) -> Result<(), WindowError> {
        let actual = self.times[1] - self.times[0];
        let expected_hours = interval_hours as i64;
        if actual.num_seconds() != expected_hours * 3600 {
            return Err(WindowError::IntervalMismatch {
                expected_hours,
                actual_hours: actual.num_hours(),
            });
        }
        Ok(())
    }

    /// Latitude must run strictly from 90 down to -90.
    pub fn check_latitude(&self) -> Result<(), WindowError> {
        let lat = &self.coords.lat;
        let first = lat.first().copied().unwrap_or(f64::NAN);
        let last = lat.last().copied().unwrap_or(f64::NAN);
        if first != 90.0 || last != -90.0 {
            return Err(WindowError::LatitudeOrientation { first, last });
        }
        if let Some(i) = self.coords.first_unordered_lat() {
            return Err(WindowError::LatitudeNotDecreasing(i));
        }
        Ok(())
    }

    /// Reference time of the run: the newest state in the window.
    pub fn anchor(&self) -> NaiveDateTime {
        self.times[HISTORY_LEN - 1]
    }

    pub fn times(&self) -> &[NaiveDateTime; HISTORY_LEN] {
        &self.times
    }

    pub fn data(&self) -> &Array4<f32> {
        &self.data
    }

    pub fn coords(&self) -> &Arc<Coordinates> {
        &self.coords
    }

    /// Consumes the window into a model batch `(1, history, channel, lat, lon)`.
    pub fn into_batch(self) -> (Array5<f32>, Arc<Coordinates>) {
        (self.data.insert_axis(Axis(0)), self.coords)
    }
}
