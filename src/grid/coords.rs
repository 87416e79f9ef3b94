//! Channel, latitude and longitude coordinates of a forecast grid.

use serde::{Deserialize, Serialize};

/// Coordinate labels shared by the input window and every forecast record.
///
/// Latitude runs north to south (`90 .. -90`), longitude in the order of the
/// grid's last axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Channel names, e.g. `z500`, `t850`, `msl`.
    pub channel: Vec<String>,
    /// Latitude values in degrees.
    pub lat: Vec<f64>,
    /// Longitude values in degrees.
    pub lon: Vec<f64>,
}

impl Coordinates {
    pub fn new(channel: Vec<String>, lat: Vec<f64>, lon: Vec<f64>) -> Self {
        Self { channel, lat, lon }
    }

    /// Builds a regular global grid with the given spacing in degrees.
    ///
    /// Latitude spans `90 ..= -90` and longitude `0 .. 360`. Returns `None`
    /// unless the spacing is positive and no wider than 180 degrees.
    pub fn regular(channel: Vec<String>, spacing_deg: f64) -> Option<Self> {
        if !(spacing_deg > 0.0 && spacing_deg <= 180.0) {
            return None;
        }
        let n_lat = (180.0 / spacing_deg).round() as usize + 1;
        let n_lon = (360.0 / spacing_deg).round() as usize;
        let lat = (0..n_lat).map(|i| 90.0 - i as f64 * spacing_deg).collect();
        let lon = (0..n_lon).map(|i| i as f64 * spacing_deg).collect();
        Some(Self { channel, lat, lon })
    }

    pub fn n_channels(&self) -> usize {
        self.channel.len()
    }

    pub fn n_lat(&self) -> usize {
        self.lat.len()
    }

    pub fn n_lon(&self) -> usize {
        self.lon.len()
    }

    /// Grid extent as `(channel, lat, lon)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.n_channels(), self.n_lat(), self.n_lon())
    }

    /// Index of the first latitude that does not strictly decrease, if any.
    pub fn first_unordered_lat(&self) -> Option<usize> {
        self.lat
            .windows(2)
            // NaN counts as unordered.
            .position(|w| !(w[0] > w[1]))
            .map(|i| i + 1)
    }

    /// True when latitude runs strictly from 90 down to -90.
    pub fn is_north_to_south(&self) -> bool {
        matches!(
            (self.lat.first(), self.lat.last()),
            (Some(&first), Some(&last)) if first == 90.0 && last == -90.0
        ) && self.first_unordered_lat().is_none()
    }
}
