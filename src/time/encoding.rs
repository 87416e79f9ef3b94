//! Periodic time embedding and scalar time fractions.

use chrono::{Datelike, Duration, NaiveDateTime, Timelike};
use thiserror::Error;

/// Number of sub-offsets sampled around each step (previous, current, next).
pub const DEFAULT_OFFSETS: usize = 3;

/// Scalars emitted per sub-offset: two phase fractions, their sines and cosines.
pub const FEATURES_PER_OFFSET: usize = 6;

/// Divisor for the day-of-year phase in the embedding (leap-year safe).
const EMBEDDING_DAYS: f32 = 366.0;

/// Divisor and clip for the scalar `doy` feature.
const SCALAR_DAYS: u32 = 365;

/// Errors raised by an invalid encoder setup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("Base interval must be positive, got {0} h")]
    NonPositiveInterval(u32),
    #[error("Offset count must be odd and non-zero, got {0}")]
    InvalidOffsetCount(usize),
    #[error("Time {offset_hours} h from the anchor is outside the supported date range")]
    OutOfRange { offset_hours: i64 },
}

/// Stateless encoder turning a step index into its time embedding.
///
/// Every call with the same anchor and step index yields bit-identical output,
/// so a run is reproducible from its start time and step count alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporalEncoder {
    interval_hours: u32,
    offsets: usize,
}

impl TemporalEncoder {
    /// Creates an encoder with the default three sub-offsets.
    pub fn new(interval_hours: u32) -> Result<Self, EncodingError> {
        Self::with_offsets(interval_hours, DEFAULT_OFFSETS)
    }

    /// Creates an encoder sampling `offsets` intervals centered on each step.
    ///
    /// `offsets` must be odd so the window is symmetric around the step.
    pub fn with_offsets(interval_hours: u32, offsets: usize) -> Result<Self, EncodingError> {
        if interval_hours == 0 {
            return Err(EncodingError::NonPositiveInterval(interval_hours));
        }
        if offsets == 0 || offsets % 2 == 0 {
            return Err(EncodingError::InvalidOffsetCount(offsets));
        }
        Ok(Self {
            interval_hours,
            offsets,
        })
    }

    /// Length of every embedding this encoder produces.
    pub fn embedding_len(&self) -> usize {
        self.offsets * FEATURES_PER_OFFSET
    }

    /// Encodes the step `step_index` of a run anchored at `anchor`.
    ///
    /// Per offset `o` the timestamp `anchor + (step_index + o) * interval` is
    /// reduced to `doy = day_of_year / 366` and `hour = hour / 24`, emitted as
    /// `[doy, hour, sin(doy), sin(hour), cos(doy), cos(hour)]`.
    pub fn encode(&self, anchor: NaiveDateTime, step_index: usize) -> Result<Vec<f32>, EncodingError> {
        let half = (self.offsets / 2) as i64;
        let mut out = Vec::with_capacity(self.embedding_len());

        for o in -half..=half {
            let t = self.shifted(anchor, step_offset(step_index).saturating_add(o))?;

            let doy = t.ordinal() as f32 / EMBEDDING_DAYS;
            let hour = t.hour() as f32 / 24.0;
            out.extend_from_slice(&[doy, hour, doy.sin(), hour.sin(), doy.cos(), hour.cos()]);
        }

        Ok(out)
    }

    /// Valid time of step `step_index`: `anchor + step_index * interval`.
    pub fn valid_time(&self, anchor: NaiveDateTime, step_index: usize) -> Result<NaiveDateTime, EncodingError> {
        self.shifted(anchor, step_offset(step_index))
    }

    fn shifted(&self, anchor: NaiveDateTime, intervals: i64) -> Result<NaiveDateTime, EncodingError> {
        let offset_hours = intervals.saturating_mul(self.interval_hours as i64);
        Duration::try_hours(offset_hours)
            .and_then(|d| anchor.checked_add_signed(d))
            .ok_or(EncodingError::OutOfRange { offset_hours })
    }
}

fn step_offset(step_index: usize) -> i64 {
    i64::try_from(step_index).unwrap_or(i64::MAX)
}

/// Time embedding for one step with the default sub-offsets.
pub fn time_embedding(
    anchor: NaiveDateTime,
    step_index: usize,
    interval_hours: u32,
) -> Result<Vec<f32>, EncodingError> {
    TemporalEncoder::new(interval_hours)?.encode(anchor, step_index)
}

/// Hour of day as a fraction of the day, in `[0, 1)`.
pub fn hour_fraction(t: NaiveDateTime) -> f32 {
    t.hour() as f32 / 24.0
}

/// Day of year clipped at 365, as a fraction of 365, in `(0, 1]`.
///
/// Uses 365 where the embedding uses 366; models were trained this way.
pub fn day_of_year_fraction(t: NaiveDateTime) -> f32 {
    t.ordinal().min(SCALAR_DAYS) as f32 / SCALAR_DAYS as f32
}
