//! Time-conditioning features for the forecast models.
//!
//! Provides the periodic time embedding fed to models that declare a `temb`
//! input, and the scalar `hour` / `doy` fractions for models that declare
//! those instead.

mod encoding;

pub use encoding::{
    day_of_year_fraction, hour_fraction, time_embedding, EncodingError, TemporalEncoder,
    DEFAULT_OFFSETS, FEATURES_PER_OFFSET,
};
