//! Autoregressive multi-step weather forecasting.
//!
//! This crate rolls a learned next-step predictor forward over a rolling
//! two-state window of gridded atmospheric data, optionally refining each
//! step into finer sub-steps, and emits one coordinate-labeled record per
//! step.

pub mod time;
pub mod grid;
pub mod model;
pub mod output;
pub mod export;
pub mod input;
pub mod stepper;
pub mod driver;

pub use grid::{Coordinates, InputWindow};
pub use model::{FeatureName, Features, ForecastModel, LinearInterp, Persistence};
pub use output::{ForecastRecord, OutputLabeler};
pub use export::{MemoryPersister, Persister, RawPersister};
pub use input::{RawWindowSource, WindowSource};
pub use stepper::{ErrorKind, ForecastError, ForecastSlice, ForecastStepper, StepperConfig};
pub use time::{time_embedding, TemporalEncoder};
