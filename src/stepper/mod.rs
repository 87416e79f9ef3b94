//! Autoregressive forecast stepper.
//!
//! Owns the rolling two-state window and steps it forward with a predictor,
//! optionally refining each reported step, and hands every labeled record to
//! a [`Persister`](crate::export::Persister) before advancing.

mod config;
mod error;
mod state;
mod forecast;

pub use config::{ForecastSlice, StepperConfig};
pub use error::{ErrorKind, ForecastError};
pub use state::{ForecastState, StepperStatus};
pub use forecast::{ForecastStepper, RunSummary, StepReport};
