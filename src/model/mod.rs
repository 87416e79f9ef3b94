//! Forecast model capability shared by predictors and refiners.
//!
//! Models are opaque: the stepper only knows which named inputs a model
//! declares and that it maps a 5-D window to a 5-D output. Any backend can
//! sit behind the trait.

mod builtin;
mod traits;

pub use builtin::{LinearInterp, Persistence};
pub use traits::{FeatureName, Features, ForecastModel, ModelError, WINDOW_INPUT};
