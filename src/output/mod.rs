//! Labeled forecast records and the labeler that validates them.

mod labeler;
mod record;

pub use labeler::{LabelError, OutputLabeler};
pub use record::ForecastRecord;
