//! The persister contract.

use thiserror::Error;

use crate::output::ForecastRecord;

/// Errors that can occur while persisting or reading back records.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Metadata error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid data: {0}")]
    Format(String),
}

/// Receives each step's record as soon as it is labeled.
///
/// The stepper advances only after `persist` returns `Ok`; an error aborts
/// the run and leaves earlier records in place.
pub trait Persister {
    fn persist(&mut self, record: ForecastRecord) -> Result<(), PersistError>;
}

impl<P: Persister + ?Sized> Persister for &mut P {
    fn persist(&mut self, record: ForecastRecord) -> Result<(), PersistError> {
        (**self).persist(record)
    }
}

impl<P: Persister + ?Sized> Persister for Box<P> {
    fn persist(&mut self, record: ForecastRecord) -> Result<(), PersistError> {
        (**self).persist(record)
    }
}
