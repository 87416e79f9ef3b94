//! In-memory record collector.

use super::{PersistError, Persister};
use crate::output::ForecastRecord;

/// Keeps every record it receives, in arrival order.
#[derive(Debug, Default)]
pub struct MemoryPersister {
    records: Vec<ForecastRecord>,
}

impl MemoryPersister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ForecastRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<ForecastRecord> {
        self.records
    }
}

impl Persister for MemoryPersister {
    fn persist(&mut self, record: ForecastRecord) -> Result<(), PersistError> {
        self.records.push(record);
        Ok(())
    }
}
