//! Persistence of forecast records.
//!
//! Records are handed over one at a time, in step order. Supports a raw
//! little-endian float layout with a JSON sidecar per step, and an in-memory
//! collector.

mod memory;
mod persister;
mod raw;

pub use memory::MemoryPersister;
pub use persister::{PersistError, Persister};
pub use raw::{
    expected_file_size, read_f32_le, read_record, write_f32_le, RawPersister, RecordMetadata,
};
