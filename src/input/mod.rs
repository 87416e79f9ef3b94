//! Sources of the initial input window.

mod raw;

pub use raw::{save_window, RawWindowSource, WindowMetadata, INPUT_DATA, INPUT_METADATA};

use thiserror::Error;

use crate::export::PersistError;
use crate::grid::{InputWindow, WindowError};

/// Errors that can occur while loading an input window.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Input not found: {0}")]
    NotFound(String),
    #[error("Failed to read input: {0}")]
    Read(#[from] PersistError),
    #[error("Invalid input window: {0}")]
    Window(#[from] WindowError),
}

/// Supplies the two historical states a run starts from.
pub trait WindowSource {
    fn load(&self) -> Result<InputWindow, SourceError>;
}
