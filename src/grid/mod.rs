//! Gridded atmospheric state and its coordinate metadata.

mod coords;
mod window;

pub use coords::Coordinates;
pub use window::{InputWindow, WindowError, HISTORY_LEN};
