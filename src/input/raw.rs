//! Input window stored as `input.raw` plus `input.json`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use ndarray::Array4;
use serde::{Deserialize, Serialize};

use super::{SourceError, WindowSource};
use crate::export::{read_f32_le, write_f32_le, PersistError};
use crate::grid::{Coordinates, InputWindow, HISTORY_LEN};

/// File name of the raw window grid.
pub const INPUT_DATA: &str = "input.raw";

/// File name of the window metadata.
pub const INPUT_METADATA: &str = "input.json";

/// Labels of a stored window; the grid is `(time, channel, lat, lon)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowMetadata {
    pub times: [NaiveDateTime; HISTORY_LEN],
    pub channel: Vec<String>,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
}

/// Loads the window from a directory holding [`INPUT_DATA`] and [`INPUT_METADATA`].
#[derive(Debug, Clone)]
pub struct RawWindowSource {
    dir: PathBuf,
}

impl RawWindowSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reads only the metadata, without loading the grid.
    pub fn metadata(&self) -> Result<WindowMetadata, SourceError> {
        let path = self.dir.join(INPUT_METADATA);
        if !path.exists() {
            return Err(SourceError::NotFound(path.display().to_string()));
        }
        let file = File::open(&path).map_err(PersistError::from)?;
        let meta = serde_json::from_reader(BufReader::new(file)).map_err(PersistError::from)?;
        Ok(meta)
    }
}

impl WindowSource for RawWindowSource {
    fn load(&self) -> Result<InputWindow, SourceError> {
        let meta = self.metadata()?;

        let path = self.dir.join(INPUT_DATA);
        if !path.exists() {
            return Err(SourceError::NotFound(path.display().to_string()));
        }

        let shape = [HISTORY_LEN, meta.channel.len(), meta.lat.len(), meta.lon.len()];
        let values = read_f32_le(&path, shape.iter().product())?;
        let data = Array4::from_shape_vec(shape, values)
            .map_err(|e| PersistError::Format(e.to_string()))?;

        let coords = Coordinates::new(meta.channel, meta.lat, meta.lon);
        Ok(InputWindow::new(data, meta.times, coords)?)
    }
}

/// Stores `window` under `dir` in the layout [`RawWindowSource`] reads.
pub fn save_window(window: &InputWindow, dir: &Path) -> Result<(), PersistError> {
    std::fs::create_dir_all(dir)?;
    write_f32_le(&dir.join(INPUT_DATA), window.data().iter())?;

    let coords = window.coords();
    let meta = WindowMetadata {
        times: *window.times(),
        channel: coords.channel.clone(),
        lat: coords.lat.clone(),
        lon: coords.lon.clone(),
    };
    let file = File::create(dir.join(INPUT_METADATA))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &meta)?;
    writer.flush()?;
    Ok(())
}
