//! Raw float export: one `.raw` grid and one `.json` sidecar per step.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use ndarray::Array4;
use serde::{Deserialize, Serialize};

use super::{PersistError, Persister};
use crate::output::ForecastRecord;

/// Labels stored next to each raw grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub init_time: NaiveDateTime,
    pub valid_time: NaiveDateTime,
    pub step: usize,
    pub lead_time: u32,
    pub lead_times: Vec<u32>,
    /// Grid shape as `(lead, channel, lat, lon)`.
    pub shape: [usize; 4],
    pub channel: Vec<String>,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
}

impl RecordMetadata {
    pub fn from_record(record: &ForecastRecord) -> Self {
        let s = record.data().shape();
        Self {
            init_time: record.init_time(),
            valid_time: record.valid_time(),
            step: record.step_index(),
            lead_time: record.lead_time(),
            lead_times: record.lead_times().to_vec(),
            shape: [s[0], s[1], s[2], s[3]],
            channel: record.channel().to_vec(),
            lat: record.lat().to_vec(),
            lon: record.lon().to_vec(),
        }
    }
}

/// Writes each record as `{lead:03}.raw` (f32 little-endian, row-major
/// `(lead, channel, lat, lon)`) plus `{lead:03}.json`.
#[derive(Debug)]
pub struct RawPersister {
    dir: PathBuf,
    written: usize,
}

impl RawPersister {
    /// Creates the persister, creating `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, written: 0 })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of records written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Path of the raw grid for `lead_time`.
    pub fn raw_path(&self, lead_time: u32) -> PathBuf {
        raw_path(&self.dir, lead_time)
    }

    /// Path of the metadata sidecar for `lead_time`.
    pub fn metadata_path(&self, lead_time: u32) -> PathBuf {
        metadata_path(&self.dir, lead_time)
    }
}

impl Persister for RawPersister {
    fn persist(&mut self, record: ForecastRecord) -> Result<(), PersistError> {
        let lead_time = record.lead_time();
        write_f32_le(&self.raw_path(lead_time), record.data().iter())?;

        let meta = RecordMetadata::from_record(&record);
        let file = File::create(self.metadata_path(lead_time))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &meta)?;
        writer.flush()?;

        self.written += 1;
        Ok(())
    }
}

fn raw_path(dir: &Path, lead_time: u32) -> PathBuf {
    dir.join(format!("{:03}.raw", lead_time))
}

fn metadata_path(dir: &Path, lead_time: u32) -> PathBuf {
    dir.join(format!("{:03}.json", lead_time))
}

/// Writes floats as consecutive little-endian 32-bit values.
pub fn write_f32_le<'a>(
    path: &Path,
    values: impl IntoIterator<Item = &'a f32>,
) -> Result<(), PersistError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for v in values {
        writer.write_all(&v.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads exactly `expected_len` little-endian 32-bit floats from `path`.
pub fn read_f32_le(path: &Path, expected_len: usize) -> Result<Vec<f32>, PersistError> {
    let bytes = std::fs::read(path)?;
    if bytes.len() != expected_len * 4 {
        return Err(PersistError::Format(format!(
            "{} holds {} bytes, expected {}",
            path.display(),
            bytes.len(),
            expected_len * 4
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Reads back the record written for `lead_time` under `dir`.
pub fn read_record(dir: &Path, lead_time: u32) -> Result<(RecordMetadata, Array4<f32>), PersistError> {
    let file = File::open(metadata_path(dir, lead_time))?;
    let meta: RecordMetadata = serde_json::from_reader(BufReader::new(file))?;

    let len = meta.shape.iter().product();
    let values = read_f32_le(&raw_path(dir, lead_time), len)?;
    let data = Array4::from_shape_vec(meta.shape, values)
        .map_err(|e| PersistError::Format(e.to_string()))?;

    Ok((meta, data))
}

/// Expected `.raw` size in bytes for a `(lead, channel, lat, lon)` grid.
pub fn expected_file_size(shape: [usize; 4]) -> u64 {
    shape.iter().map(|&n| n as u64).product::<u64>() * 4
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Coordinates;
    use crate::output::OutputLabeler;
    use chrono::NaiveDate;
    use ndarray::Array5;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn record(slices: usize, step: usize) -> ForecastRecord {
        let init = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let coords = Coordinates::regular(vec!["z500".into(), "t2m".into()], 90.0).unwrap();
        let labeler = OutputLabeler::new(Arc::new(coords), init, 6);
        let data = Array5::from_shape_fn((1, slices, 2, 3, 4), |(_, l, c, h, w)| {
            (l * 1000 + c * 100 + h * 10 + w) as f32
        });
        labeler
            .label(data, step, (step as u32 + 1) * 6, init)
            .unwrap()
    }

    #[test]
    fn test_persist_writes_raw_and_metadata() {
        let dir = tempdir().unwrap();
        let mut persister = RawPersister::new(dir.path().join("out")).unwrap();
        persister.persist(record(1, 0)).unwrap();

        let raw = persister.raw_path(6);
        assert!(raw.ends_with("006.raw"));
        assert_eq!(
            std::fs::metadata(&raw).unwrap().len(),
            expected_file_size([1, 2, 3, 4])
        );
        assert!(persister.metadata_path(6).exists());
        assert_eq!(persister.written(), 1);
    }

    #[test]
    fn test_read_back_matches_record() {
        let dir = tempdir().unwrap();
        let mut persister = RawPersister::new(dir.path()).unwrap();
        let original = record(6, 1);
        persister.persist(original.clone()).unwrap();

        let (meta, data) = read_record(dir.path(), 12).unwrap();
        assert_eq!(meta.lead_time, 12);
        assert_eq!(meta.step, 1);
        assert_eq!(meta.lead_times, vec![7, 8, 9, 10, 11, 12]);
        assert_eq!(meta.shape, [6, 2, 3, 4]);
        assert_eq!(meta.channel, vec!["z500".to_string(), "t2m".to_string()]);
        assert_eq!(meta.lat, vec![90.0, 0.0, -90.0]);
        assert_eq!(&data, original.data());
    }

    #[test]
    fn test_raw_content_layout() {
        let dir = tempdir().unwrap();
        let mut persister = RawPersister::new(dir.path()).unwrap();
        persister.persist(record(1, 0)).unwrap();

        let values = read_f32_le(&persister.raw_path(6), 24).unwrap();
        // Row-major: lon varies fastest, then lat, then channel.
        assert_eq!(values[0], 0.0);
        assert_eq!(values[1], 1.0);
        assert_eq!(values[4], 10.0);
        assert_eq!(values[12], 100.0);
    }

    #[test]
    fn test_read_rejects_truncated_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.raw");
        write_f32_le(&path, [1.0f32, 2.0].iter()).unwrap();

        let err = read_f32_le(&path, 3).unwrap_err();
        assert!(matches!(err, PersistError::Format(_)));
    }

    #[test]
    fn test_expected_file_size() {
        assert_eq!(expected_file_size([1, 70, 721, 1440]), 70 * 721 * 1440 * 4);
    }
}
