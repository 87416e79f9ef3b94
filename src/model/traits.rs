//! Model trait and the named conditioning inputs it may declare.

use std::collections::BTreeMap;

use ndarray::{Array5, ArrayView5};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Declared input name of the 5-D state window every model receives.
pub const WINDOW_INPUT: &str = "input";

/// Conditioning inputs a model may declare besides the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeatureName {
    /// Zero-based step index.
    Step,
    /// Hour of the valid time as a fraction of the day.
    Hour,
    /// Clipped day of year of the valid time as a fraction of 365.
    DayOfYear,
    /// Periodic time embedding around the step.
    TimeEmbedding,
}

impl FeatureName {
    /// Returns all recognized conditioning inputs.
    pub fn all() -> [FeatureName; 4] {
        [
            FeatureName::Step,
            FeatureName::Hour,
            FeatureName::DayOfYear,
            FeatureName::TimeEmbedding,
        ]
    }

    /// Input name as declared by a model.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureName::Step => "step",
            FeatureName::Hour => "hour",
            FeatureName::DayOfYear => "doy",
            FeatureName::TimeEmbedding => "temb",
        }
    }

    /// Maps a declared input name to a feature, if recognized.
    pub fn from_input_name(name: &str) -> Option<Self> {
        Self::all().into_iter().find(|f| f.as_str() == name)
    }
}

/// Conditioning values passed alongside the window, keyed by feature.
///
/// Holds exactly the features a model declared; scalar features are stored
/// as one-element vectors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Features {
    values: BTreeMap<FeatureName, Vec<f32>>,
}

impl Features {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a feature, replacing any previous value.
    pub fn insert(&mut self, name: FeatureName, value: Vec<f32>) -> &mut Self {
        self.values.insert(name, value);
        self
    }

    pub fn get(&self, name: FeatureName) -> Option<&[f32]> {
        self.values.get(&name).map(Vec::as_slice)
    }

    /// Returns a scalar feature's single value.
    pub fn scalar(&self, name: FeatureName) -> Option<f32> {
        self.get(name).and_then(|v| v.first().copied())
    }

    pub fn contains(&self, name: FeatureName) -> bool {
        self.values.contains_key(&name)
    }

    pub fn names(&self) -> impl Iterator<Item = FeatureName> + '_ {
        self.values.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Errors reported by a model backend.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid input shape {0:?}: {1}")]
    InvalidInput(Vec<usize>, String),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A learned predictor or refiner.
///
/// A predictor maps the window `(1, history, channel, lat, lon)` to an output
/// `(1, history_out, channel, lat, lon)` whose slices advance the state. A
/// refiner receives that raw output as its window and returns the slices it
/// reconstructs. Calls block until the backend returns.
pub trait ForecastModel: Send + Sync {
    /// Human-readable name used in errors and logs.
    fn name(&self) -> &str;

    /// Declared input names: [`WINDOW_INPUT`] plus any conditioning features.
    fn input_names(&self) -> Vec<String>;

    /// Runs the model on one window.
    fn run(&self, window: ArrayView5<f32>, features: &Features) -> Result<Array5<f32>, ModelError>;
}
