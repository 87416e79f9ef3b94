//! Run driver: wires a window source, models, stepper and persister together.
//!
//! All progress reporting for a run happens here; the stepper itself stays
//! silent and only reports back through callbacks.

use std::path::PathBuf;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::export::{PersistError, Persister, RawPersister};
use crate::input::{RawWindowSource, SourceError, WindowMetadata, WindowSource};
use crate::model::{ForecastModel, LinearInterp, Persistence};
use crate::stepper::{ForecastError, ForecastStepper, RunSummary, StepperConfig};

/// Errors that end a driver run.
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Loading input failed: {0}")]
    Source(#[from] SourceError),
    #[error("Preparing output failed: {0}")]
    Persist(#[from] PersistError),
    #[error("Forecast failed: {0}")]
    Forecast(#[from] ForecastError),
}

/// Everything a forecast run needs, built once from the command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Directory holding `input.raw` and `input.json`.
    pub data_dir: PathBuf,
    /// Directory receiving one `.raw`/`.json` pair per step.
    pub save_dir: PathBuf,
    /// Sub-steps reconstructed by the interpolating refiner.
    pub interp_steps: usize,
    pub stepper: StepperConfig,
}

impl RunConfig {
    pub fn new(data_dir: impl Into<PathBuf>, save_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            save_dir: save_dir.into(),
            interp_steps: 6,
            stepper: StepperConfig::default(),
        }
    }
}

/// Runs a forecast with the built-in reference models.
///
/// Loads the window from `data_dir`, steps it with [`Persistence`] and, when
/// refinement is enabled, [`LinearInterp`], writing records to `save_dir`.
pub fn run(config: &RunConfig) -> Result<RunSummary, DriverError> {
    let source = RawWindowSource::new(&config.data_dir);

    let predictor: Box<dyn ForecastModel> = Box::new(Persistence);
    let refiner: Option<Box<dyn ForecastModel>> = if config.stepper.use_refiner {
        Some(Box::new(LinearInterp::new(config.interp_steps)) as Box<dyn ForecastModel>)
    } else {
        None
    };

    let mut persister = RawPersister::new(&config.save_dir)?;
    let summary = run_forecast(&config.stepper, &source, predictor, refiner, &mut persister)?;
    info!(
        written = persister.written(),
        dir = %persister.dir().display(),
        "Forecast saved"
    );
    Ok(summary)
}

/// Runs a forecast with arbitrary models and persister, logging each step.
pub fn run_forecast<S, P>(
    config: &StepperConfig,
    source: &S,
    predictor: Box<dyn ForecastModel>,
    refiner: Option<Box<dyn ForecastModel>>,
    persister: &mut P,
) -> Result<RunSummary, DriverError>
where
    S: WindowSource + ?Sized,
    P: Persister + ?Sized,
{
    info!(
        predictor = predictor.name(),
        refiner = refiner.as_ref().map(|r| r.name()).unwrap_or("none"),
        "Models ready"
    );

    let window = source.load()?;
    let (c, h, w) = window.coords().shape();
    info!(channels = c, lat = h, lon = w, "Loaded input window");

    let mut stepper = ForecastStepper::new(config.clone(), window, predictor, refiner)?;
    info!(
        "Inference initial time: {} ...",
        stepper.anchor().format("%Y%m%d%H")
    );
    debug!(features = ?stepper.features(), "Conditioning features");

    let start = Instant::now();
    let summary = stepper.run_with_callbacks(persister, |report| {
        info!(
            "lead_time: {:03} h, run_time: {:.3} secs",
            report.lead_time,
            report.model_time.as_secs_f64()
        );
    })?;
    info!("Inference done take {:.2}", start.elapsed().as_secs_f64());

    Ok(summary)
}

/// Reads the window metadata under `data_dir` without loading the grid.
pub fn inspect(data_dir: &std::path::Path) -> Result<WindowMetadata, DriverError> {
    Ok(RawWindowSource::new(data_dir).metadata()?)
}
