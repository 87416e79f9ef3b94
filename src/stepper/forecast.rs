//! The forecast loop.

use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use ndarray::{Array5, ArrayView5, Axis, Slice};

use super::{ForecastError, ForecastState, StepperConfig, StepperStatus};
use crate::export::Persister;
use crate::grid::{Coordinates, InputWindow};
use crate::model::{FeatureName, Features, ForecastModel, WINDOW_INPUT};
use crate::output::OutputLabeler;
use crate::time::{day_of_year_fraction, hour_fraction, TemporalEncoder};

/// Outcome of one completed step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub step_index: usize,
    pub lead_time: u32,
    pub valid_time: NaiveDateTime,
    /// Lead labels of the persisted slices.
    pub lead_times: Vec<u32>,
    /// Time spent inside the predictor and refiner.
    pub model_time: Duration,
}

/// Totals for a finished run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub steps: usize,
    pub final_lead_time: u32,
    pub model_time: Duration,
}

/// Autoregressive stepper over a rolling two-state window.
///
/// Each step feeds the current window to the predictor, reports either the
/// configured nominal slice or the refiner's output, and replaces the window
/// with the predictor's raw output. Refined output never re-enters the window.
pub struct ForecastStepper {
    config: StepperConfig,
    predictor: Box<dyn ForecastModel>,
    refiner: Option<Box<dyn ForecastModel>>,
    features: Vec<FeatureName>,
    encoder: TemporalEncoder,
    labeler: OutputLabeler,
    anchor: NaiveDateTime,
    state: ForecastState,
    status: StepperStatus,
}

impl ForecastStepper {
    /// Validates the setup and the window, then readies the first step.
    ///
    /// Fails before any model call if the configuration is invalid, a model
    /// declares an input the stepper cannot supply, the window's two times are
    /// not one interval apart, latitude does not run from 90 to -90, or the
    /// run would step past the supported date range. The refiner is ignored
    /// unless `config.use_refiner` is set.
    pub fn new(
        config: StepperConfig,
        window: InputWindow,
        predictor: Box<dyn ForecastModel>,
        refiner: Option<Box<dyn ForecastModel>>,
    ) -> Result<Self, ForecastError> {
        let encoder = TemporalEncoder::with_offsets(config.interval_hours, config.embedding_offsets)?;
        if config.total_steps == 0 {
            return Err(ForecastError::NoSteps);
        }

        let refiner = if config.use_refiner {
            Some(refiner.ok_or(ForecastError::MissingRefiner)?)
        } else {
            None
        };

        let mut features = declared_features(predictor.as_ref())?;
        if let Some(refiner) = &refiner {
            for f in declared_features(refiner.as_ref())? {
                if !features.contains(&f) {
                    features.push(f);
                }
            }
        }

        window.validate(config.interval_hours)?;

        let anchor = window.anchor();
        let last_step = config.total_steps - 1;
        encoder.valid_time(anchor, last_step)?;
        if features.contains(&FeatureName::TimeEmbedding) {
            encoder.encode(anchor, last_step)?;
        }

        let (batch, coords) = window.into_batch();
        let labeler = OutputLabeler::new(coords, anchor, config.interval_hours);

        Ok(Self {
            config,
            predictor,
            refiner,
            features,
            encoder,
            labeler,
            anchor,
            state: ForecastState::new(batch),
            status: StepperStatus::Initialized,
        })
    }

    pub fn config(&self) -> &StepperConfig {
        &self.config
    }

    pub fn status(&self) -> StepperStatus {
        self.status
    }

    pub fn state(&self) -> &ForecastState {
        &self.state
    }

    /// Reference time of the run (newest input state).
    pub fn anchor(&self) -> NaiveDateTime {
        self.anchor
    }

    pub fn coords(&self) -> &Coordinates {
        self.labeler.coords()
    }

    /// Conditioning features supplied to the models each step.
    pub fn features(&self) -> &[FeatureName] {
        &self.features
    }

    pub fn remaining_steps(&self) -> usize {
        self.config.total_steps - self.state.step_index()
    }

    /// Runs one step and hands its record to `persister`.
    ///
    /// A step either completes fully (predict, label, persist, advance) or the
    /// stepper moves to [`StepperStatus::Failed`] with its window untouched.
    pub fn step<P: Persister + ?Sized>(&mut self, persister: &mut P) -> Result<StepReport, ForecastError> {
        if self.status.is_terminal() {
            return Err(ForecastError::NotSteppable(self.status));
        }

        match self.try_step(persister) {
            Ok(report) => {
                self.status = if self.state.step_index() == self.config.total_steps {
                    StepperStatus::Completed
                } else {
                    StepperStatus::Stepping
                };
                Ok(report)
            }
            Err(e) => {
                self.status = StepperStatus::Failed;
                Err(e)
            }
        }
    }

    /// Runs all remaining steps.
    pub fn run<P: Persister + ?Sized>(&mut self, persister: &mut P) -> Result<RunSummary, ForecastError> {
        self.run_with_callbacks(persister, |_| {})
    }

    /// Runs all remaining steps, calling `on_step` after each persisted record.
    pub fn run_with_callbacks<P, F>(
        &mut self,
        persister: &mut P,
        mut on_step: F,
    ) -> Result<RunSummary, ForecastError>
    where
        P: Persister + ?Sized,
        F: FnMut(&StepReport),
    {
        let mut summary = RunSummary::default();

        while !self.status.is_terminal() {
            let report = self.step(persister)?;
            summary.steps += 1;
            summary.final_lead_time = report.lead_time;
            summary.model_time += report.model_time;
            on_step(&report);
        }

        Ok(summary)
    }

    fn try_step<P: Persister + ?Sized>(&mut self, persister: &mut P) -> Result<StepReport, ForecastError> {
        let step = self.state.step_index();
        let interval = self.config.interval_hours;
        let lead_time = self.config.lead_time_after(step + 1);
        let valid_time = self.encoder.valid_time(self.anchor, step)?;
        let features = self.features_for(step, valid_time)?;
        let (c, h, w) = self.labeler.coords().shape();

        let started = Instant::now();
        let raw = run_model(self.predictor.as_ref(), self.state.current_window().view(), &features, step)?;
        check_output(self.predictor.as_ref(), &raw, 2, (c, h, w), step)?;

        let forecast = match &self.refiner {
            Some(refiner) => {
                let refined = run_model(refiner.as_ref(), raw.view(), &features, step)?;
                check_output(refiner.as_ref(), &refined, 1, (c, h, w), step)?;
                refined
            }
            None => {
                let i = self.config.forecast_slice.index(raw.len_of(Axis(1)));
                raw.slice_axis(Axis(1), Slice::from(i..i + 1)).to_owned()
            }
        };
        let model_time = started.elapsed();

        let record = self
            .labeler
            .label(forecast, step, lead_time, valid_time)
            .map_err(|source| ForecastError::Label { step, source })?;

        let report = StepReport {
            step_index: step,
            lead_time,
            valid_time,
            lead_times: record.lead_times().to_vec(),
            model_time,
        };

        persister
            .persist(record)
            .map_err(|source| ForecastError::Persist { step, source })?;

        self.state.advance(raw, interval);
        Ok(report)
    }

    fn features_for(&self, step: usize, valid_time: NaiveDateTime) -> Result<Features, ForecastError> {
        let mut features = Features::new();
        for &name in &self.features {
            let value = match name {
                FeatureName::Step => vec![step as f32],
                FeatureName::Hour => vec![hour_fraction(valid_time)],
                FeatureName::DayOfYear => vec![day_of_year_fraction(valid_time)],
                FeatureName::TimeEmbedding => self.encoder.encode(self.anchor, step)?,
            };
            features.insert(name, value);
        }
        Ok(features)
    }
}

/// Conditioning features a model declares, rejecting names we cannot supply.
fn declared_features(model: &dyn ForecastModel) -> Result<Vec<FeatureName>, ForecastError> {
    let mut out = Vec::new();
    for name in model.input_names() {
        if name == WINDOW_INPUT {
            continue;
        }
        let feature = FeatureName::from_input_name(&name).ok_or_else(|| ForecastError::UnsupportedInput {
            model: model.name().to_string(),
            input: name.clone(),
        })?;
        if !out.contains(&feature) {
            out.push(feature);
        }
    }
    Ok(out)
}

fn run_model(
    model: &dyn ForecastModel,
    window: ArrayView5<f32>,
    features: &Features,
    step: usize,
) -> Result<Array5<f32>, ForecastError> {
    model.run(window, features).map_err(|source| ForecastError::Model {
        model: model.name().to_string(),
        step,
        source,
    })
}

/// Output must be `(1, >= min_history, channel, lat, lon)`.
fn check_output(
    model: &dyn ForecastModel,
    output: &Array5<f32>,
    min_history: usize,
    (c, h, w): (usize, usize, usize),
    step: usize,
) -> Result<(), ForecastError> {
    let s = output.shape();
    if s[0] != 1 || s[1] < min_history || s[2] != c || s[3] != h || s[4] != w {
        return Err(ForecastError::OutputShape {
            model: model.name().to_string(),
            step,
            expected: format!("(1, >={}, {}, {}, {})", min_history, c, h, w),
            actual: s.to_vec(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{MemoryPersister, PersistError};
    use crate::model::{ModelError, Persistence};
    use crate::output::ForecastRecord;
    use crate::stepper::ErrorKind;
    use chrono::{Duration, NaiveDate};
    use ndarray::{s, Array4};
    use std::sync::{Arc, Mutex};

    type Calls = Arc<Mutex<Vec<(Array5<f32>, Features)>>>;

    /// Adds one to every value and records what it was called with.
    struct Recording {
        inputs: Vec<String>,
        calls: Calls,
    }

    impl Recording {
        fn new(inputs: &[&str]) -> (Self, Calls) {
            let calls = Calls::default();
            let model = Self {
                inputs: inputs.iter().map(|s| s.to_string()).collect(),
                calls: Arc::clone(&calls),
            };
            (model, calls)
        }
    }

    impl ForecastModel for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        fn input_names(&self) -> Vec<String> {
            self.inputs.clone()
        }

        fn run(&self, window: ArrayView5<f32>, features: &Features) -> Result<Array5<f32>, ModelError> {
            self.calls.lock().unwrap().push((window.to_owned(), features.clone()));
            Ok(window.mapv(|v| v + 1.0))
        }
    }

    /// Returns a constant marker grid with one slice.
    struct MarkerRefiner {
        calls: Calls,
    }

    impl ForecastModel for MarkerRefiner {
        fn name(&self) -> &str {
            "marker"
        }

        fn input_names(&self) -> Vec<String> {
            vec!["input".into(), "step".into()]
        }

        fn run(&self, window: ArrayView5<f32>, features: &Features) -> Result<Array5<f32>, ModelError> {
            self.calls.lock().unwrap().push((window.to_owned(), features.clone()));
            let (_, _, c, h, w) = window.dim();
            Ok(Array5::from_elem((1, 1, c, h, w), -100.0))
        }
    }

    /// Passes its window through until step `from`, then breaks: either an
    /// error or a grid with a single lon column.
    struct Faulty {
        from: usize,
        wrong_shape: bool,
    }

    impl ForecastModel for Faulty {
        fn name(&self) -> &str {
            "faulty"
        }

        fn input_names(&self) -> Vec<String> {
            vec!["input".into(), "step".into()]
        }

        fn run(&self, window: ArrayView5<f32>, features: &Features) -> Result<Array5<f32>, ModelError> {
            let step = features.scalar(FeatureName::Step).unwrap_or(0.0) as usize;
            if step < self.from {
                Ok(window.to_owned())
            } else if self.wrong_shape {
                Ok(window.slice(s![.., .., .., .., 0..1]).to_owned())
            } else {
                Err(ModelError::Backend("device lost".into()))
            }
        }
    }

    struct FailingPersister;

    impl Persister for FailingPersister {
        fn persist(&mut self, _record: ForecastRecord) -> Result<(), PersistError> {
            Err(PersistError::Format("disk full".into()))
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    fn window_at(times: [NaiveDateTime; 2], lat: Vec<f64>) -> InputWindow {
        let coords = Coordinates::new(
            vec!["z500".into(), "t850".into()],
            lat,
            vec![0.0, 90.0, 180.0, 270.0],
        );
        let n_lat = coords.n_lat();
        let data = Array4::from_shape_fn((2, 2, n_lat, 4), |(t, c, h, w)| {
            (t * 1000 + c * 100 + h * 10 + w) as f32
        });
        InputWindow::new(data, times, coords).unwrap()
    }

    fn window() -> InputWindow {
        window_at([at(2022, 12, 31, 18), at(2023, 1, 1, 0)], vec![90.0, 0.0, -90.0])
    }

    #[test]
    fn test_three_steps_emit_labeled_records() {
        let (predictor, _) = Recording::new(&["input"]);
        let mut stepper =
            ForecastStepper::new(StepperConfig::with_steps(3), window(), Box::new(predictor), None).unwrap();
        assert_eq!(stepper.status(), StepperStatus::Initialized);

        let mut persister = MemoryPersister::new();
        let summary = stepper.run(&mut persister).unwrap();

        assert_eq!(summary.steps, 3);
        assert_eq!(summary.final_lead_time, 18);
        assert_eq!(stepper.status(), StepperStatus::Completed);
        assert_eq!(stepper.state().elapsed_lead_time(), 18);
        assert_eq!(stepper.remaining_steps(), 0);

        let records = persister.records();
        let leads: Vec<u32> = records.iter().map(|r| r.lead_time()).collect();
        assert_eq!(leads, vec![6, 12, 18]);
        let valid: Vec<NaiveDateTime> = records.iter().map(|r| r.valid_time()).collect();
        assert_eq!(valid, vec![at(2023, 1, 1, 0), at(2023, 1, 1, 6), at(2023, 1, 1, 12)]);

        for record in records {
            assert_eq!(record.init_time(), at(2023, 1, 1, 0));
            assert_eq!(record.lead_times(), &[record.lead_time()]);
            assert_eq!(record.channel(), &["z500".to_string(), "t850".to_string()]);
            assert_eq!(record.lat(), &[90.0, 0.0, -90.0]);
            assert_eq!(record.lon(), &[0.0, 90.0, 180.0, 270.0]);
            assert_eq!(record.data().shape(), &[1, 2, 3, 4]);
        }
    }

    #[test]
    fn test_reports_penultimate_slice_by_default() {
        let (predictor, _) = Recording::new(&["input"]);
        let original = window().data().clone();
        let mut stepper =
            ForecastStepper::new(StepperConfig::with_steps(1), window(), Box::new(predictor), None).unwrap();
        let mut persister = MemoryPersister::new();
        stepper.run(&mut persister).unwrap();

        let reported = persister.records()[0].data().index_axis(Axis(0), 0).to_owned();
        assert_eq!(reported, original.index_axis(Axis(0), 0).mapv(|v| v + 1.0));
    }

    #[test]
    fn test_reports_last_slice_when_configured() {
        let (predictor, _) = Recording::new(&["input"]);
        let original = window().data().clone();
        let mut config = StepperConfig::with_steps(1);
        config.forecast_slice = crate::stepper::ForecastSlice::Last;
        let mut stepper = ForecastStepper::new(config, window(), Box::new(predictor), None).unwrap();
        let mut persister = MemoryPersister::new();
        stepper.run(&mut persister).unwrap();

        let reported = persister.records()[0].data().index_axis(Axis(0), 0).to_owned();
        assert_eq!(reported, original.index_axis(Axis(0), 1).mapv(|v| v + 1.0));
    }

    #[test]
    fn test_refined_output_never_feeds_back() {
        let (predictor, predictor_calls) = Recording::new(&["input", "step"]);
        let refiner_calls = Calls::default();
        let refiner = MarkerRefiner {
            calls: Arc::clone(&refiner_calls),
        };

        let mut config = StepperConfig::with_steps(4);
        config.use_refiner = true;
        let mut stepper =
            ForecastStepper::new(config, window(), Box::new(predictor), Some(Box::new(refiner))).unwrap();
        let mut persister = MemoryPersister::new();
        stepper.run(&mut persister).unwrap();

        let predictor_calls = predictor_calls.lock().unwrap();
        let refiner_calls = refiner_calls.lock().unwrap();
        assert_eq!(predictor_calls.len(), 4);
        assert_eq!(refiner_calls.len(), 4);

        for k in 0..3 {
            // The refiner saw the raw output of step k; the predictor sees it again at k+1.
            assert_eq!(predictor_calls[k + 1].0, refiner_calls[k].0);
            assert_eq!(predictor_calls[k + 1].0, predictor_calls[k].0.mapv(|v| v + 1.0));
            assert!(predictor_calls[k + 1].0.iter().all(|&v| v != -100.0));
            // Both models receive the same conditioning.
            assert_eq!(predictor_calls[k].1, refiner_calls[k].1);
        }

        for record in persister.records() {
            assert!(record.data().iter().all(|&v| v == -100.0));
        }
    }

    #[test]
    fn test_declared_features_are_supplied() {
        let (predictor, calls) = Recording::new(&["input", "step", "hour", "doy", "temb"]);
        let mut stepper =
            ForecastStepper::new(StepperConfig::with_steps(2), window(), Box::new(predictor), None).unwrap();
        stepper.run(&mut MemoryPersister::new()).unwrap();

        let calls = calls.lock().unwrap();
        let second = &calls[1].1;
        assert_eq!(second.scalar(FeatureName::Step), Some(1.0));
        assert_eq!(second.scalar(FeatureName::Hour), Some(0.25));
        assert_eq!(second.scalar(FeatureName::DayOfYear), Some(1.0 / 365.0));
        assert_eq!(
            second.get(FeatureName::TimeEmbedding).map(|t| t.to_vec()),
            Some(crate::time::time_embedding(at(2023, 1, 1, 0), 1, 6).unwrap())
        );
    }

    #[test]
    fn test_undeclared_features_are_not_supplied() {
        let (predictor, calls) = Recording::new(&["input", "hour"]);
        let mut stepper =
            ForecastStepper::new(StepperConfig::with_steps(1), window(), Box::new(predictor), None).unwrap();
        assert_eq!(stepper.features(), &[FeatureName::Hour]);
        stepper.run(&mut MemoryPersister::new()).unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0].1.names().collect::<Vec<_>>(), vec![FeatureName::Hour]);
    }

    #[test]
    fn test_identity_predictor_keeps_window() {
        let original = window().data().clone().insert_axis(Axis(0));
        let mut stepper =
            ForecastStepper::new(StepperConfig::with_steps(5), window(), Box::new(Persistence), None).unwrap();

        let mut persister = MemoryPersister::new();
        let mut leads = Vec::new();
        for _ in 0..5 {
            let report = stepper.step(&mut persister).unwrap();
            assert_eq!(stepper.state().current_window(), &original);
            leads.push(report.lead_time);
        }
        assert_eq!(leads, vec![6, 12, 18, 24, 30]);
        assert_eq!(stepper.state().elapsed_lead_time(), 30);
    }

    #[test]
    fn test_reversed_latitude_fails_before_any_step() {
        let (predictor, calls) = Recording::new(&["input"]);
        let w = window_at([at(2022, 12, 31, 18), at(2023, 1, 1, 0)], vec![-90.0, 0.0, 90.0]);
        let err = ForecastStepper::new(StepperConfig::with_steps(3), w, Box::new(predictor), None)
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_wrong_spacing_fails_before_any_step() {
        let (predictor, calls) = Recording::new(&["input"]);
        let w = window_at([at(2022, 12, 31, 12), at(2023, 1, 1, 0)], vec![90.0, 0.0, -90.0]);
        let err = ForecastStepper::new(StepperConfig::with_steps(3), w, Box::new(predictor), None)
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_configuration_errors() {
        let (predictor, _) = Recording::new(&["input", "pressure_level"]);
        let err = ForecastStepper::new(StepperConfig::with_steps(1), window(), Box::new(predictor), None)
            .err()
            .unwrap();
        assert!(matches!(err, ForecastError::UnsupportedInput { ref input, .. } if input == "pressure_level"));
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let mut config = StepperConfig::with_steps(1);
        config.use_refiner = true;
        let err = ForecastStepper::new(config, window(), Box::new(Persistence), None).err().unwrap();
        assert!(matches!(err, ForecastError::MissingRefiner));

        let mut config = StepperConfig::with_steps(1);
        config.interval_hours = 0;
        let err = ForecastStepper::new(config, window(), Box::new(Persistence), None).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = ForecastStepper::new(StepperConfig::with_steps(0), window(), Box::new(Persistence), None)
            .err()
            .unwrap();
        assert!(matches!(err, ForecastError::NoSteps));
    }

    #[test]
    fn test_bad_output_shape_aborts_run() {
        let mut stepper = ForecastStepper::new(
            StepperConfig::with_steps(4),
            window(),
            Box::new(Faulty {
                from: 2,
                wrong_shape: true,
            }),
            None,
        )
        .unwrap();

        let mut persister = MemoryPersister::new();
        let err = stepper.run(&mut persister).unwrap_err();

        assert!(matches!(err, ForecastError::OutputShape { step: 2, .. }));
        assert_eq!(err.kind(), ErrorKind::Collaborator);
        assert_eq!(stepper.status(), StepperStatus::Failed);
        assert_eq!(persister.len(), 2);
        assert_eq!(stepper.state().step_index(), 2);

        let err = stepper.step(&mut persister).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(persister.len(), 2);
    }

    fn refined(steps: usize) -> StepperConfig {
        let mut config = StepperConfig::with_steps(steps);
        config.use_refiner = true;
        config
    }

    #[test]
    fn test_predictor_error_aborts_run() {
        let predictor = Faulty {
            from: 1,
            wrong_shape: false,
        };
        let mut stepper =
            ForecastStepper::new(StepperConfig::with_steps(3), window(), Box::new(predictor), None).unwrap();

        let mut persister = MemoryPersister::new();
        let err = stepper.run(&mut persister).unwrap_err();

        assert!(matches!(err, ForecastError::Model { ref model, step: 1, .. } if model == "faulty"));
        assert_eq!(err.kind(), ErrorKind::Collaborator);
        assert_eq!(stepper.status(), StepperStatus::Failed);
        assert_eq!(persister.len(), 1);
        assert_eq!(persister.records()[0].lead_time(), 6);
        assert_eq!(stepper.state().step_index(), 1);
    }

    #[test]
    fn test_refiner_error_aborts_run() {
        let refiner = Faulty {
            from: 1,
            wrong_shape: false,
        };
        let mut stepper =
            ForecastStepper::new(refined(3), window(), Box::new(Persistence), Some(Box::new(refiner))).unwrap();

        let mut persister = MemoryPersister::new();
        let err = stepper.run(&mut persister).unwrap_err();

        assert!(matches!(err, ForecastError::Model { ref model, step: 1, .. } if model == "faulty"));
        assert_eq!(err.kind(), ErrorKind::Collaborator);
        assert_eq!(stepper.status(), StepperStatus::Failed);
        assert_eq!(persister.len(), 1);
        // Two pass-through slices over a 6 h step.
        assert_eq!(persister.records()[0].lead_times(), &[3, 6]);
        assert_eq!(stepper.state().step_index(), 1);
    }

    #[test]
    fn test_refiner_bad_shape_aborts_run() {
        let refiner = Faulty {
            from: 2,
            wrong_shape: true,
        };
        let mut stepper =
            ForecastStepper::new(refined(4), window(), Box::new(Persistence), Some(Box::new(refiner))).unwrap();

        let mut persister = MemoryPersister::new();
        let err = stepper.run(&mut persister).unwrap_err();

        assert!(matches!(err, ForecastError::OutputShape { ref model, step: 2, .. } if model == "faulty"));
        assert_eq!(err.kind(), ErrorKind::Collaborator);
        assert_eq!(stepper.status(), StepperStatus::Failed);
        assert_eq!(persister.len(), 2);
        assert_eq!(stepper.state().step_index(), 2);
    }

    #[test]
    fn test_refiner_with_unknown_input_is_rejected() {
        let (predictor, calls) = Recording::new(&["input"]);
        let (refiner, _) = Recording::new(&["input", "land_mask"]);
        let err = ForecastStepper::new(refined(2), window(), Box::new(predictor), Some(Box::new(refiner)))
            .err()
            .unwrap();

        assert!(matches!(err, ForecastError::UnsupportedInput { ref input, .. } if input == "land_mask"));
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_end_of_date_range_fails_before_any_step() {
        let last = NaiveDateTime::MAX - Duration::hours(1);
        let times = [last - Duration::hours(6), last];

        let (predictor, calls) = Recording::new(&["input", "temb"]);
        let w = window_at(times, vec![90.0, 0.0, -90.0]);
        let err = ForecastStepper::new(StepperConfig::with_steps(2), w, Box::new(predictor), None)
            .err()
            .unwrap();
        assert!(matches!(err, ForecastError::Encoding(_)));
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert!(calls.lock().unwrap().is_empty());

        // A single step without an embedding stays in range.
        let w = window_at(times, vec![90.0, 0.0, -90.0]);
        let mut stepper =
            ForecastStepper::new(StepperConfig::with_steps(1), w, Box::new(Persistence), None).unwrap();
        let mut persister = MemoryPersister::new();
        stepper.run(&mut persister).unwrap();
        assert_eq!(persister.records()[0].valid_time(), last);
    }

    #[test]
    fn test_persist_failure_leaves_window_in_place() {
        let original = window().data().clone().insert_axis(Axis(0));
        let (predictor, _) = Recording::new(&["input"]);
        let mut stepper =
            ForecastStepper::new(StepperConfig::with_steps(2), window(), Box::new(predictor), None).unwrap();

        let err = stepper.step(&mut FailingPersister).unwrap_err();
        assert!(matches!(err, ForecastError::Persist { step: 0, .. }));
        assert_eq!(stepper.status(), StepperStatus::Failed);
        assert_eq!(stepper.state().step_index(), 0);
        assert_eq!(stepper.state().current_window(), &original);
    }

    #[test]
    fn test_completed_stepper_refuses_more_steps() {
        let mut stepper =
            ForecastStepper::new(StepperConfig::with_steps(1), window(), Box::new(Persistence), None).unwrap();
        let mut persister = MemoryPersister::new();
        stepper.step(&mut persister).unwrap();
        assert_eq!(stepper.status(), StepperStatus::Completed);

        let err = stepper.step(&mut persister).unwrap_err();
        assert!(matches!(err, ForecastError::NotSteppable(StepperStatus::Completed)));
        assert_eq!(persister.len(), 1);
    }

    #[test]
    fn test_callbacks_follow_step_order() {
        let mut stepper =
            ForecastStepper::new(StepperConfig::with_steps(3), window(), Box::new(Persistence), None).unwrap();
        let mut seen = Vec::new();
        stepper
            .run_with_callbacks(&mut MemoryPersister::new(), |report| {
                seen.push((report.step_index, report.lead_time));
            })
            .unwrap();
        assert_eq!(seen, vec![(0, 6), (1, 12), (2, 18)]);
    }
}
