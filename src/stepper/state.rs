//! Mutable state of a forecast run.

use ndarray::Array5;

/// Lifecycle of a [`ForecastStepper`](super::ForecastStepper).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepperStatus {
    /// Window set, no step taken yet.
    Initialized,
    /// At least one step taken, more remaining.
    Stepping,
    /// All configured steps emitted.
    Completed,
    /// A step failed; the run is over.
    Failed,
}

impl StepperStatus {
    /// True once no further step may run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepperStatus::Completed | StepperStatus::Failed)
    }
}

/// Rolling window and counters, owned by the stepper alone.
#[derive(Debug, Clone)]
pub struct ForecastState {
    current_window: Array5<f32>,
    step_index: usize,
    elapsed_lead_time: u32,
}

impl ForecastState {
    pub(crate) fn new(window: Array5<f32>) -> Self {
        Self {
            current_window: window,
            step_index: 0,
            elapsed_lead_time: 0,
        }
    }

    /// Window `(1, history, channel, lat, lon)` fed to the next prediction.
    pub fn current_window(&self) -> &Array5<f32> {
        &self.current_window
    }

    /// Index of the next step to run.
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    /// Hours covered by the steps completed so far.
    pub fn elapsed_lead_time(&self) -> u32 {
        self.elapsed_lead_time
    }

    /// Replaces the window with a step's raw output and moves one interval on.
    pub(crate) fn advance(&mut self, next_window: Array5<f32>, interval_hours: u32) {
        self.current_window = next_window;
        self.step_index += 1;
        self.elapsed_lead_time += interval_hours;
    }
}
