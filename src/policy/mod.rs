//! Rest policy
//!
//! Rest evaluation is factored behind a trait so the rest-disabled control
//! engine is a parameter of the run rather than a second engine. The pool
//! consults the policy once per worker, immediately after each release.

use crate::models::config::SimConfig;
use crate::models::worker::Worker;

/// Decides whether a worker rests after releasing a task.
pub trait RestPolicy {
    /// Rest duration in minutes, or `None` to keep the worker available.
    ///
    /// Called after the release has been accounted, so the worker's
    /// continuous-work counter already includes the finished segment.
    fn rest_after(&self, worker: &Worker, work_load: u8) -> Option<f64>;
}

/// The two-rule ergonomic policy.
///
/// Rule A (time-triggered): continuous work minutes at or above
/// `time_threshold` force a rest of `time_duration` minutes. Rule B
/// (load-triggered): a finished task with load at or above `load_threshold`
/// forces a rest of `load_duration` minutes. When both fire, the worker
/// rests once, for the longer of the two durations.
#[derive(Debug, Clone)]
pub struct ErgonomicRestPolicy {
    time_threshold: f64,
    time_duration: f64,
    load_threshold: u8,
    load_duration: f64,
}

impl ErgonomicRestPolicy {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            time_threshold: config.rest_time_threshold,
            time_duration: config.rest_duration_time,
            load_threshold: config.rest_load_threshold,
            load_duration: config.rest_duration_load,
        }
    }
}

impl RestPolicy for ErgonomicRestPolicy {
    fn rest_after(&self, worker: &Worker, work_load: u8) -> Option<f64> {
        let mut duration: Option<f64> = None;
        if worker.continuous_work_minutes >= self.time_threshold {
            duration = Some(self.time_duration);
        }
        if work_load >= self.load_threshold {
            duration = Some(duration.map_or(self.load_duration, |d| d.max(self.load_duration)));
        }
        duration.filter(|d| *d > 0.0)
    }
}

/// Control policy for the A/B comparison run: never rest.
#[derive(Debug, Clone, Default)]
pub struct NoRestPolicy;

impl RestPolicy for NoRestPolicy {
    fn rest_after(&self, _worker: &Worker, _work_load: u8) -> Option<f64> {
        None
    }
}
