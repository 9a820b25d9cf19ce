//! Worker model
//!
//! One interchangeable worker with ergonomic state. All mutation goes
//! through the worker pool; task executors only ever see worker ids.
//!
//! Fatigue model: a task of load `L` and duration `d` adds `0.1 * L * d`
//! fatigue points (clamped to [0, 100]); a rest of `r` minutes removes
//! `2 * r` points (floored at 0) and resets the continuous-work counter.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerState {
    Idle,
    Working,
    Resting,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: String,
    pub state: WorkerState,
    /// Minutes worked since the last rest
    pub continuous_work_minutes: f64,
    pub total_work_time: f64,
    pub total_rest_time: f64,
    pub tasks_completed: u64,
    /// Fatigue points, 0..=100
    pub fatigue_level: f64,
    /// Number of completed tasks at or above the high-load threshold
    pub high_intensity_count: u64,
    /// (time, fatigue) samples taken at every state change
    pub fatigue_history: Vec<(f64, f64)>,
}

impl Worker {
    pub fn new(index: u32) -> Self {
        Self {
            id: format!("Worker_{:02}", index + 1),
            state: WorkerState::Idle,
            continuous_work_minutes: 0.0,
            total_work_time: 0.0,
            total_rest_time: 0.0,
            tasks_completed: 0,
            fatigue_level: 0.0,
            high_intensity_count: 0,
            fatigue_history: Vec::new(),
        }
    }

    /// Account for a finished work segment.
    pub fn record_work(&mut self, duration: f64, work_load: u8, high_load_threshold: u8, now: f64) {
        self.total_work_time += duration;
        self.continuous_work_minutes += duration;
        self.tasks_completed += 1;
        if work_load >= high_load_threshold {
            self.high_intensity_count += 1;
        }
        self.fatigue_level =
            (self.fatigue_level + 0.1 * f64::from(work_load) * duration).clamp(0.0, 100.0);
        self.fatigue_history.push((now, self.fatigue_level));
    }

    /// Account for a finished rest.
    pub fn record_rest(&mut self, duration: f64, now: f64) {
        self.total_rest_time += duration;
        self.continuous_work_minutes = 0.0;
        self.fatigue_level = (self.fatigue_level - 2.0 * duration).max(0.0);
        self.fatigue_history.push((now, self.fatigue_level));
    }

    pub fn is_idle(&self) -> bool {
        self.state == WorkerState::Idle
    }

    pub fn utilization(&self, sim_duration: f64) -> f64 {
        if sim_duration > 0.0 {
            self.total_work_time / sim_duration
        } else {
            0.0
        }
    }
}
