//! Run configuration
//!
//! All knobs for one simulation run: shift pattern, workforce size,
//! equipment capacities, rest policy thresholds, production target and the
//! RNG seed. Immutable once the run starts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::orchestrator::SimulationError;

/// Complete configuration for one run.
///
/// `critical_equipment` uses a `BTreeMap` so that iteration order (and with
/// it every derived statistic) is independent of insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Working hours per day, 1..=24
    #[serde(default = "default_work_hours")]
    pub work_hours_per_day: u32,

    /// Working days per month, 1..=31
    #[serde(default = "default_work_days")]
    pub work_days_per_month: u32,

    /// Number of interchangeable workers, >= 1
    #[serde(default = "default_num_workers")]
    pub num_workers: u32,

    /// Target number of finished units
    #[serde(default = "default_target_output")]
    pub target_output: u32,

    /// Equipment capacities; names not listed here are unlimited
    #[serde(default)]
    pub critical_equipment: BTreeMap<String, u32>,

    /// Rule A: continuous work minutes that force a rest
    #[serde(default = "default_rest_time_threshold")]
    pub rest_time_threshold: f64,

    /// Rule A rest duration, minutes
    #[serde(default = "default_rest_duration_time")]
    pub rest_duration_time: f64,

    /// Rule B: load score at or above which a task forces a rest, 1..=10
    #[serde(default = "default_rest_load_threshold")]
    pub rest_load_threshold: u8,

    /// Rule B rest duration, minutes
    #[serde(default = "default_rest_duration_load")]
    pub rest_duration_load: f64,

    /// Admit multiple overlapping units when true
    #[serde(default = "default_pipeline_mode")]
    pub pipeline_mode: bool,

    /// RNG seed; `None` draws a seed from the wall clock
    #[serde(default)]
    pub random_seed: Option<u64>,
}

fn default_work_hours() -> u32 {
    8
}

fn default_work_days() -> u32 {
    22
}

fn default_num_workers() -> u32 {
    6
}

fn default_target_output() -> u32 {
    3
}

fn default_rest_time_threshold() -> f64 {
    50.0
}

fn default_rest_duration_time() -> f64 {
    5.0
}

fn default_rest_load_threshold() -> u8 {
    7
}

fn default_rest_duration_load() -> f64 {
    3.0
}

fn default_pipeline_mode() -> bool {
    true
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            work_hours_per_day: default_work_hours(),
            work_days_per_month: default_work_days(),
            num_workers: default_num_workers(),
            target_output: default_target_output(),
            critical_equipment: BTreeMap::new(),
            rest_time_threshold: default_rest_time_threshold(),
            rest_duration_time: default_rest_duration_time(),
            rest_load_threshold: default_rest_load_threshold(),
            rest_duration_load: default_rest_duration_load(),
            pipeline_mode: default_pipeline_mode(),
            random_seed: None,
        }
    }
}

impl SimConfig {
    /// Validate every range constraint.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !(1..=24).contains(&self.work_hours_per_day) {
            return Err(SimulationError::InvalidConfig(format!(
                "work_hours_per_day must be in 1..=24, got {}",
                self.work_hours_per_day
            )));
        }
        if !(1..=31).contains(&self.work_days_per_month) {
            return Err(SimulationError::InvalidConfig(format!(
                "work_days_per_month must be in 1..=31, got {}",
                self.work_days_per_month
            )));
        }
        if self.num_workers < 1 {
            return Err(SimulationError::InvalidConfig(
                "num_workers must be >= 1".to_string(),
            ));
        }
        if self.target_output < 1 {
            return Err(SimulationError::InvalidConfig(
                "target_output must be >= 1".to_string(),
            ));
        }
        if self.rest_time_threshold < 1.0 {
            return Err(SimulationError::InvalidConfig(format!(
                "rest_time_threshold must be >= 1 minute, got {}",
                self.rest_time_threshold
            )));
        }
        if self.rest_duration_time < 0.0 {
            return Err(SimulationError::InvalidConfig(
                "rest_duration_time must be >= 0".to_string(),
            ));
        }
        if !(1..=10).contains(&self.rest_load_threshold) {
            return Err(SimulationError::InvalidConfig(format!(
                "rest_load_threshold must be in 1..=10, got {}",
                self.rest_load_threshold
            )));
        }
        if self.rest_duration_load < 0.0 {
            return Err(SimulationError::InvalidConfig(
                "rest_duration_load must be >= 0".to_string(),
            ));
        }
        for (name, capacity) in &self.critical_equipment {
            if *capacity < 1 {
                return Err(SimulationError::InvalidConfig(format!(
                    "equipment '{}' capacity must be >= 1, got {}",
                    name, capacity
                )));
            }
        }
        Ok(())
    }
}
