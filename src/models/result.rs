//! Simulation results
//!
//! The record handed back to callers: headline production figures,
//! per-resource utilization, quality and human-factors aggregates, the full
//! sorted timeline, and the time mapping for Gantt rendering.

use serde::{Deserialize, Serialize};

use crate::core::time::TimeMapping;
use crate::models::config::SimConfig;
use crate::models::event::TimelineEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationStatus {
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "FAILED")]
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceKind {
    #[serde(rename = "WORKER")]
    Worker,
    #[serde(rename = "EQUIPMENT")]
    Equipment,
}

/// Usage statistics for one worker or one equipment type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceUtilization {
    pub resource_id: String,
    pub resource_type: ResourceKind,
    pub total_time: f64,
    pub work_time: f64,
    #[serde(default)]
    pub rest_time: f64,
    #[serde(default)]
    pub idle_time: f64,
    pub utilization_rate: f64,
    #[serde(default)]
    pub tasks_completed: u64,
    /// Final fatigue level; workers only
    #[serde(default)]
    pub fatigue_level: f64,
    /// High-load task exposures; workers only
    #[serde(default)]
    pub high_intensity_count: u64,
    /// (time, fatigue) samples; workers only
    #[serde(default)]
    pub fatigue_history: Vec<(f64, f64)>,
}

/// Rework figures over the whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityStats {
    /// Measurement executions: first passes plus rework segments
    pub total_inspections: u64,
    pub total_reworks: u64,
    /// Per-engine share of measurement steps with no rework, averaged
    pub first_pass_rate: f64,
    pub rework_time_total: f64,
}

impl Default for QualityStats {
    fn default() -> Self {
        Self {
            total_inspections: 0,
            total_reworks: 0,
            first_pass_rate: 1.0,
            rework_time_total: 0.0,
        }
    }
}

/// Ergonomics aggregates over the workforce.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HumanFactorsStats {
    pub total_rest_time: f64,
    pub avg_fatigue_level: f64,
    pub max_fatigue_level: f64,
    pub total_high_intensity_exposure: u64,
    pub rest_events_count: u64,
}

/// Headline figures of a rest-disabled control run, attached to the main
/// result for A/B comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoRestComparison {
    pub engines_completed: u32,
    pub avg_cycle_time: f64,
    pub sim_duration: f64,
    pub avg_worker_utilization: f64,
    pub first_pass_rate: f64,
}

/// Complete outcome of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimResult {
    pub sim_id: String,
    pub status: SimulationStatus,
    pub config: SimConfig,
    /// Final clock value in minutes, bounded by the shift deadline
    pub sim_duration: f64,
    pub engines_completed: u32,
    /// engines_completed / target_output
    pub target_achievement_rate: f64,
    /// Mean completion-minus-start over finished units; 0 when none finished
    pub avg_cycle_time: f64,
    pub worker_stats: Vec<ResourceUtilization>,
    pub equipment_stats: Vec<ResourceUtilization>,
    pub quality_stats: QualityStats,
    pub human_factors_stats: HumanFactorsStats,
    /// Closed events sorted by (start_time, engine_id)
    pub events: Vec<TimelineEvent>,
    pub time_mapping: TimeMapping,
    pub created_at: String,
    #[serde(default)]
    pub completed_at: Option<String>,
    /// Validation message on the FAILED path
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub no_rest_comparison: Option<NoRestComparison>,
}

impl SimResult {
    pub fn avg_worker_utilization(&self) -> f64 {
        average(self.worker_stats.iter().map(|s| s.utilization_rate))
    }

    pub fn avg_equipment_utilization(&self) -> f64 {
        average(self.equipment_stats.iter().map(|s| s.utilization_rate))
    }

    pub fn worker_stat(&self, worker_id: &str) -> Option<&ResourceUtilization> {
        self.worker_stats.iter().find(|s| s.resource_id == worker_id)
    }

    pub fn equipment_stat(&self, name: &str) -> Option<&ResourceUtilization> {
        self.equipment_stats.iter().find(|s| s.resource_id == name)
    }
}

fn average(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    if count > 0 {
        sum / count as f64
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::ShiftCalendar;

    fn empty_result() -> SimResult {
        SimResult {
            sim_id: "test".to_string(),
            status: SimulationStatus::Completed,
            config: SimConfig::default(),
            sim_duration: 0.0,
            engines_completed: 0,
            target_achievement_rate: 0.0,
            avg_cycle_time: 0.0,
            worker_stats: vec![],
            equipment_stats: vec![],
            quality_stats: QualityStats::default(),
            human_factors_stats: HumanFactorsStats::default(),
            events: vec![],
            time_mapping: ShiftCalendar::new(8, 22).time_mapping(),
            created_at: String::new(),
            completed_at: None,
            error: None,
            no_rest_comparison: None,
        }
    }

    #[test]
    fn test_averages_of_empty_stats_are_zero() {
        let result = empty_result();
        assert_eq!(result.avg_worker_utilization(), 0.0);
        assert_eq!(result.avg_equipment_utilization(), 0.0);
    }

    #[test]
    fn test_avg_worker_utilization() {
        let mut result = empty_result();
        for (id, rate) in [("Worker_01", 0.5), ("Worker_02", 0.7)] {
            result.worker_stats.push(ResourceUtilization {
                resource_id: id.to_string(),
                resource_type: ResourceKind::Worker,
                total_time: 100.0,
                work_time: rate * 100.0,
                rest_time: 0.0,
                idle_time: 0.0,
                utilization_rate: rate,
                tasks_completed: 1,
                fatigue_level: 0.0,
                high_intensity_count: 0,
                fatigue_history: vec![],
            });
        }
        assert!((result.avg_worker_utilization() - 0.6).abs() < 1e-12);
        assert!(result.worker_stat("Worker_02").is_some());
        assert!(result.worker_stat("Worker_99").is_none());
    }
}
