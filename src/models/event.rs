//! Timeline events and the event collector
//!
//! Every resource wait, work segment, rework segment and rest is recorded as
//! one closed interval. Events are appended exactly once, at the moment the
//! interval closes; work that is still open when the run deadline hits is
//! never recorded. The collected list is what Gantt renderers consume.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::process::OpType;
use crate::models::result::QualityStats;

/// Lifecycle class of a timeline interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    /// A completed work segment (first pass)
    #[serde(rename = "NORMAL")]
    Normal,
    /// A completed rework segment of a measurement step
    #[serde(rename = "REWORK")]
    Rework,
    /// Time a task spent blocked on workers or equipment
    #[serde(rename = "WAITING")]
    Waiting,
    /// A worker rest; step and task fields are empty
    #[serde(rename = "REST")]
    Rest,
}

/// One closed interval on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub engine_id: u32,
    /// Empty for rest events
    #[serde(default)]
    pub step_id: String,
    /// Empty for rest events
    #[serde(default)]
    pub task_name: String,
    /// Operation class of the owning step; `None` for rest events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op_type: Option<OpType>,
    pub event_type: EventType,
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default)]
    pub worker_ids: Vec<String>,
    #[serde(default)]
    pub equipment_used: Vec<String>,
    /// 0 except on rework segments, where it counts 1, 2, ...
    #[serde(default)]
    pub rework_count: u32,
}

impl TimelineEvent {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Append-only event log with running quality tallies.
///
/// No reader observes the collector until the run ends, so it needs no
/// interior synchronization.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<TimelineEvent>,
    total_inspections: u64,
    total_reworks: u64,
    rework_time_total: f64,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one closed event.
    pub fn add(&mut self, event: TimelineEvent) {
        match event.event_type {
            EventType::Normal if event.op_type == Some(OpType::Measurement) => {
                self.total_inspections += 1;
            }
            EventType::Rework => {
                self.total_inspections += 1;
                self.total_reworks += 1;
                self.rework_time_total += event.duration();
            }
            _ => {}
        }
        self.events.push(event);
    }

    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events_by_type(&self, event_type: EventType) -> impl Iterator<Item = &TimelineEvent> {
        self.events
            .iter()
            .filter(move |e| e.event_type == event_type)
    }

    pub fn events_for_engine(&self, engine_id: u32) -> impl Iterator<Item = &TimelineEvent> {
        self.events.iter().filter(move |e| e.engine_id == engine_id)
    }

    pub fn events_for_worker<'a>(
        &'a self,
        worker_id: &'a str,
    ) -> impl Iterator<Item = &'a TimelineEvent> {
        self.events
            .iter()
            .filter(move |e| e.worker_ids.iter().any(|w| w == worker_id))
    }

    pub fn total_duration_by_type(&self, event_type: EventType) -> f64 {
        self.events_by_type(event_type).map(|e| e.duration()).sum()
    }

    pub fn rest_events_count(&self) -> u64 {
        self.events_by_type(EventType::Rest).count() as u64
    }

    /// Derive quality statistics.
    ///
    /// The first-pass rate is computed per engine (share of executed
    /// measurement steps with no rework segment) and averaged across
    /// engines that executed at least one measurement step.
    pub fn quality_stats(&self) -> QualityStats {
        // (engine, step) pairs of executed measurement steps, and the subset
        // that needed rework.
        let mut measured: BTreeSet<(u32, &str)> = BTreeSet::new();
        let mut reworked: BTreeSet<(u32, &str)> = BTreeSet::new();
        for event in &self.events {
            match event.event_type {
                EventType::Normal if event.op_type == Some(OpType::Measurement) => {
                    measured.insert((event.engine_id, event.step_id.as_str()));
                }
                EventType::Rework => {
                    reworked.insert((event.engine_id, event.step_id.as_str()));
                }
                _ => {}
            }
        }

        let mut per_engine: BTreeMap<u32, (u64, u64)> = BTreeMap::new();
        for &(engine_id, step_id) in &measured {
            let entry = per_engine.entry(engine_id).or_insert((0, 0));
            entry.0 += 1;
            if !reworked.contains(&(engine_id, step_id)) {
                entry.1 += 1;
            }
        }

        let first_pass_rate = if per_engine.is_empty() {
            1.0
        } else {
            per_engine
                .values()
                .map(|&(executed, clean)| clean as f64 / executed as f64)
                .sum::<f64>()
                / per_engine.len() as f64
        };

        QualityStats {
            total_inspections: self.total_inspections,
            total_reworks: self.total_reworks,
            first_pass_rate,
            rework_time_total: self.rework_time_total,
        }
    }

    /// Consume the collector, returning events sorted by
    /// `(start_time, engine_id)`; ties keep insertion order.
    pub fn into_sorted_events(self) -> Vec<TimelineEvent> {
        let mut events = self.events;
        events.sort_by(|a, b| {
            a.start_time
                .total_cmp(&b.start_time)
                .then_with(|| a.engine_id.cmp(&b.engine_id))
        });
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work_event(
        engine_id: u32,
        step_id: &str,
        op_type: OpType,
        event_type: EventType,
        start: f64,
        end: f64,
        rework_count: u32,
    ) -> TimelineEvent {
        TimelineEvent {
            engine_id,
            step_id: step_id.to_string(),
            task_name: step_id.to_string(),
            op_type: Some(op_type),
            event_type,
            start_time: start,
            end_time: end,
            worker_ids: vec!["Worker_01".to_string()],
            equipment_used: vec![],
            rework_count,
        }
    }

    #[test]
    fn test_inspection_tallies() {
        let mut collector = EventCollector::new();
        collector.add(work_event(
            1,
            "M1",
            OpType::Measurement,
            EventType::Normal,
            0.0,
            10.0,
            0,
        ));
        collector.add(work_event(
            1,
            "M1",
            OpType::Measurement,
            EventType::Rework,
            10.0,
            20.0,
            1,
        ));
        collector.add(work_event(
            1,
            "A1",
            OpType::Assembly,
            EventType::Normal,
            20.0,
            30.0,
            0,
        ));

        let stats = collector.quality_stats();
        assert_eq!(stats.total_inspections, 2);
        assert_eq!(stats.total_reworks, 1);
        assert_eq!(stats.rework_time_total, 10.0);
    }

    #[test]
    fn test_first_pass_rate_averaged_across_engines() {
        let mut collector = EventCollector::new();
        // Engine 1: two measurement steps, one reworked -> 0.5
        collector.add(work_event(
            1,
            "M1",
            OpType::Measurement,
            EventType::Normal,
            0.0,
            10.0,
            0,
        ));
        collector.add(work_event(
            1,
            "M2",
            OpType::Measurement,
            EventType::Normal,
            10.0,
            20.0,
            0,
        ));
        collector.add(work_event(
            1,
            "M1",
            OpType::Measurement,
            EventType::Rework,
            20.0,
            30.0,
            1,
        ));
        // Engine 2: one measurement step, clean -> 1.0
        collector.add(work_event(
            2,
            "M1",
            OpType::Measurement,
            EventType::Normal,
            5.0,
            15.0,
            0,
        ));

        let stats = collector.quality_stats();
        assert!((stats.first_pass_rate - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_first_pass_rate_without_measurements_is_one() {
        let mut collector = EventCollector::new();
        collector.add(work_event(
            1,
            "A1",
            OpType::Assembly,
            EventType::Normal,
            0.0,
            10.0,
            0,
        ));
        assert_eq!(collector.quality_stats().first_pass_rate, 1.0);
    }

    #[test]
    fn test_sorted_by_start_then_engine() {
        let mut collector = EventCollector::new();
        collector.add(work_event(
            2,
            "B",
            OpType::Assembly,
            EventType::Normal,
            5.0,
            10.0,
            0,
        ));
        collector.add(work_event(
            1,
            "A",
            OpType::Assembly,
            EventType::Normal,
            5.0,
            10.0,
            0,
        ));
        collector.add(work_event(
            1,
            "C",
            OpType::Assembly,
            EventType::Normal,
            0.0,
            5.0,
            0,
        ));

        let events = collector.into_sorted_events();
        assert_eq!(events[0].step_id, "C");
        assert_eq!(events[1].step_id, "A");
        assert_eq!(events[2].step_id, "B");
    }
}
