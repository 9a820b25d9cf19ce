//! Simulation engine
//!
//! Owns all run state and coordinates the components:
//! - unit admission (pipeline controller or single-unit mode)
//! - per-unit DAG scheduling (ready steps spawn task executors)
//! - the deterministic event loop (see `kernel`)
//! - result collection
//!
//! # Determinism
//!
//! All randomness flows through one seeded xorshift64* generator, wakes at
//! equal times fire in enqueue order, and resource queues are strict FIFO,
//! so a fixed seed reproduces the entire event timeline bit for bit.

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::time::ShiftCalendar;
use crate::graph::ProcessGraph;
use crate::kernel::{EventQueue, SimTime};
use crate::models::config::SimConfig;
use crate::models::event::{EventCollector, EventType, TimelineEvent};
use crate::models::process::ProcessDefinition;
use crate::models::result::{
    HumanFactorsStats, NoRestComparison, QualityStats, ResourceKind, ResourceUtilization,
    SimResult, SimulationStatus,
};
use crate::orchestrator::executor::TaskState;
use crate::orchestrator::SimulationError;
use crate::policy::{ErgonomicRestPolicy, NoRestPolicy, RestPolicy};
use crate::resources::{EquipmentManager, WorkerPool};
use crate::rng::RngManager;

/// Index into the simulation's task table.
pub(crate) type TaskId = usize;

/// A pending wake: one resumption point of a cooperative process.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Process {
    /// Pipeline controller checks whether a new unit can be admitted
    PipelineTick,
    /// A freshly admitted unit computes its initial ready set
    StartEngine { engine_id: u32 },
    /// A task executor begins resource acquisition
    StartTask { task: TaskId },
    /// A queued worker request was granted
    WorkersGranted { task: TaskId },
    /// A queued equipment request was granted
    EquipmentGranted { task: TaskId },
    /// A work segment finished
    WorkDone { task: TaskId },
    /// A worker's rest finished
    RestDone {
        worker: usize,
        engine_id: u32,
        started_at: f64,
    },
}

/// Per-unit scheduling state.
struct EngineUnit {
    started_at: f64,
    completed_at: Option<f64>,
    /// Node indices whose work is done
    completed: HashSet<usize>,
    /// Node indices with a live executor
    running: HashSet<usize>,
}

/// One simulation run.
///
/// Construct with [`Simulation::new`] (or [`Simulation::with_rest_disabled`]
/// for the A/B control variant), then call [`Simulation::run`] once.
pub struct Simulation {
    config: SimConfig,
    calendar: ShiftCalendar,
    graph: ProcessGraph,
    pub(crate) workers: WorkerPool,
    pub(crate) equipment: EquipmentManager,
    pub(crate) collector: EventCollector,
    pub(crate) rng: RngManager,
    pub(crate) rest_policy: Box<dyn RestPolicy>,
    pub(crate) queue: EventQueue<Process>,
    pub(crate) now: f64,
    pub(crate) tasks: Vec<TaskState>,
    units: BTreeMap<u32, EngineUnit>,
    engines_admitted: u32,
    engines_completed: u32,
    sim_id: String,
    created_at: String,
}

impl Simulation {
    /// Build a validated simulation with the ergonomic rest policy.
    pub fn new(config: SimConfig, process: &ProcessDefinition) -> Result<Self, SimulationError> {
        let policy = Box::new(ErgonomicRestPolicy::from_config(&config));
        Self::with_policy(config, process, policy)
    }

    /// Build the rest-disabled control variant used for A/B comparison.
    /// Identical in every other respect, including the seed.
    pub fn with_rest_disabled(
        config: SimConfig,
        process: &ProcessDefinition,
    ) -> Result<Self, SimulationError> {
        Self::with_policy(config, process, Box::new(NoRestPolicy))
    }

    fn with_policy(
        config: SimConfig,
        process: &ProcessDefinition,
        rest_policy: Box<dyn RestPolicy>,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        let graph = ProcessGraph::new(process)?;
        let seed = config.random_seed.unwrap_or_else(seed_from_clock);

        Ok(Self {
            calendar: ShiftCalendar::new(config.work_hours_per_day, config.work_days_per_month),
            workers: WorkerPool::new(config.num_workers, config.rest_load_threshold),
            equipment: EquipmentManager::new(&config.critical_equipment),
            collector: EventCollector::new(),
            rng: RngManager::new(seed),
            rest_policy,
            queue: EventQueue::new(),
            now: 0.0,
            tasks: Vec::new(),
            units: BTreeMap::new(),
            engines_admitted: 0,
            engines_completed: 0,
            sim_id: Uuid::new_v4().to_string(),
            created_at: Utc::now().to_rfc3339(),
            graph,
            config,
        })
    }

    /// Current simulated time in minutes.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Run to completion: pop wakes in `(time, enqueue)` order until the
    /// shift deadline is reached or no wakes remain, then assemble the
    /// result. In-flight work at the deadline is dropped without events.
    pub fn run(mut self) -> SimResult {
        let deadline = self.calendar.total_minutes();
        info!(
            sim_id = %self.sim_id,
            deadline_minutes = deadline,
            pipeline_mode = self.config.pipeline_mode,
            "simulation run starting"
        );

        if self.config.pipeline_mode {
            self.queue.schedule(SimTime::ZERO, Process::PipelineTick);
        } else {
            self.admit_engine();
        }

        while let Some((t, process)) = self.queue.pop() {
            if t.minutes() >= deadline {
                self.now = deadline;
                break;
            }
            self.now = t.minutes();
            self.dispatch(process);
        }

        info!(
            sim_id = %self.sim_id,
            sim_duration = self.now,
            engines_completed = self.engines_completed,
            "simulation run finished"
        );
        self.collect_results()
    }

    fn dispatch(&mut self, process: Process) {
        match process {
            Process::PipelineTick => self.pipeline_tick(),
            Process::StartEngine { engine_id } => self.spawn_ready_tasks(engine_id),
            Process::StartTask { task } => self.start_task(task),
            Process::WorkersGranted { task } => self.workers_granted(task),
            Process::EquipmentGranted { task } => self.equipment_granted(task),
            Process::WorkDone { task } => self.work_done(task),
            Process::RestDone {
                worker,
                engine_id,
                started_at,
            } => self.rest_done(worker, engine_id, started_at),
        }
    }

    // ========================================================================
    // Pipeline controller
    // ========================================================================

    /// Admit a new unit when the first step's worker demand fits, then sleep
    /// half that step's standard duration; otherwise retry in 10 minutes.
    /// Admission stops at `target_output + 2` units (safety margin over the
    /// target so late rework cannot leave the target unreachable).
    fn pipeline_tick(&mut self) {
        if self.engines_admitted >= self.config.target_output + 2 {
            return;
        }

        let first = self.graph.start_nodes()[0];
        let (needed, first_duration) = {
            let node = self.graph.node_at(first);
            (node.required_workers, node.std_duration)
        };

        if self.workers.available() >= needed {
            self.admit_engine();
            self.queue.schedule(
                SimTime(self.now + 0.5 * first_duration),
                Process::PipelineTick,
            );
        } else {
            self.queue
                .schedule(SimTime(self.now + 10.0), Process::PipelineTick);
        }
    }

    fn admit_engine(&mut self) {
        self.engines_admitted += 1;
        let engine_id = self.engines_admitted;
        self.units.insert(
            engine_id,
            EngineUnit {
                started_at: self.now,
                completed_at: None,
                completed: HashSet::new(),
                running: HashSet::new(),
            },
        );
        debug!(engine_id, t = self.now, "unit admitted");
        self.queue
            .schedule(SimTime(self.now), Process::StartEngine { engine_id });
    }

    // ========================================================================
    // Per-unit scheduling
    // ========================================================================

    /// Spawn an executor for every step that is ready and not yet running.
    pub(crate) fn spawn_ready_tasks(&mut self, engine_id: u32) {
        let to_start: Vec<usize> = {
            let unit = match self.units.get(&engine_id) {
                Some(unit) => unit,
                None => return,
            };
            self.graph
                .ready(&unit.completed)
                .into_iter()
                .filter(|i| !unit.running.contains(i))
                .collect()
        };

        for node_idx in to_start {
            let task_id = self.tasks.len();
            let state = TaskState::for_node(engine_id, node_idx, self.graph.node_at(node_idx));
            self.tasks.push(state);
            if let Some(unit) = self.units.get_mut(&engine_id) {
                unit.running.insert(node_idx);
            }
            debug!(engine_id, task_id, t = self.now, "task spawned");
            self.queue
                .schedule(SimTime(self.now), Process::StartTask { task: task_id });
        }
    }

    /// Completion signal from a task executor.
    pub(crate) fn task_complete(&mut self, task: TaskId) {
        let engine_id = self.tasks[task].engine_id;
        let node_idx = self.tasks[task].node_idx;

        let finished = {
            let unit = match self.units.get_mut(&engine_id) {
                Some(unit) => unit,
                None => return,
            };
            unit.running.remove(&node_idx);
            unit.completed.insert(node_idx);
            unit.completed.len() == self.graph.count()
        };

        if finished {
            if let Some(unit) = self.units.get_mut(&engine_id) {
                unit.completed_at = Some(self.now);
            }
            self.engines_completed += 1;
            debug!(engine_id, t = self.now, "unit completed");
        } else {
            self.spawn_ready_tasks(engine_id);
        }
    }

    // ========================================================================
    // Result assembly
    // ========================================================================

    fn collect_results(self) -> SimResult {
        let sim_duration = self.now;

        let cycle_times: Vec<f64> = self
            .units
            .values()
            .filter_map(|u| u.completed_at.map(|end| end - u.started_at))
            .collect();
        let avg_cycle_time = if cycle_times.is_empty() {
            0.0
        } else {
            cycle_times.iter().sum::<f64>() / cycle_times.len() as f64
        };

        let worker_stats: Vec<ResourceUtilization> = self
            .workers
            .workers()
            .iter()
            .map(|w| ResourceUtilization {
                resource_id: w.id.clone(),
                resource_type: ResourceKind::Worker,
                total_time: sim_duration,
                work_time: w.total_work_time,
                rest_time: w.total_rest_time,
                idle_time: (sim_duration - w.total_work_time - w.total_rest_time).max(0.0),
                utilization_rate: w.utilization(sim_duration),
                tasks_completed: w.tasks_completed,
                fatigue_level: w.fatigue_level,
                high_intensity_count: w.high_intensity_count,
                fatigue_history: w.fatigue_history.clone(),
            })
            .collect();

        let fatigue_levels: Vec<f64> = self
            .workers
            .workers()
            .iter()
            .map(|w| w.fatigue_level)
            .collect();
        let human_factors_stats = HumanFactorsStats {
            total_rest_time: self
                .workers
                .workers()
                .iter()
                .map(|w| w.total_rest_time)
                .sum(),
            avg_fatigue_level: if fatigue_levels.is_empty() {
                0.0
            } else {
                fatigue_levels.iter().sum::<f64>() / fatigue_levels.len() as f64
            },
            max_fatigue_level: fatigue_levels.iter().fold(0.0, |a: f64, &b| a.max(b)),
            total_high_intensity_exposure: self
                .workers
                .workers()
                .iter()
                .map(|w| w.high_intensity_count)
                .sum(),
            rest_events_count: self.collector.rest_events_count(),
        };

        let equipment_stats = self.equipment.stats(sim_duration);
        let quality_stats = self.collector.quality_stats();
        let target_achievement_rate =
            f64::from(self.engines_completed) / f64::from(self.config.target_output);

        SimResult {
            sim_id: self.sim_id,
            status: SimulationStatus::Completed,
            sim_duration,
            engines_completed: self.engines_completed,
            target_achievement_rate,
            avg_cycle_time,
            worker_stats,
            equipment_stats,
            quality_stats,
            human_factors_stats,
            events: self.collector.into_sorted_events(),
            time_mapping: self.calendar.time_mapping(),
            created_at: self.created_at,
            completed_at: Some(Utc::now().to_rfc3339()),
            error: None,
            no_rest_comparison: None,
            config: self.config,
        }
    }
}

fn seed_from_clock() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x5DEECE66D)
}

/// Run one simulation, converting validation failures into a `FAILED`
/// result instead of an error.
pub fn simulate(config: SimConfig, process: &ProcessDefinition) -> SimResult {
    match Simulation::new(config.clone(), process) {
        Ok(sim) => sim.run(),
        Err(err) => failed_result(config, err),
    }
}

/// Run the main simulation plus a rest-disabled control run with the same
/// seed, attaching the control's headline figures for A/B comparison.
pub fn simulate_with_comparison(config: SimConfig, process: &ProcessDefinition) -> SimResult {
    let mut result = simulate(config.clone(), process);
    if result.status == SimulationStatus::Failed {
        return result;
    }

    if let Ok(control) = Simulation::with_rest_disabled(config, process) {
        let control_result = control.run();
        result.no_rest_comparison = Some(NoRestComparison {
            engines_completed: control_result.engines_completed,
            avg_cycle_time: control_result.avg_cycle_time,
            sim_duration: control_result.sim_duration,
            avg_worker_utilization: control_result.avg_worker_utilization(),
            first_pass_rate: control_result.quality_stats.first_pass_rate,
        });
    }
    result
}

fn failed_result(config: SimConfig, err: SimulationError) -> SimResult {
    let calendar = ShiftCalendar::new(config.work_hours_per_day, config.work_days_per_month);
    SimResult {
        sim_id: Uuid::new_v4().to_string(),
        status: SimulationStatus::Failed,
        sim_duration: 0.0,
        engines_completed: 0,
        target_achievement_rate: 0.0,
        avg_cycle_time: 0.0,
        worker_stats: Vec::new(),
        equipment_stats: Vec::new(),
        quality_stats: QualityStats::default(),
        human_factors_stats: HumanFactorsStats::default(),
        events: Vec::new(),
        time_mapping: calendar.time_mapping(),
        created_at: Utc::now().to_rfc3339(),
        completed_at: None,
        error: Some(err.to_string()),
        no_rest_comparison: None,
        config,
    }
}

// Rest bookkeeping lives here rather than in the executor because rests
// belong to workers, not tasks: the triggering task is already gone when the
// rest closes.
impl Simulation {
    pub(crate) fn rest_done(&mut self, worker: usize, engine_id: u32, started_at: f64) {
        let duration = self.now - started_at;
        self.workers.finish_rest(worker, duration, self.now);
        let worker_id = self.workers.worker(worker).id.clone();
        debug!(worker = %worker_id, t = self.now, "rest finished");
        self.collector.add(TimelineEvent {
            engine_id,
            step_id: String::new(),
            task_name: String::new(),
            op_type: None,
            event_type: EventType::Rest,
            start_time: started_at,
            end_time: self.now,
            worker_ids: vec![worker_id],
            equipment_used: Vec::new(),
            rework_count: 0,
        });
        self.grant_worker_waiters();
    }

    /// Hand freed workers to queued requests, FIFO, and resume the owners.
    pub(crate) fn grant_worker_waiters(&mut self) {
        for (token, ids) in self.workers.grant_ready() {
            self.tasks[token].worker_idxs = ids;
            self.queue
                .schedule(SimTime(self.now), Process::WorkersGranted { task: token });
        }
    }
}
