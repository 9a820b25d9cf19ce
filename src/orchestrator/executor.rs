//! Task executor
//!
//! The cooperative process that runs one step for one unit. Lifecycle:
//!
//! 1. Request workers, then equipment in sorted-name order. Acquisitions
//!    that cannot be granted park the executor on that resource's FIFO
//!    queue; a single WAITING event covering the whole blocked span closes
//!    when everything is finally held.
//! 2. Sample the segment duration and work.
//! 3. On waking, close the NORMAL (first pass) or REWORK segment, then
//!    release equipment and workers. Releasing workers is what triggers the
//!    rest rules. Measurement steps then draw against the rework
//!    probability; a failed draw re-enters the executor at step 1.
//! 4. Signal completion to the owning unit.
//!
//! Acquisition order is fixed (workers, then equipment sorted by name), so
//! two executors can never hold complementary halves of each other's
//! resource set.

use tracing::debug;

use crate::kernel::SimTime;
use crate::models::event::{EventType, TimelineEvent};
use crate::models::process::{OpType, ProcessNode};
use crate::orchestrator::engine::{Process, Simulation, TaskId};

/// Executor state for one (unit, step) pair.
///
/// Node parameters are copied in at spawn time; the graph stays untouched
/// for the whole run.
pub(crate) struct TaskState {
    pub engine_id: u32,
    pub node_idx: usize,
    pub step_id: String,
    pub task_name: String,
    pub op_type: OpType,
    pub std_duration: f64,
    pub time_variance: f64,
    pub work_load_score: u8,
    pub rework_prob: f64,
    pub required_workers: u32,
    /// Required equipment in canonical (sorted) acquisition order
    pub tools: Vec<String>,
    /// How many entries of `tools` are currently held
    pub tools_acquired: usize,
    /// Start of the current acquisition round, for the WAITING event
    pub wait_from: f64,
    pub worker_idxs: Vec<usize>,
    pub work_started: f64,
    pub duration: f64,
    /// 0 on the first pass, then 1, 2, ... per rework segment
    pub rework_count: u32,
}

impl TaskState {
    pub(crate) fn for_node(engine_id: u32, node_idx: usize, node: &ProcessNode) -> Self {
        let mut tools = node.required_tools.clone();
        tools.sort();
        Self {
            engine_id,
            node_idx,
            step_id: node.step_id.clone(),
            task_name: node.task_name.clone(),
            op_type: node.op_type,
            std_duration: node.std_duration,
            time_variance: node.time_variance,
            work_load_score: node.work_load_score,
            rework_prob: node.rework_prob,
            required_workers: node.required_workers,
            tools,
            tools_acquired: 0,
            wait_from: 0.0,
            worker_idxs: Vec::new(),
            work_started: 0.0,
            duration: 0.0,
            rework_count: 0,
        }
    }
}

impl Simulation {
    /// Begin (or re-begin, on rework) resource acquisition.
    pub(crate) fn start_task(&mut self, task: TaskId) {
        self.tasks[task].wait_from = self.now;
        self.request_workers(task);
    }

    fn request_workers(&mut self, task: TaskId) {
        let count = self.tasks[task].required_workers;
        if let Some(ids) = self.workers.acquire(count, task) {
            self.tasks[task].worker_idxs = ids;
            self.acquire_equipment(task);
        }
        // Otherwise the request is queued; WorkersGranted resumes us.
    }

    pub(crate) fn workers_granted(&mut self, task: TaskId) {
        self.acquire_equipment(task);
    }

    pub(crate) fn equipment_granted(&mut self, task: TaskId) {
        self.tasks[task].tools_acquired += 1;
        self.acquire_equipment(task);
    }

    /// Acquire remaining equipment in canonical order, parking on the first
    /// saturated unit.
    fn acquire_equipment(&mut self, task: TaskId) {
        loop {
            let next = {
                let state = &self.tasks[task];
                state.tools.get(state.tools_acquired).cloned()
            };
            match next {
                Some(name) => {
                    if self.equipment.try_acquire(&name, task) {
                        self.tasks[task].tools_acquired += 1;
                    } else {
                        return; // queued; EquipmentGranted resumes us
                    }
                }
                None => {
                    self.begin_work(task);
                    return;
                }
            }
        }
    }

    /// Everything held: close any waiting span, sample the duration, work.
    fn begin_work(&mut self, task: TaskId) {
        let wait_from = self.tasks[task].wait_from;
        if self.now > wait_from {
            let waiting = {
                let state = &self.tasks[task];
                TimelineEvent {
                    engine_id: state.engine_id,
                    step_id: state.step_id.clone(),
                    task_name: state.task_name.clone(),
                    op_type: Some(state.op_type),
                    event_type: EventType::Waiting,
                    start_time: wait_from,
                    end_time: self.now,
                    worker_ids: Vec::new(),
                    equipment_used: Vec::new(),
                    rework_count: 0,
                }
            };
            self.collector.add(waiting);
        }

        let (std_duration, variance) = {
            let state = &self.tasks[task];
            (state.std_duration, state.time_variance)
        };
        let duration = if variance > 0.0 {
            self.rng.normal(std_duration, variance).max(1.0)
        } else {
            std_duration
        };

        self.tasks[task].work_started = self.now;
        self.tasks[task].duration = duration;
        debug!(
            task,
            t = self.now,
            duration,
            "work segment started"
        );
        self.queue
            .schedule(SimTime(self.now + duration), Process::WorkDone { task });
    }

    /// Close the segment: record the event, free resources, decide rework.
    pub(crate) fn work_done(&mut self, task: TaskId) {
        let segment = {
            let state = &self.tasks[task];
            TimelineEvent {
                engine_id: state.engine_id,
                step_id: state.step_id.clone(),
                task_name: state.task_name.clone(),
                op_type: Some(state.op_type),
                event_type: if state.rework_count == 0 {
                    EventType::Normal
                } else {
                    EventType::Rework
                },
                start_time: state.work_started,
                end_time: self.now,
                worker_ids: state
                    .worker_idxs
                    .iter()
                    .map(|&i| self.workers.worker(i).id.clone())
                    .collect(),
                equipment_used: state.tools.clone(),
                rework_count: state.rework_count,
            }
        };
        self.collector.add(segment);

        // Equipment first, atomically for the whole segment; freed units
        // transfer straight to FIFO waiters.
        let duration = self.tasks[task].duration;
        let engine_id = self.tasks[task].engine_id;
        for i in 0..self.tasks[task].tools_acquired {
            let name = self.tasks[task].tools[i].clone();
            if let Some(waiter) = self.equipment.release(&name, duration) {
                self.queue
                    .schedule(SimTime(self.now), Process::EquipmentGranted { task: waiter });
            }
        }
        self.tasks[task].tools_acquired = 0;

        // Workers next; this is where the rest rules fire.
        let worker_idxs = std::mem::take(&mut self.tasks[task].worker_idxs);
        let work_load = self.tasks[task].work_load_score;
        let rest_orders = self.workers.release(
            &worker_idxs,
            duration,
            work_load,
            self.now,
            self.rest_policy.as_ref(),
        );
        for order in rest_orders {
            debug!(worker = order.worker, t = self.now, rest = order.duration, "rest started");
            self.queue.schedule(
                SimTime(self.now + order.duration),
                Process::RestDone {
                    worker: order.worker,
                    engine_id,
                    started_at: self.now,
                },
            );
        }
        self.grant_worker_waiters();

        // Quality gate: only measurement steps with a positive rework
        // probability consume a draw.
        let (op_type, rework_prob) = {
            let state = &self.tasks[task];
            (state.op_type, state.rework_prob)
        };
        let rework = op_type == OpType::Measurement
            && rework_prob > 0.0
            && self.rng.chance(rework_prob);

        if rework {
            self.tasks[task].rework_count += 1;
            debug!(
                task,
                t = self.now,
                rework_count = self.tasks[task].rework_count,
                "inspection failed, rework"
            );
            self.start_task(task);
        } else {
            self.task_complete(task);
        }
    }
}
