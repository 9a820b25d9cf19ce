//! Worker pool
//!
//! Grants exclusive multi-worker reservations and applies the rest policy on
//! release. Requests that cannot be satisfied immediately queue whole, in
//! strict FIFO order: a request never holds part of its workers while
//! waiting for the rest, and later requests never jump an earlier one even
//! when they would fit.

use std::collections::VecDeque;

use crate::models::worker::{Worker, WorkerState};
use crate::policy::RestPolicy;

/// Instruction to put a worker to rest, returned from [`WorkerPool::release`].
/// The event loop schedules the wake-up and closes the rest interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestOrder {
    pub worker: usize,
    pub duration: f64,
}

/// Pending whole-request reservation.
#[derive(Debug, Clone, Copy)]
struct WaitingRequest {
    token: usize,
    count: u32,
}

pub struct WorkerPool {
    workers: Vec<Worker>,
    waiters: VecDeque<WaitingRequest>,
    high_load_threshold: u8,
}

impl WorkerPool {
    pub fn new(num_workers: u32, high_load_threshold: u8) -> Self {
        Self {
            workers: (0..num_workers).map(Worker::new).collect(),
            waiters: VecDeque::new(),
            high_load_threshold,
        }
    }

    /// Workers currently neither held by a task nor resting.
    pub fn available(&self) -> u32 {
        self.workers.iter().filter(|w| w.is_idle()).count() as u32
    }

    /// Reserve `count` workers for `token`.
    ///
    /// Returns the granted worker indices, or `None` if the request was
    /// queued. A request queues whenever someone is already waiting, even if
    /// it would fit right now.
    pub fn acquire(&mut self, count: u32, token: usize) -> Option<Vec<usize>> {
        if self.waiters.is_empty() && self.available() >= count {
            Some(self.reserve(count))
        } else {
            self.waiters.push_back(WaitingRequest { token, count });
            None
        }
    }

    /// Pick the `count` idle workers with the least accumulated work time
    /// (ties broken by index) and mark them working.
    fn reserve(&mut self, count: u32) -> Vec<usize> {
        let mut idle: Vec<usize> = (0..self.workers.len())
            .filter(|&i| self.workers[i].is_idle())
            .collect();
        idle.sort_by(|&a, &b| {
            self.workers[a]
                .total_work_time
                .total_cmp(&self.workers[b].total_work_time)
                .then_with(|| a.cmp(&b))
        });
        idle.truncate(count as usize);
        for &i in &idle {
            self.workers[i].state = WorkerState::Working;
        }
        idle
    }

    /// Release a finished work segment.
    ///
    /// Updates every held worker's counters and fatigue, then consults the
    /// rest policy. Workers ordered to rest stay unavailable; the returned
    /// orders tell the event loop when to wake them.
    pub fn release(
        &mut self,
        ids: &[usize],
        work_duration: f64,
        work_load: u8,
        now: f64,
        policy: &dyn RestPolicy,
    ) -> Vec<RestOrder> {
        let mut orders = Vec::new();
        for &i in ids {
            self.workers[i].record_work(work_duration, work_load, self.high_load_threshold, now);
            match policy.rest_after(&self.workers[i], work_load) {
                Some(duration) => {
                    self.workers[i].state = WorkerState::Resting;
                    orders.push(RestOrder {
                        worker: i,
                        duration,
                    });
                }
                None => self.workers[i].state = WorkerState::Idle,
            }
        }
        orders
    }

    /// Finish a rest: apply recovery and make the worker available again.
    pub fn finish_rest(&mut self, worker: usize, duration: f64, now: f64) {
        self.workers[worker].record_rest(duration, now);
        self.workers[worker].state = WorkerState::Idle;
    }

    /// Grant queued requests that now fit, head first.
    ///
    /// Stops at the first request that still does not fit, preserving FIFO
    /// order. Returns `(token, worker indices)` per grant.
    pub fn grant_ready(&mut self) -> Vec<(usize, Vec<usize>)> {
        let mut grants = Vec::new();
        while let Some(&request) = self.waiters.front() {
            if self.available() < request.count {
                break;
            }
            self.waiters.pop_front();
            let ids = self.reserve(request.count);
            grants.push((request.token, ids));
        }
        grants
    }

    pub fn worker(&self, index: usize) -> &Worker {
        &self.workers[index]
    }

    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }
}
