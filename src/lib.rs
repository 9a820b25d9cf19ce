//! Assembly Simulator Core - Rust Engine
//!
//! Deterministic discrete-event simulator for multi-unit assembly lines.
//! Given a validated workflow DAG, a pool of interchangeable workers, a set
//! of capacity-limited equipment types and a shift pattern, it simulates the
//! production of N units over simulated time and reports per-unit cycle
//! times, resource utilization, rework statistics, worker fatigue/rest
//! statistics, and a Gantt-consumable event timeline.
//!
//! # Architecture
//!
//! - **kernel**: deterministic event loop (time + FIFO tie-break)
//! - **core**: shift calendar and time mapping
//! - **models**: domain types (process, config, worker, events, results)
//! - **graph**: validated workflow DAG and ready-set queries
//! - **resources**: worker pool and equipment semaphores
//! - **policy**: rest rules behind a trait (the A/B control run swaps it)
//! - **orchestrator**: admission, task executors, result assembly
//! - **rng**: seeded xorshift64* generator
//!
//! # Critical Invariants
//!
//! 1. Single-threaded cooperative scheduling; all state mutation happens
//!    between wakes, so there is no locking anywhere.
//! 2. All randomness is deterministic (seeded RNG, draws in wake order).
//! 3. Resource queues are strict FIFO; equal-time wakes fire in enqueue
//!    order. Fixed seed ⇒ bit-identical event timeline.
//!
//! # Example
//!
//! ```
//! use assembly_simulator_core::{simulate, SimConfig, SimulationStatus};
//! use assembly_simulator_core::models::ProcessDefinition;
//!
//! let process: ProcessDefinition = serde_json::from_value(serde_json::json!({
//!     "name": "minimal line",
//!     "nodes": [{
//!         "step_id": "S001",
//!         "task_name": "fit rotor",
//!         "op_type": "A",
//!         "std_duration": 30.0,
//!         "required_workers": 1
//!     }]
//! })).unwrap();
//!
//! let config = SimConfig {
//!     num_workers: 1,
//!     target_output: 1,
//!     pipeline_mode: false,
//!     random_seed: Some(42),
//!     ..SimConfig::default()
//! };
//!
//! let result = simulate(config, &process);
//! assert_eq!(result.status, SimulationStatus::Completed);
//! assert_eq!(result.engines_completed, 1);
//! ```

// Module declarations
pub mod core;
pub mod graph;
pub mod kernel;
pub mod models;
pub mod policy;
pub mod resources;
pub mod rng;

pub mod orchestrator;

// Re-exports for convenience
pub use crate::core::time::{ShiftCalendar, TimeMapping};
pub use graph::ProcessGraph;
pub use models::{
    config::SimConfig,
    event::{EventType, TimelineEvent},
    process::{OpType, ProcessDefinition, ProcessNode},
    result::{
        HumanFactorsStats, NoRestComparison, QualityStats, ResourceKind, ResourceUtilization,
        SimResult, SimulationStatus,
    },
    worker::Worker,
};
pub use orchestrator::{simulate, simulate_with_comparison, Simulation, SimulationError};
pub use policy::{ErgonomicRestPolicy, NoRestPolicy, RestPolicy};
pub use rng::RngManager;
