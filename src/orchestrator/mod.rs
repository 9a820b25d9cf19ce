//! Simulation orchestrator
//!
//! Drives the event loop: unit admission, per-unit DAG scheduling, task
//! execution, and result assembly.

pub mod engine;
mod executor;

pub use engine::{simulate, simulate_with_comparison, Simulation};

use thiserror::Error;

/// Validation errors raised before the event loop starts.
///
/// Both variants short-circuit to a `FAILED` result when going through the
/// top-level [`simulate`] entry point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// Out-of-range shift, workforce, target or rest-rule values
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Empty process, duplicate or unresolved step ids, cycles, or a
    /// measurement step that can never pass
    #[error("invalid process: {0}")]
    InvalidProcess(String),
}
