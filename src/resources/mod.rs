//! Contended resources: the worker pool and the equipment manager

pub mod equipment;
pub mod workers;

pub use equipment::EquipmentManager;
pub use workers::{RestOrder, WorkerPool};
