//! Domain types shared across the simulation

pub mod config;
pub mod event;
pub mod process;
pub mod result;
pub mod worker;

pub use config::SimConfig;
pub use event::{EventCollector, EventType, TimelineEvent};
pub use process::{OpType, ProcessDefinition, ProcessNode};
pub use result::{
    HumanFactorsStats, NoRestComparison, QualityStats, ResourceKind, ResourceUtilization,
    SimResult, SimulationStatus,
};
pub use worker::Worker;
