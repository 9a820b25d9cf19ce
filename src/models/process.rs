//! Process definition: the task graph the line executes
//!
//! A process is a named list of nodes; each node is one work step with its
//! resource demands and stochastic parameters. Predecessors arrive as a
//! semicolon-joined string (the canvas editor's export format); tool lists
//! are accepted either as a JSON list or as the same semicolon form.

use serde::{Deserialize, Deserializer, Serialize};

/// Operation class of a work step.
///
/// Only `Measurement` steps can trigger rework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpType {
    /// Handling: pick/place and transport moves
    #[serde(rename = "H")]
    Handling,
    /// Assembly: joining parts
    #[serde(rename = "A")]
    Assembly,
    /// Measurement: inspection; may fail and trigger rework
    #[serde(rename = "M")]
    Measurement,
    /// Tooling: tool setup and adjustment
    #[serde(rename = "T")]
    Tooling,
    /// Data recording
    #[serde(rename = "D")]
    DataRecording,
}

impl OpType {
    pub fn code(&self) -> &'static str {
        match self {
            OpType::Handling => "H",
            OpType::Assembly => "A",
            OpType::Measurement => "M",
            OpType::Tooling => "T",
            OpType::DataRecording => "D",
        }
    }
}

/// One work step of the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessNode {
    /// Unique step identifier
    pub step_id: String,

    /// Human-readable task name
    #[serde(default)]
    pub task_name: String,

    /// Operation class
    pub op_type: OpType,

    /// Semicolon-joined predecessor step ids; empty for root steps
    #[serde(default)]
    pub predecessors: String,

    /// Standard duration in minutes
    pub std_duration: f64,

    /// Standard deviation of the duration (0 = deterministic)
    #[serde(default)]
    pub time_variance: f64,

    /// Ergonomic load score, 1..=10
    #[serde(default = "default_work_load")]
    pub work_load_score: u8,

    /// Probability a Measurement step fails and is redone, 0..=1
    #[serde(default)]
    pub rework_prob: f64,

    /// Number of workers the step occupies
    #[serde(default = "default_required_workers")]
    pub required_workers: u32,

    /// Equipment names the step occupies; repeats request distinct units
    #[serde(default, deserialize_with = "deserialize_tools")]
    pub required_tools: Vec<String>,

    /// Station label, passed through untouched
    #[serde(default)]
    pub station: String,
}

fn default_work_load() -> u8 {
    5
}

fn default_required_workers() -> u32 {
    1
}

/// Accepts `["a", "b"]` as well as `"a;b"`.
fn deserialize_tools<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrJoined {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match ListOrJoined::deserialize(deserializer)? {
        ListOrJoined::List(list) => list,
        ListOrJoined::Joined(s) => split_joined(&s),
    })
}

fn split_joined(s: &str) -> Vec<String> {
    s.split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

impl ProcessNode {
    /// Parse the semicolon-joined predecessor field.
    pub fn predecessor_ids(&self) -> Vec<String> {
        split_joined(&self.predecessors)
    }

    pub fn is_measurement(&self) -> bool {
        self.op_type == OpType::Measurement
    }

    /// Whether the step can ever loop back into rework.
    pub fn can_trigger_rework(&self) -> bool {
        self.is_measurement() && self.rework_prob > 0.0
    }
}

/// A complete process: the workflow one product unit traverses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessDefinition {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub nodes: Vec<ProcessNode>,
}

impl ProcessDefinition {
    pub fn node_ids(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.step_id.as_str()).collect()
    }

    pub fn get_node(&self, step_id: &str) -> Option<&ProcessNode> {
        self.nodes.iter().find(|n| n.step_id == step_id)
    }
}
