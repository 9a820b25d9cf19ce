//! Workflow graph
//!
//! Owns the validated process graph and answers the scheduler queries:
//! which steps can start now, given what has completed. Nodes keep their
//! declaration order everywhere, so ready sets (and with them resource
//! contention) resolve identically from run to run.

use std::collections::{HashMap, HashSet};

use crate::models::process::{ProcessDefinition, ProcessNode};
use crate::orchestrator::SimulationError;

/// Immutable, validated task graph.
pub struct ProcessGraph {
    nodes: Vec<ProcessNode>,
    index: HashMap<String, usize>,
    /// Predecessors by node index, in declaration order of the edges
    preds: Vec<Vec<usize>>,
}

impl ProcessGraph {
    /// Build and validate a graph from a process definition.
    ///
    /// Fails on: an empty process, duplicate step ids, unresolved
    /// predecessor references, dependency cycles, and measurement steps
    /// whose rework probability is 1 or more (such a step would rework
    /// forever and the run could never finish).
    pub fn new(process: &ProcessDefinition) -> Result<Self, SimulationError> {
        if process.nodes.is_empty() {
            return Err(SimulationError::InvalidProcess(
                "process has no steps".to_string(),
            ));
        }

        let mut index = HashMap::with_capacity(process.nodes.len());
        for (i, node) in process.nodes.iter().enumerate() {
            if index.insert(node.step_id.clone(), i).is_some() {
                return Err(SimulationError::InvalidProcess(format!(
                    "duplicate step id '{}'",
                    node.step_id
                )));
            }
        }

        let mut preds = Vec::with_capacity(process.nodes.len());
        for node in &process.nodes {
            let mut node_preds = Vec::new();
            for pred_id in node.predecessor_ids() {
                match index.get(&pred_id) {
                    Some(&p) => node_preds.push(p),
                    None => {
                        return Err(SimulationError::InvalidProcess(format!(
                            "step '{}' references unknown predecessor '{}'",
                            node.step_id, pred_id
                        )))
                    }
                }
            }
            preds.push(node_preds);
        }

        for node in &process.nodes {
            if node.std_duration < 0.0 || node.time_variance < 0.0 {
                return Err(SimulationError::InvalidProcess(format!(
                    "step '{}' has a negative duration or variance",
                    node.step_id
                )));
            }
            if !(1..=10).contains(&node.work_load_score) {
                return Err(SimulationError::InvalidProcess(format!(
                    "step '{}' work_load_score must be in 1..=10, got {}",
                    node.step_id, node.work_load_score
                )));
            }
            if node.required_workers < 1 {
                return Err(SimulationError::InvalidProcess(format!(
                    "step '{}' must require at least one worker",
                    node.step_id
                )));
            }
            if !(0.0..=1.0).contains(&node.rework_prob) {
                return Err(SimulationError::InvalidProcess(format!(
                    "step '{}' rework_prob must be in 0..=1, got {}",
                    node.step_id, node.rework_prob
                )));
            }
            if node.is_measurement() && node.rework_prob >= 1.0 {
                return Err(SimulationError::InvalidProcess(format!(
                    "measurement step '{}' has rework probability {} and would rework forever",
                    node.step_id, node.rework_prob
                )));
            }
        }

        let graph = Self {
            nodes: process.nodes.clone(),
            index,
            preds,
        };
        graph.check_acyclic()?;
        Ok(graph)
    }

    /// Kahn's algorithm; any node left unprocessed sits on or behind a cycle.
    fn check_acyclic(&self) -> Result<(), SimulationError> {
        let n = self.nodes.len();
        let mut in_degree: Vec<usize> = self.preds.iter().map(Vec::len).collect();

        let mut succs: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, node_preds) in self.preds.iter().enumerate() {
            for &p in node_preds {
                succs[p].push(i);
            }
        }

        let mut frontier: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut processed = 0usize;
        while let Some(i) = frontier.pop() {
            processed += 1;
            for &s in &succs[i] {
                in_degree[s] -= 1;
                if in_degree[s] == 0 {
                    frontier.push(s);
                }
            }
        }

        if processed < n {
            let stuck = (0..n)
                .find(|&i| in_degree[i] > 0)
                .map(|i| self.nodes[i].step_id.as_str())
                .unwrap_or("?");
            return Err(SimulationError::InvalidProcess(format!(
                "dependency cycle detected involving step '{}'",
                stuck
            )));
        }
        Ok(())
    }

    /// Steps with no predecessors, in declaration order.
    pub fn start_nodes(&self) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|&i| self.preds[i].is_empty())
            .collect()
    }

    /// Steps whose predecessors are all completed and which are not
    /// themselves completed, in declaration order.
    pub fn ready(&self, completed: &HashSet<usize>) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|i| !completed.contains(i))
            .filter(|&i| self.preds[i].iter().all(|p| completed.contains(p)))
            .collect()
    }

    pub fn node_at(&self, idx: usize) -> &ProcessNode {
        &self.nodes[idx]
    }

    pub fn node(&self, step_id: &str) -> Option<&ProcessNode> {
        self.index.get(step_id).map(|&i| &self.nodes[i])
    }

    pub fn count(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::process::OpType;

    fn node(step_id: &str, preds: &str) -> ProcessNode {
        ProcessNode {
            step_id: step_id.to_string(),
            task_name: step_id.to_string(),
            op_type: OpType::Assembly,
            predecessors: preds.to_string(),
            std_duration: 10.0,
            time_variance: 0.0,
            work_load_score: 5,
            rework_prob: 0.0,
            required_workers: 1,
            required_tools: vec![],
            station: String::new(),
        }
    }

    fn process(nodes: Vec<ProcessNode>) -> ProcessDefinition {
        ProcessDefinition {
            name: "test".to_string(),
            description: String::new(),
            nodes,
        }
    }

    #[test]
    fn test_rejects_empty_process() {
        assert!(ProcessGraph::new(&process(vec![])).is_err());
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let err = ProcessGraph::new(&process(vec![node("S1", ""), node("S1", "")]));
        assert!(err.is_err());
    }

    #[test]
    fn test_rejects_unknown_predecessor() {
        let err = ProcessGraph::new(&process(vec![node("S1", "GHOST")]));
        let msg = err.err().unwrap().to_string();
        assert!(msg.contains("GHOST"), "message should name the bad ref: {}", msg);
    }

    #[test]
    fn test_rejects_cycle() {
        let err = ProcessGraph::new(&process(vec![
            node("S1", "S3"),
            node("S2", "S1"),
            node("S3", "S2"),
        ]));
        let msg = err.err().unwrap().to_string();
        assert!(msg.contains("cycle"), "unexpected message: {}", msg);
    }

    #[test]
    fn test_rejects_self_loop() {
        assert!(ProcessGraph::new(&process(vec![node("S1", "S1")])).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_node_fields() {
        let mut negative = node("S1", "");
        negative.std_duration = -1.0;
        assert!(ProcessGraph::new(&process(vec![negative])).is_err());

        let mut overload = node("S1", "");
        overload.work_load_score = 11;
        assert!(ProcessGraph::new(&process(vec![overload])).is_err());

        let mut crewless = node("S1", "");
        crewless.required_workers = 0;
        assert!(ProcessGraph::new(&process(vec![crewless])).is_err());
    }

    #[test]
    fn test_rejects_certain_rework() {
        let mut m = node("M1", "");
        m.op_type = OpType::Measurement;
        m.rework_prob = 1.0;
        assert!(ProcessGraph::new(&process(vec![m])).is_err());
    }

    #[test]
    fn test_ready_in_declaration_order() {
        let graph = ProcessGraph::new(&process(vec![
            node("S1", ""),
            node("S2", "S1"),
            node("S3", "S1"),
            node("S4", "S2;S3"),
        ]))
        .unwrap();

        assert_eq!(graph.start_nodes(), vec![0]);

        let mut completed = HashSet::new();
        completed.insert(0);
        assert_eq!(graph.ready(&completed), vec![1, 2]);

        completed.insert(1);
        completed.insert(2);
        assert_eq!(graph.ready(&completed), vec![3]);

        completed.insert(3);
        assert!(graph.ready(&completed).is_empty());
    }

    #[test]
    fn test_lookup() {
        let graph = ProcessGraph::new(&process(vec![node("S1", "")])).unwrap();
        assert_eq!(graph.count(), 1);
        assert!(graph.node("S1").is_some());
        assert!(graph.node("S9").is_none());
    }
}
