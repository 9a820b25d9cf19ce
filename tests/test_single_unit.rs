//! End-to-end run of the smallest possible line: one step, one worker.

use assembly_simulator_core::{
    simulate, EventType, ProcessDefinition, SimConfig, SimulationStatus,
};

fn process() -> ProcessDefinition {
    serde_json::from_value(serde_json::json!({
        "name": "single step",
        "nodes": [{
            "step_id": "S001",
            "task_name": "assemble housing",
            "op_type": "A",
            "std_duration": 30.0,
            "time_variance": 0.0,
            "work_load_score": 3,
            "required_workers": 1
        }]
    }))
    .unwrap()
}

fn config() -> SimConfig {
    SimConfig {
        num_workers: 1,
        target_output: 1,
        rest_time_threshold: 999_999.0,
        pipeline_mode: false,
        random_seed: Some(1),
        ..SimConfig::default()
    }
}

#[test]
fn test_single_step_completes_one_unit() {
    let result = simulate(config(), &process());

    assert_eq!(result.status, SimulationStatus::Completed);
    assert_eq!(result.engines_completed, 1);
    assert_eq!(result.target_achievement_rate, 1.0);
    assert_eq!(result.avg_cycle_time, 30.0);
    assert_eq!(result.sim_duration, 30.0);
}

#[test]
fn test_single_step_timeline() {
    let result = simulate(config(), &process());

    assert_eq!(result.events.len(), 1, "exactly one closed event");
    let event = &result.events[0];
    assert_eq!(event.event_type, EventType::Normal);
    assert_eq!(event.engine_id, 1);
    assert_eq!(event.step_id, "S001");
    assert_eq!(event.start_time, 0.0);
    assert_eq!(event.end_time, 30.0);
    assert_eq!(event.worker_ids, vec!["Worker_01"]);
    assert_eq!(event.rework_count, 0);
}

#[test]
fn test_single_step_worker_stats() {
    let result = simulate(config(), &process());

    let stats = result.worker_stat("Worker_01").expect("worker stats present");
    assert_eq!(stats.work_time, 30.0);
    assert_eq!(stats.rest_time, 0.0);
    assert_eq!(stats.idle_time, 0.0);
    assert_eq!(stats.utilization_rate, 1.0);
    assert_eq!(stats.tasks_completed, 1);
}

#[test]
fn test_result_echoes_time_mapping() {
    let result = simulate(config(), &process());

    assert_eq!(result.time_mapping.minutes_per_day, 480.0);
    assert_eq!(result.time_mapping.total_days, 22);
    assert_eq!(result.time_mapping.total_minutes, 10_560.0);
}
