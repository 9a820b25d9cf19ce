//! A/B comparison: the same line with the rest rules switched off.

use assembly_simulator_core::{
    simulate_with_comparison, EventType, ProcessDefinition, SimConfig, SimulationStatus,
};

fn process() -> ProcessDefinition {
    let node = |id: &str, preds: &str| {
        serde_json::json!({
            "step_id": id,
            "task_name": id,
            "op_type": "A",
            "predecessors": preds,
            "std_duration": 10.0,
            "time_variance": 0.0,
            "work_load_score": 8,
            "required_workers": 1
        })
    };
    serde_json::from_value(serde_json::json!({
        "name": "heavy pair",
        "nodes": [node("H1", ""), node("H2", "H1")]
    }))
    .unwrap()
}

fn config() -> SimConfig {
    SimConfig {
        num_workers: 1,
        target_output: 1,
        rest_time_threshold: 999_999.0,
        rest_duration_time: 5.0,
        rest_load_threshold: 7,
        rest_duration_load: 3.0,
        pipeline_mode: false,
        random_seed: Some(31),
        ..SimConfig::default()
    }
}

#[test]
fn test_main_run_rests_and_control_does_not() {
    let result = simulate_with_comparison(config(), &process());

    assert_eq!(result.status, SimulationStatus::Completed);
    // Main run: H1 [0,10], rest [10,13], H2 waits then runs [13,23],
    // final rest closes at 26.
    assert_eq!(result.human_factors_stats.rest_events_count, 2);
    assert_eq!(result.human_factors_stats.total_rest_time, 6.0);
    assert_eq!(result.avg_cycle_time, 23.0);
    assert_eq!(result.sim_duration, 26.0);

    let control = result.no_rest_comparison.expect("comparison attached");
    assert_eq!(control.engines_completed, 1);
    assert_eq!(control.avg_cycle_time, 20.0, "no rests: 10 + 10 back to back");
    assert_eq!(control.sim_duration, 20.0);
    assert_eq!(control.avg_worker_utilization, 1.0);
    assert_eq!(control.first_pass_rate, 1.0);
}

#[test]
fn test_rest_shows_up_only_in_the_main_timeline() {
    let result = simulate_with_comparison(config(), &process());
    let rests = result
        .events
        .iter()
        .filter(|e| e.event_type == EventType::Rest)
        .count();
    assert_eq!(rests, 2, "main timeline keeps its rest events");
}

#[test]
fn test_comparison_skipped_on_failure() {
    let bad = SimConfig {
        num_workers: 0,
        ..config()
    };
    let result = simulate_with_comparison(bad, &process());
    assert_eq!(result.status, SimulationStatus::Failed);
    assert!(result.no_rest_comparison.is_none());
}
