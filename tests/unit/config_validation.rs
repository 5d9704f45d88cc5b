//! Tests for configuration validation.
//!
//! Nonsensical tunables and inputs are rejected as malformed input before
//! the first oracle call, whether they come from the builder or a `Config`.

use pmu_partition::{
    events, Config, Event, FnOracle, InputError, PartitionError, Partitioner, RecordingOracle,
};

fn accept_all() -> RecordingOracle<impl pmu_partition::EventOracle> {
    RecordingOracle::new(FnOracle::new("accept-all", |_: &[Event]| Ok(true)))
}

// =============================================================================
// BUILDER VALUES
// =============================================================================

#[test]
fn combination_ceiling_zero_rejected_before_oracle_calls() {
    let oracle = accept_all();
    let err = Partitioner::new(&oracle)
        .combination_ceiling(0)
        .partition(&events(["A", "B"]))
        .unwrap_err();
    assert!(matches!(
        err,
        PartitionError::MalformedInput(InputError::ZeroCombinationCeiling)
    ));
    assert_eq!(oracle.call_count(), 0);
}

#[test]
fn combination_ceiling_one_valid() {
    let partitioner = Partitioner::new(accept_all()).combination_ceiling(1);
    assert_eq!(partitioner.config().combination_ceiling, 1);
}

#[test]
fn parallel_probes_zero_rejected_before_oracle_calls() {
    let oracle = accept_all();
    let err = Partitioner::new(&oracle)
        .parallel_probes(0)
        .partition(&events(["A"]))
        .unwrap_err();
    assert!(matches!(
        err,
        PartitionError::MalformedInput(InputError::ZeroParallelProbes)
    ));
    assert_eq!(oracle.call_count(), 0);
}

#[test]
fn builder_values_land_in_config() {
    let partitioner = Partitioner::new(accept_all())
        .max_group_size(6)
        .shuffle_limit(5)
        .restore_after_success(false)
        .parallel_probes(3)
        .seed(42);
    let config = partitioner.config();
    assert_eq!(config.max_group_size, 6);
    assert_eq!(config.shuffle_limit, 5);
    assert!(!config.restore_after_success);
    assert_eq!(config.parallel_probes, 3);
    assert_eq!(config.seed, Some(42));
}

// =============================================================================
// MALFORMED INPUT
// =============================================================================

#[test]
fn zero_max_group_size_rejected_before_oracle_calls() {
    let oracle = accept_all();
    let err = Partitioner::new(&oracle)
        .max_group_size(0)
        .partition(&events(["A", "B"]))
        .unwrap_err();
    assert!(matches!(
        err,
        PartitionError::MalformedInput(InputError::ZeroCeiling)
    ));
    assert_eq!(oracle.call_count(), 0);
}

#[test]
fn duplicate_events_rejected_before_oracle_calls() {
    let oracle = accept_all();
    let err = Partitioner::new(&oracle)
        .partition(&events(["A", "B", "A"]))
        .unwrap_err();
    match err {
        PartitionError::MalformedInput(InputError::DuplicateEvent(e)) => assert_eq!(e.name(), "A"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(oracle.call_count(), 0);
}

#[test]
fn zero_values_in_config_struct_rejected() {
    let config = Config {
        parallel_probes: 0,
        ..Config::default()
    };
    let err = Partitioner::with_config(accept_all(), config)
        .partition(&events(["A"]))
        .unwrap_err();
    assert_eq!(err.to_string(), "malformed input: parallel probe count must be > 0");
}

// =============================================================================
// SERDE
// =============================================================================

#[test]
fn config_deserializes_with_defaults_for_missing_fields() {
    let config: Config = serde_json::from_str(r#"{"max_group_size": 8, "seed": 3}"#).unwrap();
    assert_eq!(config.max_group_size, 8);
    assert_eq!(config.seed, Some(3));
    assert_eq!(config.combination_ceiling, pmu_partition::DEFAULT_COMBINATION_CEILING);
    assert_eq!(config.shuffle_limit, pmu_partition::DEFAULT_SHUFFLE_LIMIT);
}
