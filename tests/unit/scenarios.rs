//! End-to-end partitioning scenarios against in-memory oracles.

use std::collections::HashSet;

use pmu_partition::{
    events, partition_events, Config, Event, EventOracle, FnOracle, OracleError, PartitionError,
    PartitionReport, Partitioner, RecordingOracle,
};

fn has(candidate: &[Event], name: &str) -> bool {
    candidate.iter().any(|e| e.name() == name)
}

fn assert_disjoint_cover(report: &PartitionReport, universe: &[Event]) {
    let mut seen = HashSet::new();
    for event in report.partitions.iter().flatten().chain(&report.residue) {
        assert!(seen.insert(event.clone()), "{} placed twice", event);
    }
    let expected: HashSet<Event> = universe.iter().cloned().collect();
    assert_eq!(seen, expected);
}

// =============================================================================
// REFERENCE SCENARIOS
// =============================================================================

#[test]
fn pairs_avoid_conflicting_events() {
    let universe = events(["A", "B", "C", "D"]);
    let oracle = RecordingOracle::new(FnOracle::new("no-ab", |c: &[Event]| {
        Ok(c.len() <= 2 && !(has(c, "A") && has(c, "B")))
    }));

    let report = Partitioner::new(&oracle)
        .max_group_size(2)
        .seed(11)
        .partition(&universe)
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.partitions.len(), 2);
    assert_eq!(report.partitions[0].names(), ["A", "C"]);
    assert_eq!(report.partitions[1].names(), ["B", "D"]);
    assert_ne!(
        report.partition_of(&Event::new("A")),
        report.partition_of(&Event::new("B"))
    );
    assert_disjoint_cover(&report, &universe);
}

#[test]
fn unmeasurable_singleton_becomes_residue() {
    let universe = events(["X"]);
    let oracle = RecordingOracle::new(FnOracle::new("never", |_: &[Event]| Ok(false)));

    let report = Partitioner::new(&oracle)
        .max_group_size(4)
        .seed(0)
        .partition(&universe)
        .unwrap();

    assert!(report.partitions.is_empty());
    assert_eq!(report.residue, universe);
    // the maximum steps 4 -> 3 -> 2 -> 1 -> 0, one step per
    // shuffle_limit + 1 failed singleton attempts
    assert_eq!(oracle.call_count(), 16);
    assert_eq!(report.stats.shrinks, 4);
    assert_eq!(report.stats.stagnated_rounds, 16);
    let shrink_rounds: Vec<usize> = report
        .rounds
        .iter()
        .filter(|r| r.shrank)
        .map(|r| r.round)
        .collect();
    assert_eq!(shrink_rounds, [3, 7, 11, 15]);
}

#[test]
fn ten_events_three_counters() {
    let universe = events((0..10).map(|i| format!("E{i}")));
    let oracle = FnOracle::new("three", |c: &[Event]| Ok(c.len() <= 3));

    let report = partition_events(&universe, &oracle, Config::with_max_group_size(3)).unwrap();

    assert!(report.is_complete());
    assert_eq!(report.partitions.len(), 4);
    assert!(report.partitions.iter().all(|p| p.len() <= 3));
    assert_eq!(report.placed_events(), 10);
    assert_disjoint_cover(&report, &universe);
}

#[test]
fn whole_universe_accepted_at_once() {
    let universe = events(["A", "B", "C"]);
    let oracle = RecordingOracle::new(FnOracle::new("all", |_: &[Event]| Ok(true)));

    let report = Partitioner::new(&oracle)
        .max_group_size(3)
        .partition(&universe)
        .unwrap();

    assert_eq!(report.partitions.len(), 1);
    assert_eq!(report.partitions[0].names(), ["A", "B", "C"]);
    assert_eq!(oracle.call_count(), 1);
    assert_eq!(report.stats.rounds, 1);
}

// =============================================================================
// ERRORS AND RESIDUE
// =============================================================================

#[test]
fn unavailable_oracle_aborts_the_run() {
    let oracle = RecordingOracle::new(FnOracle::new("broken", |_: &[Event]| {
        Err(OracleError::unavailable("broken", "probe binary missing"))
    }));

    let err = Partitioner::new(&oracle)
        .partition(&events(["A", "B"]))
        .unwrap_err();

    assert!(matches!(err, PartitionError::OracleUnavailable(_)));
    assert!(err.to_string().contains("probe binary missing"));
    assert_eq!(oracle.call_count(), 1);
}

#[test]
fn poisoned_event_is_reported_not_dropped() {
    let universe = events(["A", "B", "POISON", "C", "D"]);
    let oracle = FnOracle::new("poison", |c: &[Event]| Ok(c.len() <= 2 && !has(c, "POISON")));

    for seed in 0..5 {
        let report = Partitioner::new(&oracle)
            .max_group_size(2)
            .seed(seed)
            .partition(&universe)
            .unwrap();
        assert_eq!(report.residue, events(["POISON"]), "seed {seed}");
        assert_eq!(report.placed_events(), 4);
        assert_disjoint_cover(&report, &universe);
    }
}

#[test]
fn every_partition_was_accepted_verbatim() {
    let universe = events(["A", "B", "C", "D", "E", "F", "G"]);
    let oracle = RecordingOracle::new(FnOracle::new("conflicts", |c: &[Event]| {
        Ok(c.len() <= 3 && !(has(c, "A") && has(c, "D")) && !(has(c, "B") && has(c, "E")))
    }));

    let report = Partitioner::new(&oracle)
        .max_group_size(3)
        .seed(5)
        .partition(&universe)
        .unwrap();

    assert!(report.is_complete());
    for partition in &report.partitions {
        assert!(oracle.was_accepted(partition.events()));
    }
    assert_eq!(report.stats.oracle_calls, oracle.call_count());
    assert_eq!(report.stats.accepted_calls, report.partitions.len());
}

#[test]
fn same_seed_same_run() {
    let universe = events((0..9).map(|i| format!("E{i}")));
    // E0 and E1 fit nowhere together with anything else
    let oracle = FnOracle::new("picky", |c: &[Event]| {
        Ok(c.len() <= 3 && (c.len() == 1 || !(has(c, "E0") || has(c, "E1"))))
    });

    let run = |seed| {
        Partitioner::new(&oracle)
            .max_group_size(3)
            .seed(seed)
            .partition(&universe)
            .unwrap()
    };
    let first = run(99);
    let second = run(99);
    assert_eq!(first.partitions, second.partitions);
    assert_eq!(first.rounds, second.rounds);
}

#[test]
fn narrow_window_reaches_pair_outside_it() {
    let universe = events((0..6).map(|i| format!("E{i}")));
    // singles always fit; the only pair that fits is {E4, E5}
    let oracle = RecordingOracle::new(FnOracle::new("tail-pair", |c: &[Event]| {
        Ok(c.len() == 1 || (c.len() == 2 && has(c, "E4") && has(c, "E5")))
    }));

    // C(3, 2) = 3 < 4 <= C(4, 2): each round searches the first 3 events
    let report = Partitioner::new(&oracle)
        .max_group_size(2)
        .combination_ceiling(4)
        .shuffle_limit(50)
        .seed(21)
        .partition(&universe)
        .unwrap();

    let first = &report.rounds[0];
    assert_eq!(first.window, 3);
    assert_eq!(first.candidates_evaluated, 3);
    assert!(first.accepted.is_none());
    let leading = &universe[..3];
    for call in oracle.calls().iter().take(3) {
        assert!(call.candidate.iter().all(|e| leading.contains(e)));
    }

    assert!(report.is_complete());
    let pair = report
        .partitions
        .iter()
        .find(|p| p.len() == 2)
        .expect("the E4/E5 pair is found once shuffled into the window");
    assert!(pair.contains(&Event::new("E4")) && pair.contains(&Event::new("E5")));
    assert!(report.rounds.iter().all(|r| r.window <= 3));
    assert_disjoint_cover(&report, &universe);
}

#[test]
fn boxed_oracles_work() {
    let oracle: Box<dyn EventOracle> = Box::new(FnOracle::new("two", |c: &[Event]| Ok(c.len() <= 2)));
    let report = Partitioner::new(oracle)
        .max_group_size(2)
        .partition(&events(["A", "B", "C"]))
        .unwrap();
    assert_eq!(report.partitions.len(), 2);
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_probes_match_sequential_winner() {
    let universe = events((0..8).map(|i| format!("E{i}")));
    // only subsets holding E7 and E3 together with a third event fit
    let oracle = FnOracle::new("needle", |c: &[Event]| {
        Ok(c.len() <= 2 || (has(c, "E7") && has(c, "E3")))
    });

    let run = |probes| {
        Partitioner::new(&oracle)
            .max_group_size(3)
            .parallel_probes(probes)
            .seed(4)
            .partition(&universe)
            .unwrap()
    };
    let sequential = run(1);
    let parallel = run(4);
    assert_eq!(sequential.partitions, parallel.partitions);
    assert_eq!(sequential.partitions[0].names(), ["E0", "E3", "E7"]);
}
