//! Report formatting through the public API.

use pmu_partition::output::{format_report, to_json, to_json_pretty};
use pmu_partition::{events, Event, FnOracle, Partitioner};

fn report_with_residue() -> pmu_partition::PartitionReport {
    let oracle = FnOracle::new("no-x", |c: &[Event]| {
        Ok(c.len() <= 2 && c.iter().all(|e| e.name() != "X"))
    });
    Partitioner::new(oracle)
        .max_group_size(2)
        .seed(3)
        .partition(&events(["A", "B", "X", "C"]))
        .unwrap()
}

#[test]
fn terminal_report_lists_partitions_and_residue() {
    colored::control::set_override(false);
    let text = format_report(&report_with_residue());
    assert!(text.contains("UNRESOLVED EVENTS"));
    assert!(text.contains("A, B"));
    assert!(text.contains("Residue:"));
    assert!(text.lines().any(|l| l.trim_matches(|c: char| c == '\u{2502}' || c == ' ') == "X"));
}

#[test]
fn json_report_is_machine_readable() {
    let report = report_with_residue();
    let value: serde_json::Value = serde_json::from_str(&to_json(&report).unwrap()).unwrap();
    assert_eq!(value["residue"], serde_json::json!(["X"]));
    assert_eq!(value["partitions"][0], serde_json::json!(["A", "B"]));
    // 2 -> 1 for the {X, C} pair, then 2 -> 1 -> 0 for X alone
    assert_eq!(value["stats"]["shrinks"], 3);
    assert!(value["rounds"].as_array().is_some_and(|r| !r.is_empty()));

    let pretty = to_json_pretty(&report).unwrap();
    assert!(pretty.lines().count() > 1);
}
