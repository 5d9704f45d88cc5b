//! Pairwise conflict discovery through the public API.

use pmu_partition::conflicts::find_conflicts;
use pmu_partition::{events, Event, FnOracle, OracleError};

#[test]
fn conflicts_explain_partition_splits() {
    let universe = events(["PAPI_TOT_CYC", "PAPI_FP_OPS", "PAPI_VEC_INS", "PAPI_L1_DCM"]);
    // floating point and vector counters share one programmable counter
    let oracle = FnOracle::new("shared-counter", |c: &[Event]| {
        let fp = c.iter().filter(|e| e.name() == "PAPI_FP_OPS" || e.name() == "PAPI_VEC_INS");
        Ok(fp.count() <= 1)
    });

    let map = find_conflicts(&universe, &oracle).unwrap();
    let pairs: Vec<(String, String)> = map
        .pairs()
        .into_iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();
    assert_eq!(
        pairs,
        [("PAPI_FP_OPS".to_string(), "PAPI_VEC_INS".to_string())]
    );
    assert_eq!(map.conflicts_of(&Event::new("PAPI_TOT_CYC")).count(), 0);
}

#[test]
fn oracle_errors_propagate() {
    let oracle = FnOracle::new("down", |_: &[Event]| Err(OracleError::unavailable("down", "no pmu")));
    assert!(find_conflicts(&events(["A", "B"]), &oracle).is_err());
}

#[test]
fn fewer_than_two_events_need_no_probes() {
    let oracle = FnOracle::new("unused", |_: &[Event]| -> Result<bool, OracleError> {
        panic!("oracle must not be called")
    });
    assert!(find_conflicts(&events(["A"]), &oracle).unwrap().is_empty());
    assert!(find_conflicts(&[], &oracle).unwrap().is_empty());
}
