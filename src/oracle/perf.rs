//! Linux `perf_event` group oracle.
//!
//! Opens every candidate event as a member of one counter group, runs a
//! short busy loop, and checks that the kernel kept the whole group on the
//! PMU for the entire enabled interval. A group that does not fit the
//! hardware is either never scheduled or multiplexed, and in both cases
//! `time_running` falls short of `time_enabled`. Every member must also
//! show up in the group read.
//!
//! # Requirements
//!
//! - Linux with perf_event support
//! - `kernel.perf_event_paranoid <= 2`, `CAP_PERFMON`, or root
//! - Enable with `--features perf`
//!
//! Only the generic hardware events are understood. Names follow
//! `perf list`: `cycles`, `instructions`, `cache-references`,
//! `cache-misses`, `branches`, `branch-misses`, `bus-cycles`,
//! `ref-cycles`, `stalled-cycles-frontend`, `stalled-cycles-backend`.

use std::io;

use perf_event2::events::Hardware;
use perf_event2::{Builder, Counter, Group};

use super::EventOracle;
use crate::error::OracleError;
use crate::types::Event;

/// Iterations of the busy loop run while the group is enabled.
const WORKLOAD_ITERATIONS: u64 = 200_000;

/// Map a `perf list` style name to a generic hardware event.
pub fn hardware_event(name: &str) -> Option<Hardware> {
    let event = match name {
        "cycles" | "cpu-cycles" => Hardware::CPU_CYCLES,
        "instructions" => Hardware::INSTRUCTIONS,
        "cache-references" => Hardware::CACHE_REFERENCES,
        "cache-misses" => Hardware::CACHE_MISSES,
        "branches" | "branch-instructions" => Hardware::BRANCH_INSTRUCTIONS,
        "branch-misses" => Hardware::BRANCH_MISSES,
        "bus-cycles" => Hardware::BUS_CYCLES,
        "ref-cycles" => Hardware::REF_CPU_CYCLES,
        "stalled-cycles-frontend" => Hardware::STALLED_CYCLES_FRONTEND,
        "stalled-cycles-backend" => Hardware::STALLED_CYCLES_BACKEND,
        _ => return None,
    };
    Some(event)
}

/// Oracle that checks group scheduling through `perf_event_open`.
#[derive(Debug, Clone, Default)]
pub struct PerfGroupOracle {
    _private: (),
}

impl PerfGroupOracle {
    /// Create the oracle.
    pub fn new() -> Self {
        Self::default()
    }

    fn open_failure(&self, err: io::Error, what: &str) -> Result<bool, OracleError> {
        if err.kind() == io::ErrorKind::PermissionDenied {
            return Err(OracleError::unavailable_io(
                self.name(),
                "perf_event_open denied; need CAP_PERFMON or perf_event_paranoid <= 2",
                err,
            ));
        }
        tracing::debug!("perf {} failed: {}; rejecting candidate", what, err);
        Ok(false)
    }
}

impl EventOracle for PerfGroupOracle {
    fn name(&self) -> &str {
        "perf-group"
    }

    fn measure_together(&self, candidate: &[Event]) -> Result<bool, OracleError> {
        let mut kinds = Vec::with_capacity(candidate.len());
        for event in candidate {
            match hardware_event(event.name()) {
                Some(kind) => kinds.push(kind),
                None => {
                    tracing::debug!("unknown perf event '{}'; rejecting candidate", event);
                    return Ok(false);
                }
            }
        }

        let mut group = match Group::new() {
            Ok(group) => group,
            Err(e) => return self.open_failure(e, "group creation"),
        };
        // members leave the group when their Counter is dropped
        let mut members: Vec<Counter> = Vec::with_capacity(kinds.len());
        for kind in kinds {
            match group.add(&Builder::new(kind)) {
                Ok(counter) => members.push(counter),
                Err(e) => return self.open_failure(e, "counter open"),
            }
        }

        if let Err(e) = group.enable() {
            return self.open_failure(e, "group enable");
        }
        let mut acc: u64 = 1;
        for _ in 0..WORKLOAD_ITERATIONS {
            acc = std::hint::black_box(acc.wrapping_mul(6364136223846793005).wrapping_add(1));
        }
        if let Err(e) = group.disable() {
            return self.open_failure(e, "group disable");
        }

        let data = match group.read() {
            Ok(data) => data,
            Err(e) => return self.open_failure(e, "group read"),
        };

        let missing = members.iter().filter(|m| data.get(m).is_none()).count();
        let scheduled = match (data.time_enabled(), data.time_running()) {
            (Some(enabled), Some(running)) => !running.is_zero() && running == enabled,
            _ => false,
        };
        tracing::debug!(
            "perf group of {} events: enabled={:?} running={:?} missing={}",
            members.len(),
            data.time_enabled(),
            data.time_running(),
            missing
        );
        Ok(scheduled && missing == 0)
    }
}
