//! # pmu-partition
//!
//! Split a list of hardware performance events into groups that can be
//! counted together in a single run.
//!
//! A PMU has a handful of counters and a web of scheduling constraints that
//! no one writes down. This crate treats the hardware as a black-box
//! [`EventOracle`]: given a candidate set of events, it measures them once
//! and reports whether every event was actually counted. A greedy first-fit
//! search then carves the event list into oracle-verified partitions,
//! keeping the number of oracle calls bounded:
//!
//! - each round only enumerates subsets of a leading *window* of the
//!   remaining events, sized so the number of candidates stays under a
//!   combination ceiling;
//! - rounds that find nothing reshuffle the remaining events, and after too
//!   many of them the group size shrinks;
//! - events that fail even as single-event groups are reported as residue
//!   instead of looping forever.
//!
//! ## Quick Start
//!
//! ```
//! use pmu_partition::{events, Event, FnOracle, Partitioner};
//!
//! // Stand-in for real hardware: at most three events at once.
//! let oracle = FnOracle::new("three-counters", |c: &[Event]| Ok(c.len() <= 3));
//!
//! let report = Partitioner::new(oracle)
//!     .max_group_size(3)
//!     .seed(1)
//!     .partition(&events(["PAPI_TOT_CYC", "PAPI_TOT_INS", "PAPI_L1_DCM", "PAPI_L2_DCM"]))
//!     .unwrap();
//!
//! assert!(report.is_complete());
//! assert_eq!(report.partitions.len(), 2);
//! ```
//!
//! For real hardware, [`ProbeOracle`] runs an instrumented binary under the
//! PAPI high-level API, and [`inventory::query_papi_avail`] lists the events
//! and counter count to feed it.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod error;
mod types;

// Functional modules
pub mod conflicts;
pub mod inventory;
pub mod oracle;
pub mod output;
pub mod partitioner;
pub mod subsets;
pub mod window;

// Re-exports for public API
pub use config::{
    Config, DEFAULT_COMBINATION_CEILING, DEFAULT_MAX_GROUP_SIZE, DEFAULT_SHUFFLE_LIMIT,
};
pub use error::{InputError, InventoryError, OracleError, PartitionError};
pub use oracle::{EventOracle, FnOracle, OracleCall, ProbeOracle, ProbeReport, RecordingOracle};
pub use partitioner::{partition_events, Backoff, Partitioner, SearchState};
pub use subsets::{enumerate_subsets, Subsets};
pub use types::{events, Event, Partition, PartitionReport, RoundRecord, RunStats};
pub use window::{binomial, estimate_window};

#[cfg(all(feature = "perf", target_os = "linux"))]
pub use oracle::PerfGroupOracle;
