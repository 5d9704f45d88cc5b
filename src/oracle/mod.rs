//! The measurement oracle: decides whether a set of events can be counted
//! together on the target hardware.
//!
//! The partitioner treats the oracle as a black box that returns a verdict
//! per candidate. Verdicts are expensive (each one is a real measurement
//! session), so the search calls the oracle as little as its first-fit
//! policy allows.
//!
//! Two implementations ship with the crate:
//! - [`ProbeOracle`]: runs an instrumented probe binary under the PAPI
//!   high-level API and checks its JSON report.
//! - `PerfGroupOracle` (feature `perf`, Linux): opens a `perf_event` group
//!   and checks that every member was scheduled for the whole run.

use std::sync::Mutex;

use crate::error::OracleError;
use crate::types::Event;

pub mod probe;

#[cfg(all(feature = "perf", target_os = "linux"))]
pub mod perf;

pub use probe::{ProbeOracle, ProbeReport};

#[cfg(all(feature = "perf", target_os = "linux"))]
pub use perf::PerfGroupOracle;

/// Decides whether a candidate set of events is jointly measurable.
///
/// # Contract
///
/// - `Ok(true)`: every event in `candidate` was scheduled and produced data.
/// - `Ok(false)`: the candidate is rejected. This is the normal search
///   signal, not an error.
/// - `Err(_)`: the oracle cannot be used at all. The run is aborted.
///
/// Implementations must tolerate concurrent calls for *different*
/// candidates. The partitioner never issues two concurrent calls for the
/// same candidate.
pub trait EventOracle: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Measure `candidate` once and report whether all of it was counted.
    fn measure_together(&self, candidate: &[Event]) -> Result<bool, OracleError>;
}

impl<O: EventOracle + ?Sized> EventOracle for &O {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn measure_together(&self, candidate: &[Event]) -> Result<bool, OracleError> {
        (**self).measure_together(candidate)
    }
}

impl<O: EventOracle + ?Sized> EventOracle for Box<O> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn measure_together(&self, candidate: &[Event]) -> Result<bool, OracleError> {
        (**self).measure_together(candidate)
    }
}

impl<O: EventOracle + ?Sized> EventOracle for std::sync::Arc<O> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn measure_together(&self, candidate: &[Event]) -> Result<bool, OracleError> {
        (**self).measure_together(candidate)
    }
}

/// Oracle backed by a closure.
///
/// ```
/// use pmu_partition::{Event, EventOracle, FnOracle};
/// let at_most_two = FnOracle::new("at-most-two", |c: &[Event]| Ok(c.len() <= 2));
/// assert_eq!(at_most_two.name(), "at-most-two");
/// ```
pub struct FnOracle<F> {
    name: String,
    f: F,
}

impl<F> FnOracle<F>
where
    F: Fn(&[Event]) -> Result<bool, OracleError> + Send + Sync,
{
    /// Wrap `f` under `name`.
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> EventOracle for FnOracle<F>
where
    F: Fn(&[Event]) -> Result<bool, OracleError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn measure_together(&self, candidate: &[Event]) -> Result<bool, OracleError> {
        (self.f)(candidate)
    }
}

impl<F> std::fmt::Debug for FnOracle<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnOracle").field("name", &self.name).finish()
    }
}

/// One recorded oracle call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleCall {
    /// Candidate exactly as passed to the oracle.
    pub candidate: Vec<Event>,
    /// Verdict, or `None` if the oracle returned an error.
    pub verdict: Option<bool>,
}

/// Wraps an oracle and records every call in the order it completed.
///
/// Useful for auditing a run: every returned partition has a matching
/// accepted call.
#[derive(Debug)]
pub struct RecordingOracle<O> {
    inner: O,
    calls: Mutex<Vec<OracleCall>>,
}

impl<O: EventOracle> RecordingOracle<O> {
    /// Record calls made to `inner`.
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the calls so far.
    pub fn calls(&self) -> Vec<OracleCall> {
        self.calls.lock().expect("oracle call log poisoned").clone()
    }

    /// Number of calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("oracle call log poisoned").len()
    }

    /// Whether some call for exactly `candidate` returned true.
    pub fn was_accepted(&self, candidate: &[Event]) -> bool {
        self.calls
            .lock()
            .expect("oracle call log poisoned")
            .iter()
            .any(|c| c.verdict == Some(true) && c.candidate == candidate)
    }

    /// Unwrap the inner oracle.
    pub fn into_inner(self) -> O {
        self.inner
    }
}

impl<O: EventOracle> EventOracle for RecordingOracle<O> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn measure_together(&self, candidate: &[Event]) -> Result<bool, OracleError> {
        let result = self.inner.measure_together(candidate);
        self.calls
            .lock()
            .expect("oracle call log poisoned")
            .push(OracleCall {
                candidate: candidate.to_vec(),
                verdict: result.as_ref().ok().copied(),
            });
        result
    }
}
