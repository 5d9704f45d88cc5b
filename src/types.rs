//! Core data types: events, partitions, and run reports.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A named hardware-measurable quantity, e.g. `PAPI_TOT_CYC` or `cycles`.
///
/// Events are opaque to the partitioner; only equality matters. The name is
/// reference-counted so that copying an event into many candidate subsets
/// does not allocate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(Arc<str>);

impl Event {
    /// Create an event from its name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The event name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Event {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Event {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl AsRef<str> for Event {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Event {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Build an event list from anything string-like.
///
/// ```
/// use pmu_partition::events;
/// let universe = events(["PAPI_TOT_CYC", "PAPI_TOT_INS"]);
/// assert_eq!(universe.len(), 2);
/// ```
pub fn events<I, S>(names: I) -> Vec<Event>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names.into_iter().map(Event::new).collect()
}

/// One group of events the oracle accepted as jointly measurable.
///
/// The events are stored in the order they were handed to the oracle. A
/// partition is never modified after it has been accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Partition {
    events: Vec<Event>,
}

impl Partition {
    pub(crate) fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    /// Events in this partition.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Number of events in this partition.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the partition holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether `event` is part of this partition.
    pub fn contains(&self, event: &Event) -> bool {
        self.events.contains(event)
    }

    /// Event names, in oracle order.
    pub fn names(&self) -> Vec<&str> {
        self.events.iter().map(Event::name).collect()
    }
}

impl<'a> IntoIterator for &'a Partition {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Counters collected over one partitioning run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Total search rounds.
    pub rounds: usize,
    /// Rounds in which no candidate was accepted.
    pub stagnated_rounds: usize,
    /// Times the maximum group size was decremented.
    pub shrinks: usize,
    /// Oracle calls whose verdict was used (abandoned parallel probes excluded).
    pub oracle_calls: usize,
    /// Oracle calls that accepted their candidate.
    pub accepted_calls: usize,
    /// Oracle calls that rejected their candidate.
    pub rejected_calls: usize,
    /// Wall-clock time spent in the run.
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
}

/// What happened in a single search round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Zero-based round index.
    pub round: usize,
    /// Maximum group size in effect at the start of the round.
    pub max_group_size: usize,
    /// Size of the candidate subsets enumerated this round.
    pub group_size: usize,
    /// Number of leading remaining events searched.
    pub window: usize,
    /// Candidates whose verdict was consumed this round.
    pub candidates_evaluated: usize,
    /// Accepted subset, if the round made progress.
    pub accepted: Option<Vec<Event>>,
    /// Whether the round ended with a group-size decrement.
    pub shrank: bool,
}

/// Result of a partitioning run.
///
/// A run that could not place every event still returns the partitions it
/// found; the unplaced events are listed in [`residue`](Self::residue).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionReport {
    /// Accepted partitions, in discovery order.
    pub partitions: Vec<Partition>,
    /// Events that could not be placed before the group size reached zero.
    pub residue: Vec<Event>,
    /// Run counters.
    pub stats: RunStats,
    /// Per-round trace.
    pub rounds: Vec<RoundRecord>,
}

impl PartitionReport {
    /// Whether every input event was placed.
    pub fn is_complete(&self) -> bool {
        self.residue.is_empty()
    }

    /// Number of events placed in partitions.
    pub fn placed_events(&self) -> usize {
        self.partitions.iter().map(Partition::len).sum()
    }

    /// Index of the partition containing `event`.
    pub fn partition_of(&self, event: &Event) -> Option<usize> {
        self.partitions.iter().position(|p| p.contains(event))
    }

    /// Largest partition size.
    pub fn largest_partition(&self) -> usize {
        self.partitions.iter().map(Partition::len).max().unwrap_or(0)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(serde::de::Error::custom("duration must be a non-negative number"));
        }
        Ok(Duration::from_secs_f64(secs))
    }
}
