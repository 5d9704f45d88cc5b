//! Pairwise conflict discovery.
//!
//! Probes every unordered pair of events once and records the pairs the
//! oracle rejects. The result is a quick picture of mutual-exclusion
//! constraints on a PMU, useful for explaining why some events never share a
//! partition. It costs `n * (n - 1) / 2` oracle calls.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::OracleError;
use crate::oracle::EventOracle;
use crate::types::Event;

/// Symmetric map from each event to the events it cannot be counted with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConflictMap {
    conflicts: BTreeMap<Event, BTreeSet<Event>>,
}

impl ConflictMap {
    fn insert(&mut self, a: &Event, b: &Event) {
        self.conflicts
            .entry(a.clone())
            .or_default()
            .insert(b.clone());
        self.conflicts
            .entry(b.clone())
            .or_default()
            .insert(a.clone());
    }

    /// Whether `a` and `b` were rejected as a pair.
    pub fn conflicting(&self, a: &Event, b: &Event) -> bool {
        self.conflicts.get(a).is_some_and(|set| set.contains(b))
    }

    /// Events that conflict with `event`.
    pub fn conflicts_of(&self, event: &Event) -> impl Iterator<Item = &Event> {
        self.conflicts.get(event).into_iter().flatten()
    }

    /// Every conflicting pair once, smaller event first.
    pub fn pairs(&self) -> Vec<(Event, Event)> {
        self.conflicts
            .iter()
            .flat_map(|(a, set)| set.iter().filter(move |b| a < *b).map(move |b| (a.clone(), b.clone())))
            .collect()
    }

    /// Number of events with at least one conflict.
    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    /// Whether no conflict was found.
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// Probe every unordered pair in `events` and collect the rejected ones.
///
/// # Errors
///
/// Stops at the first [`OracleError`].
pub fn find_conflicts<O: EventOracle + ?Sized>(
    events: &[Event],
    oracle: &O,
) -> Result<ConflictMap, OracleError> {
    let mut map = ConflictMap::default();
    for (i, a) in events.iter().enumerate() {
        for b in &events[i + 1..] {
            if a == b {
                continue;
            }
            let pair = [a.clone(), b.clone()];
            if !oracle.measure_together(&pair)? {
                tracing::debug!("conflict: {} / {}", a, b);
                map.insert(a, b);
            }
        }
    }
    tracing::info!(
        "{} of {} events have at least one conflict",
        map.len(),
        events.len()
    );
    Ok(map)
}
