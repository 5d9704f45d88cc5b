//! Per-run search state and the stagnation backoff policy.
//!
//! A round that accepts nothing reshuffles the remaining events so the next
//! round searches a different window. After `shuffle_limit + 1` consecutive
//! rounds without progress the group size shrinks by one. The group size
//! only shrinks on stagnation and stops at zero, which bounds the run.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::Config;
use crate::types::Event;

/// What the backoff controller did after a stagnated round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Remaining events were reordered; the group size is unchanged.
    Shuffled {
        /// Consecutive stagnated rounds at the current group size.
        stagnation: usize,
    },
    /// Remaining events were reordered and the group size shrank.
    Shrunk {
        /// New maximum group size.
        to: usize,
    },
}

/// Mutable state of one partitioning run.
#[derive(Debug, Clone)]
pub struct SearchState {
    remaining: Vec<Event>,
    ceiling: usize,
    max_group_size: usize,
    stagnation: usize,
    shuffle_limit: usize,
    restore_after_success: bool,
}

impl SearchState {
    /// Fresh state over a copy of `universe`.
    pub fn new(universe: &[Event], config: &Config) -> Self {
        Self {
            remaining: universe.to_vec(),
            ceiling: config.max_group_size,
            max_group_size: config.max_group_size,
            stagnation: 0,
            shuffle_limit: config.shuffle_limit,
            restore_after_success: config.restore_after_success,
        }
    }

    /// Events not yet placed, in current search order.
    pub fn remaining(&self) -> &[Event] {
        &self.remaining
    }

    /// Current maximum group size.
    pub fn max_group_size(&self) -> usize {
        self.max_group_size
    }

    /// Consecutive stagnated rounds at the current group size.
    pub fn stagnation(&self) -> usize {
        self.stagnation
    }

    /// Size of the subsets to try next round.
    pub fn group_size(&self) -> usize {
        self.remaining.len().min(self.max_group_size)
    }

    /// All events have been placed.
    pub fn is_done(&self) -> bool {
        self.remaining.is_empty()
    }

    /// The group size has reached zero; nothing more can be placed.
    pub fn is_exhausted(&self) -> bool {
        self.max_group_size == 0
    }

    /// Record an accepted subset.
    pub fn accept(&mut self, subset: &[Event]) {
        self.remaining.retain(|e| !subset.contains(e));
        self.stagnation = 0;
        if self.restore_after_success && self.max_group_size < self.ceiling {
            tracing::debug!(
                "restoring max group size {} -> {}",
                self.max_group_size,
                self.ceiling
            );
            self.max_group_size = self.ceiling;
        }
    }

    /// Record a round without progress and apply the backoff policy.
    ///
    /// The maximum drops by exactly one, even when fewer events remain than
    /// the maximum and the searched size therefore stays the same.
    pub fn stagnate<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Backoff {
        self.remaining.shuffle(rng);
        self.stagnation += 1;
        if self.stagnation <= self.shuffle_limit {
            return Backoff::Shuffled {
                stagnation: self.stagnation,
            };
        }
        self.stagnation = 0;
        self.max_group_size = self.max_group_size.saturating_sub(1);
        Backoff::Shrunk {
            to: self.max_group_size,
        }
    }

    /// Consume the state, returning the unplaced events.
    pub fn into_residue(self) -> Vec<Event> {
        self.remaining
    }
}
