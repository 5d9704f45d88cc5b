//! Greedy first-fit event partitioner.
//!
//! Each round searches a bounded leading window of the remaining events for
//! a subset the oracle accepts, and takes the first one in enumeration
//! order. Rounds that find nothing hand control to the backoff controller,
//! which reshuffles and eventually shrinks the group size. The run ends when
//! every event is placed or the group size reaches zero; in the latter case
//! the unplaced events are returned as residue.
//!
//! First-fit is not optimal: a best-fit search would need far more oracle
//! calls, and every call is a real measurement session.

mod backoff;
mod evaluate;

use std::collections::HashSet;
use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::config::Config;
use crate::error::{InputError, PartitionError};
use crate::oracle::EventOracle;
use crate::subsets::enumerate_subsets;
use crate::types::{Event, Partition, PartitionReport, RoundRecord, RunStats};
use crate::window::estimate_window;

pub use backoff::{Backoff, SearchState};
use evaluate::Evaluator;

/// Partitions events into oracle-verified groups.
///
/// # Example
///
/// ```
/// use pmu_partition::{events, Event, FnOracle, Partitioner};
///
/// // Hardware with two counters where A and B conflict.
/// let oracle = FnOracle::new("two-counters", |c: &[Event]| {
///     let has = |n: &str| c.iter().any(|e| e.name() == n);
///     Ok(c.len() <= 2 && !(has("A") && has("B")))
/// });
///
/// let report = Partitioner::new(oracle)
///     .max_group_size(2)
///     .seed(7)
///     .partition(&events(["A", "B", "C", "D"]))
///     .unwrap();
///
/// assert!(report.is_complete());
/// assert_eq!(report.partitions.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Partitioner<O> {
    oracle: O,
    config: Config,
}

impl<O: EventOracle> Partitioner<O> {
    /// Partitioner with default configuration.
    pub fn new(oracle: O) -> Self {
        Self::with_config(oracle, Config::default())
    }

    /// Partitioner with explicit configuration.
    pub fn with_config(oracle: O, config: Config) -> Self {
        Self { oracle, config }
    }

    /// Set the group-size ceiling (usually the hardware counter count).
    ///
    /// Zero is rejected when the run starts.
    pub fn max_group_size(mut self, n: usize) -> Self {
        self.config.max_group_size = n;
        self
    }

    /// Set the per-round combination ceiling.
    ///
    /// Zero is rejected when the run starts.
    pub fn combination_ceiling(mut self, n: u64) -> Self {
        self.config.combination_ceiling = n;
        self
    }

    /// Set how many consecutive stagnated rounds are tolerated per group size.
    pub fn shuffle_limit(mut self, n: usize) -> Self {
        self.config.shuffle_limit = n;
        self
    }

    /// Restore the full group size after each accepted partition.
    pub fn restore_after_success(mut self, restore: bool) -> Self {
        self.config.restore_after_success = restore;
        self
    }

    /// Set the number of concurrent oracle calls per round.
    ///
    /// Zero is rejected when the run starts.
    pub fn parallel_probes(mut self, n: usize) -> Self {
        self.config.parallel_probes = n;
        self
    }

    /// Seed the shuffle generator.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The oracle.
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Partition `universe`, shuffling with a generator seeded from
    /// `config.seed` (or from entropy when unset).
    pub fn partition(&self, universe: &[Event]) -> Result<PartitionReport, PartitionError> {
        let mut rng = match self.config.seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };
        self.partition_with_rng(universe, &mut rng)
    }

    /// Partition `universe` using `rng` for every shuffle.
    ///
    /// # Errors
    ///
    /// - [`PartitionError::MalformedInput`] for duplicate events or invalid
    ///   tunables, before any oracle call.
    /// - [`PartitionError::OracleUnavailable`] if the oracle cannot be
    ///   invoked. Partial progress is discarded in this case.
    pub fn partition_with_rng<R: Rng + ?Sized>(
        &self,
        universe: &[Event],
        rng: &mut R,
    ) -> Result<PartitionReport, PartitionError> {
        let start = Instant::now();
        self.config.validate()?;
        check_distinct(universe)?;

        let evaluator = Evaluator::new(self.config.parallel_probes);
        let mut state = SearchState::new(universe, &self.config);
        let mut partitions = Vec::new();
        let mut rounds = Vec::new();
        let mut stats = RunStats::default();

        tracing::info!(
            "partitioning {} events with oracle '{}' (max group size {}, combination ceiling {})",
            universe.len(),
            self.oracle.name(),
            self.config.max_group_size,
            self.config.combination_ceiling
        );

        while !state.is_done() && !state.is_exhausted() {
            let max_group_size = state.max_group_size();
            let group_size = state.group_size();
            let window = estimate_window(
                state.remaining().len(),
                group_size,
                self.config.combination_ceiling,
            );
            tracing::debug!(
                "round {}: {} remaining, group size {}, window {}",
                stats.rounds,
                state.remaining().len(),
                group_size,
                window
            );

            let pool = &state.remaining()[..window];
            let outcome = evaluator.first_accepted(&self.oracle, enumerate_subsets(pool, group_size))?;

            stats.oracle_calls += outcome.evaluated;
            stats.rejected_calls += outcome.rejected();
            let mut record = RoundRecord {
                round: stats.rounds,
                max_group_size,
                group_size,
                window,
                candidates_evaluated: outcome.evaluated,
                accepted: None,
                shrank: false,
            };

            match outcome.accepted {
                Some(subset) => {
                    stats.accepted_calls += 1;
                    tracing::info!(
                        "partition {}: {} events after {} candidates",
                        partitions.len(),
                        subset.len(),
                        outcome.evaluated
                    );
                    state.accept(&subset);
                    partitions.push(Partition::new(subset.clone()));
                    record.accepted = Some(subset);
                }
                None => {
                    stats.stagnated_rounds += 1;
                    match state.stagnate(rng) {
                        Backoff::Shuffled { stagnation } => {
                            tracing::debug!(
                                "no subset of size {} accepted; reshuffled ({}/{})",
                                group_size,
                                stagnation,
                                self.config.shuffle_limit
                            );
                        }
                        Backoff::Shrunk { to } => {
                            stats.shrinks += 1;
                            record.shrank = true;
                            tracing::info!("shuffle limit hit; max group size now {}", to);
                        }
                    }
                }
            }

            rounds.push(record);
            stats.rounds += 1;
        }

        let residue = state.into_residue();
        if !residue.is_empty() {
            tracing::warn!(
                "could not place {} events even as single-event groups: {:?}",
                residue.len(),
                residue.iter().map(Event::name).collect::<Vec<_>>()
            );
        }
        stats.elapsed = start.elapsed();

        tracing::info!(
            "found {} partitions in {} rounds ({} oracle calls, {:.2?})",
            partitions.len(),
            stats.rounds,
            stats.oracle_calls,
            stats.elapsed
        );

        Ok(PartitionReport {
            partitions,
            residue,
            stats,
            rounds,
        })
    }
}

/// Partition `universe` with `oracle` under `config`.
pub fn partition_events<O: EventOracle>(
    universe: &[Event],
    oracle: O,
    config: Config,
) -> Result<PartitionReport, PartitionError> {
    Partitioner::with_config(oracle, config).partition(universe)
}

fn check_distinct(universe: &[Event]) -> Result<(), InputError> {
    let mut seen = HashSet::with_capacity(universe.len());
    for event in universe {
        if !seen.insert(event) {
            return Err(InputError::DuplicateEvent(event.clone()));
        }
    }
    Ok(())
}
