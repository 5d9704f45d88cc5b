//! Configuration for the event partitioner.

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Default upper bound on the number of candidate subsets per round.
pub const DEFAULT_COMBINATION_CEILING: u64 = 50_000;

/// Default number of consecutive stagnated rounds tolerated before the
/// group size shrinks.
pub const DEFAULT_SHUFFLE_LIMIT: usize = 3;

/// Default group-size ceiling when none is given.
///
/// Most x86 cores expose four general-purpose counters per hardware thread.
pub const DEFAULT_MAX_GROUP_SIZE: usize = 4;

/// Configuration options for [`Partitioner`](crate::Partitioner).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Search bounds
    // =========================================================================
    /// Largest group the search tries to form.
    ///
    /// Usually the hardware's concurrent counter count (the
    /// `Number Hardware Counters` line of `papi_avail`). The working group
    /// size starts here and shrinks on sustained stagnation.
    ///
    /// Default: 4.
    pub max_group_size: usize,

    /// Upper bound on `C(window, group_size)`.
    ///
    /// Limits how many leading events are searched each round, and with it
    /// the number of oracle calls a single round may issue.
    ///
    /// Default: 50,000.
    pub combination_ceiling: u64,

    // =========================================================================
    // Backoff
    // =========================================================================
    /// Consecutive stagnated rounds tolerated at one group size.
    ///
    /// The group size is decremented on the `shuffle_limit + 1`-th
    /// consecutive round without progress.
    ///
    /// Default: 3.
    pub shuffle_limit: usize,

    /// Return to `max_group_size` after any accepted partition.
    ///
    /// When false, a shrunk group size stays shrunk for the rest of the run.
    ///
    /// Default: true.
    pub restore_after_success: bool,

    // =========================================================================
    // Execution
    // =========================================================================
    /// Number of oracle calls issued concurrently within a round.
    ///
    /// Values above 1 only take effect with the `parallel` feature.
    ///
    /// Default: 1.
    pub parallel_probes: usize,

    /// Seed for the shuffle generator.
    ///
    /// When set, runs against a deterministic oracle are reproducible.
    ///
    /// Default: None (seeded from entropy).
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_group_size: DEFAULT_MAX_GROUP_SIZE,
            combination_ceiling: DEFAULT_COMBINATION_CEILING,
            shuffle_limit: DEFAULT_SHUFFLE_LIMIT,
            restore_after_success: true,
            parallel_probes: 1,
            seed: None,
        }
    }
}

impl Config {
    /// Defaults with the given group-size ceiling.
    pub fn with_max_group_size(max_group_size: usize) -> Self {
        Self {
            max_group_size,
            ..Self::default()
        }
    }

    /// Check the tunables.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.max_group_size == 0 {
            return Err(InputError::ZeroCeiling);
        }
        if self.combination_ceiling == 0 {
            return Err(InputError::ZeroCombinationCeiling);
        }
        if self.parallel_probes == 0 {
            return Err(InputError::ZeroParallelProbes);
        }
        Ok(())
    }

    /// Apply `PMU_PARTITION_*` environment overrides on top of `self`.
    ///
    /// Recognized variables: `PMU_PARTITION_MAX_GROUP_SIZE`,
    /// `PMU_PARTITION_COMBINATION_CEILING`, `PMU_PARTITION_SHUFFLE_LIMIT`,
    /// `PMU_PARTITION_PARALLEL_PROBES`, `PMU_PARTITION_SEED`,
    /// `PMU_PARTITION_RESTORE`. Unparseable values are ignored with a
    /// warning.
    pub fn from_env(mut self) -> Self {
        self.apply_overrides(|name| std::env::var(name).ok());
        self
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = parse_var(&lookup, "PMU_PARTITION_MAX_GROUP_SIZE") {
            self.max_group_size = v;
        }
        if let Some(v) = parse_var(&lookup, "PMU_PARTITION_COMBINATION_CEILING") {
            self.combination_ceiling = v;
        }
        if let Some(v) = parse_var(&lookup, "PMU_PARTITION_SHUFFLE_LIMIT") {
            self.shuffle_limit = v;
        }
        if let Some(v) = parse_var(&lookup, "PMU_PARTITION_PARALLEL_PROBES") {
            self.parallel_probes = v;
        }
        if let Some(v) = parse_var(&lookup, "PMU_PARTITION_SEED") {
            self.seed = Some(v);
        }
        if let Some(raw) = lookup("PMU_PARTITION_RESTORE") {
            match raw.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.restore_after_success = true,
                "0" | "false" | "no" => self.restore_after_success = false,
                _ => tracing::warn!("ignoring PMU_PARTITION_RESTORE={:?}", raw),
            }
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("ignoring {}={:?}: not a valid number", name, raw);
            None
        }
    }
}
