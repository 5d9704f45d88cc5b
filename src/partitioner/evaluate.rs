//! Candidate evaluation for one search round.
//!
//! The winner of a round is always the accepted candidate with the lowest
//! enumeration index, however the oracle calls were scheduled. With the
//! `parallel` feature, candidates are probed in chunks of `parallel_probes`
//! on a dedicated rayon pool; no further chunk is started once a chunk holds
//! a winner, and verdicts after the winner are dropped.

use crate::error::OracleError;
use crate::oracle::EventOracle;
use crate::types::Event;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Result of evaluating one round's candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RoundOutcome {
    /// First accepted candidate in enumeration order.
    pub accepted: Option<Vec<Event>>,
    /// Verdicts consumed, up to and including the winner.
    pub evaluated: usize,
}

impl RoundOutcome {
    pub fn rejected(&self) -> usize {
        self.evaluated - usize::from(self.accepted.is_some())
    }
}

/// Strategy for issuing oracle calls within a round.
pub(crate) enum Evaluator {
    Sequential,
    #[cfg(feature = "parallel")]
    Parallel {
        pool: rayon::ThreadPool,
        width: usize,
    },
}

impl Evaluator {
    /// Evaluator issuing up to `parallel_probes` concurrent calls.
    pub fn new(parallel_probes: usize) -> Self {
        if parallel_probes <= 1 {
            return Self::Sequential;
        }
        Self::parallel(parallel_probes)
    }

    #[cfg(feature = "parallel")]
    fn parallel(width: usize) -> Self {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(width)
            .thread_name(|i| format!("pmu-probe-{}", i))
            .build()
        {
            Ok(pool) => Self::Parallel { pool, width },
            Err(e) => {
                tracing::warn!("cannot start probe pool ({}); probing sequentially", e);
                Self::Sequential
            }
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn parallel(width: usize) -> Self {
        tracing::warn!(
            "parallel_probes = {} requires the `parallel` feature; probing sequentially",
            width
        );
        Self::Sequential
    }

    /// Probe `candidates` in order until one is accepted.
    pub fn first_accepted<O, I>(&self, oracle: &O, candidates: I) -> Result<RoundOutcome, OracleError>
    where
        O: EventOracle + ?Sized,
        I: Iterator<Item = Vec<Event>>,
    {
        match self {
            Self::Sequential => sequential(oracle, candidates),
            #[cfg(feature = "parallel")]
            Self::Parallel { pool, width } => parallel(pool, *width, oracle, candidates),
        }
    }
}

fn sequential<O, I>(oracle: &O, candidates: I) -> Result<RoundOutcome, OracleError>
where
    O: EventOracle + ?Sized,
    I: Iterator<Item = Vec<Event>>,
{
    let mut outcome = RoundOutcome::default();
    for candidate in candidates {
        let verdict = oracle.measure_together(&candidate)?;
        outcome.evaluated += 1;
        if verdict {
            outcome.accepted = Some(candidate);
            break;
        }
    }
    Ok(outcome)
}

#[cfg(feature = "parallel")]
fn parallel<O, I>(
    pool: &rayon::ThreadPool,
    width: usize,
    oracle: &O,
    mut candidates: I,
) -> Result<RoundOutcome, OracleError>
where
    O: EventOracle + ?Sized,
    I: Iterator<Item = Vec<Event>>,
{
    let mut outcome = RoundOutcome::default();
    loop {
        let chunk: Vec<Vec<Event>> = candidates.by_ref().take(width).collect();
        if chunk.is_empty() {
            return Ok(outcome);
        }

        let verdicts: Vec<Result<bool, OracleError>> = pool.install(|| {
            chunk
                .par_iter()
                .map(|candidate| oracle.measure_together(candidate))
                .collect()
        });

        // resolve strictly in enumeration order
        for (candidate, verdict) in chunk.into_iter().zip(verdicts) {
            let accepted = verdict?;
            outcome.evaluated += 1;
            if accepted {
                outcome.accepted = Some(candidate);
                return Ok(outcome);
            }
        }
    }
}
