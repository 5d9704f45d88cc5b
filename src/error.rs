//! Error types.
//!
//! A rejected candidate is not an error: oracles report it as `Ok(false)`.
//! Events that cannot be placed are returned as residue in the report.
//! Only an unusable oracle and malformed input abort a run.

use crate::types::Event;

/// Error returned by an [`EventOracle`](crate::EventOracle).
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// The measurement collaborator cannot be invoked at all.
    ///
    /// Examples: the probe binary is missing or not executable, or the
    /// kernel refuses to open performance counters for this process.
    #[error("oracle '{oracle}' is unavailable: {reason}")]
    Unavailable {
        /// Name of the oracle.
        oracle: String,
        /// Human-readable cause.
        reason: String,
        /// Underlying I/O error, when there is one.
        #[source]
        source: Option<std::io::Error>,
    },
}

impl OracleError {
    /// Unavailable oracle without an underlying I/O error.
    pub fn unavailable(oracle: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            oracle: oracle.into(),
            reason: reason.into(),
            source: None,
        }
    }

    /// Unavailable oracle caused by an I/O error.
    pub fn unavailable_io(
        oracle: impl Into<String>,
        reason: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::Unavailable {
            oracle: oracle.into(),
            reason: reason.into(),
            source: Some(source),
        }
    }
}

/// Input rejected before any oracle call is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    /// The same event appears more than once in the universe.
    #[error("duplicate event '{0}' in input")]
    DuplicateEvent(Event),

    /// The group-size ceiling is zero.
    #[error("max group size must be > 0")]
    ZeroCeiling,

    /// The window combination ceiling is zero.
    #[error("combination ceiling must be > 0")]
    ZeroCombinationCeiling,

    /// Parallel probe count is zero.
    #[error("parallel probe count must be > 0")]
    ZeroParallelProbes,
}

/// Hard failure of a partitioning run.
#[derive(Debug, thiserror::Error)]
pub enum PartitionError {
    /// The oracle could not be invoked; the run was aborted.
    #[error(transparent)]
    OracleUnavailable(#[from] OracleError),

    /// Input or configuration was rejected up front.
    #[error("malformed input: {0}")]
    MalformedInput(#[from] InputError),
}

/// Error reading the event inventory.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    /// Running the inventory command failed.
    #[error("failed to run '{command}': {source}")]
    Io {
        /// Command that was run.
        command: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The command exited unsuccessfully.
    #[error("'{command}' exited with {status}: {stderr}")]
    CommandFailed {
        /// Command that was run.
        command: String,
        /// Exit status.
        status: std::process::ExitStatus,
        /// Captured standard error.
        stderr: String,
    },

    /// No `Number Hardware Counters` line was found.
    #[error("inventory output has no hardware counter count")]
    MissingCounterCount,

    /// The counter count line did not hold a usable number.
    #[error("invalid hardware counter count '{0}'")]
    MalformedCounterCount(String),
}
