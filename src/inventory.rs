//! Event inventory from `papi_avail`.
//!
//! `papi_avail -a` prints the number of hardware counters and a table of
//! the preset events available on this machine:
//!
//! ```text
//! Number Hardware Counters : 11
//! ...
//!     Name        Code    Deriv Description (Note)
//! PAPI_L1_DCM  0x80000000  No   Level 1 data cache misses
//! PAPI_L1_ICM  0x80000001  No   Level 1 instruction cache misses
//! PAPI_L1_TCM  0x80000006  Yes  Level 1 cache misses
//! --------------------------------------------------------------------------------
//! ```
//!
//! The counter count is the natural group-size ceiling for the partitioner
//! and the event names are its universe.

use std::path::Path;
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::error::InventoryError;
use crate::types::Event;

/// One row of the `papi_avail` event table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableEvent {
    /// Event name, e.g. `PAPI_TOT_CYC`.
    pub name: String,
    /// Event code as printed, e.g. `0x8000003b`.
    pub code: String,
    /// Whether PAPI derives the event from several native counters.
    pub derived: bool,
}

/// Hardware counter count and available events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInventory {
    /// Number of counters the hardware can run at once.
    pub counters: usize,
    /// Available events, in report order.
    pub events: Vec<AvailableEvent>,
}

impl EventInventory {
    /// Event names as partitioner input.
    pub fn event_list(&self) -> Vec<Event> {
        self.events.iter().map(|e| Event::new(&e.name)).collect()
    }
}

/// Parse `papi_avail -a` output.
///
/// With `skip_derived`, events PAPI computes from several native counters
/// are left out.
pub fn parse_papi_avail(output: &str, skip_derived: bool) -> Result<EventInventory, InventoryError> {
    let mut counters: Option<usize> = None;
    let mut events = Vec::new();
    let mut in_table = false;
    let mut table_done = false;

    for line in output.lines() {
        if let Some(raw) = counter_count(line) {
            let n = raw
                .parse()
                .map_err(|_| InventoryError::MalformedCounterCount(raw.to_string()))?;
            counters = Some(n);
            continue;
        }
        if is_table_header(line) {
            in_table = true;
            continue;
        }
        if !in_table || table_done {
            continue;
        }
        if is_rule(line) {
            table_done = true;
            continue;
        }

        let mut fields = line.split_whitespace();
        let (Some(name), Some(code), Some(deriv)) = (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        let derived = deriv.eq_ignore_ascii_case("yes");
        if skip_derived && derived {
            continue;
        }
        events.push(AvailableEvent {
            name: name.to_string(),
            code: code.to_string(),
            derived,
        });
    }

    let counters = counters.ok_or(InventoryError::MissingCounterCount)?;
    tracing::debug!(
        "papi_avail: {} counters, {} events (skip_derived = {})",
        counters,
        events.len(),
        skip_derived
    );
    Ok(EventInventory { counters, events })
}

/// Run `<papi_avail> -a` and parse its output.
pub fn query_papi_avail(
    papi_avail: &Path,
    skip_derived: bool,
) -> Result<EventInventory, InventoryError> {
    let command = format!("{} -a", papi_avail.display());
    let output = Command::new(papi_avail)
        .arg("-a")
        .output()
        .map_err(|source| InventoryError::Io {
            command: command.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(InventoryError::CommandFailed {
            command,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    parse_papi_avail(&String::from_utf8_lossy(&output.stdout), skip_derived)
}

/// Value of a `Number Hardware Counters : N` line.
fn counter_count(line: &str) -> Option<&str> {
    let (label, value) = line.split_once(':')?;
    let words: Vec<&str> = label.split_whitespace().collect();
    if words == ["Number", "Hardware", "Counters"] {
        Some(value.trim())
    } else {
        None
    }
}

fn is_table_header(line: &str) -> bool {
    let words: Vec<&str> = line.split_whitespace().collect();
    words == ["Name", "Code", "Deriv", "Description", "(Note)"]
}

fn is_rule(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && line.chars().all(|c| c == '-')
}
