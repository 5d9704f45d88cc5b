//! Oracle that runs an instrumented probe program under the PAPI high-level
//! API.
//!
//! The probe is any binary that brackets a short workload in a PAPI
//! high-level region. The PAPI runtime reads the event list from
//! `PAPI_EVENTS` and writes a JSON report under
//! `$PAPI_OUTPUT_DIRECTORY/papi_hl_output/`:
//!
//! ```text
//! { "threads": { "0": { "regions": { "0": { "name": "main",
//!                                           "PAPI_TOT_CYC": "123", ... } } } } }
//! ```
//!
//! A candidate is accepted when every requested event appears as a key of
//! the watched region. Events PAPI could not schedule are silently missing
//! from the report, which is what makes this check meaningful.
//!
//! Every call runs in its own freshly created temporary directory, so calls
//! for different candidates can run concurrently.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use serde_json::Value;

use super::EventOracle;
use crate::error::OracleError;
use crate::types::Event;

/// Directory PAPI creates inside `PAPI_OUTPUT_DIRECTORY`.
const REPORT_SUBDIR: &str = "papi_hl_output";

/// Interval between child status polls while a timeout is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Oracle backed by a PAPI probe binary.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use pmu_partition::{events, EventOracle, ProbeOracle};
///
/// let oracle = ProbeOracle::new("/tmp/papi_events_test_program")
///     .library_dir("/opt/papi/lib")
///     .timeout(Duration::from_secs(10));
/// let ok = oracle.measure_together(&events(["PAPI_TOT_CYC", "PAPI_L1_DCM"]))?;
/// # Ok::<(), pmu_partition::OracleError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ProbeOracle {
    name: String,
    binary: PathBuf,
    args: Vec<OsString>,
    library_dir: Option<PathBuf>,
    env: Vec<(OsString, OsString)>,
    thread: String,
    region: String,
    timeout: Option<Duration>,
    scratch_root: Option<PathBuf>,
}

impl ProbeOracle {
    /// Oracle running the probe at `binary`.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            name: "papi-probe".to_string(),
            binary: binary.into(),
            args: Vec::new(),
            library_dir: None,
            env: Vec::new(),
            thread: "0".to_string(),
            region: "0".to_string(),
            timeout: None,
            scratch_root: None,
        }
    }

    /// Name used in logs and errors.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Extra argument passed to the probe.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Prepend `dir` to `LD_LIBRARY_PATH` for the probe.
    pub fn library_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.library_dir = Some(dir.into());
        self
    }

    /// Extra environment variable for the probe.
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Report thread key to inspect. Default: `"0"`.
    pub fn thread(mut self, thread: impl Into<String>) -> Self {
        self.thread = thread.into();
        self
    }

    /// Report region key to inspect. Default: `"0"`.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Kill the probe and reject the candidate after `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Create per-call output directories under `root` instead of the
    /// system temporary directory.
    pub fn scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    /// Path of the probe binary.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn unavailable(&self, reason: impl Into<String>) -> OracleError {
        OracleError::unavailable(self.name.clone(), reason)
    }

    fn unavailable_io(&self, reason: impl Into<String>, err: io::Error) -> OracleError {
        OracleError::unavailable_io(self.name.clone(), reason, err)
    }

    fn scratch_dir(&self) -> io::Result<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("pmu-probe-");
        match &self.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
    }

    fn command(&self, candidate: &[Event], output_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(&self.args)
            .env("PAPI_EVENTS", papi_event_list(candidate))
            .env("PAPI_OUTPUT_DIRECTORY", output_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        if let Some(dir) = &self.library_dir {
            let mut paths = vec![dir.clone()];
            if let Some(existing) = std::env::var_os("LD_LIBRARY_PATH") {
                paths.extend(std::env::split_paths(&existing));
            }
            if let Ok(joined) = std::env::join_paths(paths) {
                cmd.env("LD_LIBRARY_PATH", joined);
            }
        }
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }

    /// Wait for the child, honoring the timeout. `None` means it was killed.
    fn wait(&self, child: &mut Child) -> io::Result<Option<ExitStatus>> {
        let Some(timeout) = self.timeout else {
            return child.wait().map(Some);
        };
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(Some(status));
            }
            if Instant::now() >= deadline {
                // the child may exit between try_wait and kill
                let _ = child.kill();
                let _ = child.wait();
                return Ok(None);
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

impl EventOracle for ProbeOracle {
    fn name(&self) -> &str {
        &self.name
    }

    fn measure_together(&self, candidate: &[Event]) -> Result<bool, OracleError> {
        if !self.binary.is_file() {
            return Err(self.unavailable(format!(
                "probe binary {} does not exist",
                self.binary.display()
            )));
        }

        let scratch = self
            .scratch_dir()
            .map_err(|e| self.unavailable_io("cannot create probe output directory", e))?;

        let mut child = self
            .command(candidate, scratch.path())
            .spawn()
            .map_err(|e| {
                self.unavailable_io(format!("cannot launch {}", self.binary.display()), e)
            })?;

        let status = self
            .wait(&mut child)
            .map_err(|e| self.unavailable_io("lost track of probe process", e))?;

        match status {
            None => {
                tracing::warn!(
                    "probe timed out after {:?} for {} events; rejecting",
                    self.timeout.unwrap_or_default(),
                    candidate.len()
                );
                return Ok(false);
            }
            Some(status) if !status.success() => {
                tracing::debug!("probe exited with {} for {:?}", status, candidate);
            }
            Some(_) => {}
        }

        let report = match ProbeReport::load_from_dir(&scratch.path().join(REPORT_SUBDIR)) {
            Ok(report) => report,
            Err(reason) => {
                tracing::warn!("no usable probe report ({}); rejecting candidate", reason);
                return Ok(false);
            }
        };

        let accepted = report.contains_all(&self.thread, &self.region, candidate);
        tracing::debug!(
            "probe verdict for {} events: {}",
            candidate.len(),
            if accepted { "accepted" } else { "rejected" }
        );
        Ok(accepted)
    }
}

/// `PAPI_EVENTS` value for a candidate.
fn papi_event_list(candidate: &[Event]) -> String {
    candidate
        .iter()
        .map(Event::name)
        .collect::<Vec<_>>()
        .join(",")
}

/// Parsed PAPI high-level JSON report.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    root: Value,
}

impl ProbeReport {
    /// Parse a report from JSON text.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text).map(|root| Self { root })
    }

    /// Load the single `*.json` report in `dir`.
    ///
    /// Fails if the directory is missing, holds no report, or holds more than
    /// one.
    pub fn load_from_dir(dir: &Path) -> Result<Self, String> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| format!("cannot read {}: {}", dir.display(), e))?;

        let mut reports = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| format!("cannot read {}: {}", dir.display(), e))?
                .path();
            if path.extension().is_some_and(|ext| ext == "json") {
                reports.push(path);
            }
        }

        let path = match reports.as_slice() {
            [single] => single,
            [] => return Err(format!("no report in {}", dir.display())),
            many => {
                return Err(format!(
                    "expected one report in {}, found {}",
                    dir.display(),
                    many.len()
                ))
            }
        };

        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        Self::parse(&text).map_err(|e| format!("malformed report {}: {}", path.display(), e))
    }

    fn region(&self, thread: &str, region: &str) -> Option<&serde_json::Map<String, Value>> {
        self.root
            .get("threads")?
            .get(thread)?
            .get("regions")?
            .get(region)?
            .as_object()
    }

    /// Keys recorded for a region, including non-event keys like `name`.
    pub fn region_keys(&self, thread: &str, region: &str) -> Option<Vec<&str>> {
        self.region(thread, region)
            .map(|r| r.keys().map(String::as_str).collect())
    }

    /// Whether every event in `events` was recorded in the region.
    pub fn contains_all(&self, thread: &str, region: &str, events: &[Event]) -> bool {
        match self.region(thread, region) {
            Some(r) => events.iter().all(|e| r.contains_key(e.name())),
            None => false,
        }
    }
}
