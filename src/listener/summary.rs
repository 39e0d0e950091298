//! Run aggregation and summary emission over the shared output stream.

use std::io::Write;

use tracing::{debug, error};

use super::events::{RunListener, RunResult, TestDescription, TestFailure};
use crate::protocol::{self, RunSummary};

/// Mutable aggregate counters for exactly one run.
///
/// All counters start at zero, only increase, and are never reset mid-run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub run: u64,
    pub failures: u64,
    pub ignored: u64,
}

/// Listener lifecycle. Counters may change only while accumulating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Created,
    Registered,
    Accumulating,
    Finalized,
}

/// Aggregates run events and emits the four-line summary on completion.
///
/// Owns the counters for exactly one run. Summary emission happens in
/// `run_finished` and is not guarded against a second delivery; delivering it
/// once is the runner's contract.
pub struct SummaryListener<W: Write> {
    counters: RunCounters,
    state: ListenerState,
    out: W,
}

impl<W: Write> SummaryListener<W> {
    pub fn new(out: W) -> Self {
        Self { counters: RunCounters::default(), state: ListenerState::Created, out }
    }

    pub fn counters(&self) -> RunCounters {
        self.counters
    }

    pub fn state(&self) -> ListenerState {
        self.state
    }

    /// The summary that would be emitted for `result`.
    pub fn summary_for(&self, result: &RunResult) -> RunSummary {
        RunSummary {
            run_count: self.counters.run,
            failure_count: self.counters.failures,
            ignore_count: self.counters.ignored,
            run_time_ms: result.run_time_ms(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RunListener for SummaryListener<W> {
    fn registered(&mut self) {
        self.state = ListenerState::Registered;
    }

    fn run_started(&mut self) {
        self.state = ListenerState::Accumulating;
        debug!("run accumulation started");
    }

    fn test_started(&mut self, description: &TestDescription) {
        // Container/suite nodes flow through the same stream; only leaf tests
        // count.
        if description.is_test() {
            self.counters.run += 1;
        }
    }

    fn test_failure(&mut self, failure: &TestFailure) {
        if failure.description.is_test() {
            self.counters.failures += 1;
        }
    }

    fn assumption_failure(&mut self, failure: &TestFailure) {
        if failure.description.is_test() {
            self.counters.ignored += 1;
        }
    }

    fn test_ignored(&mut self, description: &TestDescription) {
        if description.is_test() {
            self.counters.ignored += 1;
        }
    }

    fn run_finished(&mut self, result: &RunResult) {
        self.state = ListenerState::Finalized;
        let summary = self.summary_for(result);
        if let Err(e) = protocol::write_summary(&mut self.out, &summary) {
            // The listener has no error channel of its own; surface through
            // the log and leave the exit status to the runner.
            error!("failed to emit run summary: {}", e);
        }
    }
}
