//! Test run event model: descriptions, failures, and the listener trait.

use std::time::Duration;

/// Whether a notified unit is a leaf test or a container grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Suite,
    Test,
}

/// Identity of one notified unit within the run hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDescription {
    display_name: String,
    kind: NodeKind,
}

impl TestDescription {
    pub fn test(display_name: impl Into<String>) -> Self {
        Self { display_name: display_name.into(), kind: NodeKind::Test }
    }

    pub fn suite(display_name: impl Into<String>) -> Self {
        Self { display_name: display_name.into(), kind: NodeKind::Suite }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Leaf executable test, as opposed to a container/suite node.
    pub fn is_test(&self) -> bool {
        self.kind == NodeKind::Test
    }
}

/// A failure notification delivered for one unit.
#[derive(Debug, Clone)]
pub struct TestFailure {
    pub description: TestDescription,
    pub message: String,
}

/// Final result of one batch run.
#[derive(Debug, Clone, Copy)]
pub struct RunResult {
    pub elapsed: Duration,
    pub successful: bool,
}

impl RunResult {
    pub fn run_time_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }
}

/// Observer of one run's event stream.
///
/// Callbacks are delivered synchronously by the runner's own dispatch, in
/// dispatch order; an instance observes exactly one run. Serialized delivery
/// is an assumption of the runner, not something the listener enforces.
pub trait RunListener {
    /// Delivered once when a runner takes ownership of the subscription.
    fn registered(&mut self) {}

    /// Delivered once when the batch starts.
    fn run_started(&mut self) {}

    fn test_started(&mut self, _description: &TestDescription) {}

    fn test_failure(&mut self, _failure: &TestFailure) {}

    /// A test opted out because a declared precondition was unmet; distinct
    /// from a genuine failing assertion.
    fn assumption_failure(&mut self, _failure: &TestFailure) {}

    fn test_ignored(&mut self, _description: &TestDescription) {}

    /// Delivered exactly once when the batch finishes.
    fn run_finished(&mut self, _result: &RunResult) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_kind_guard() {
        assert!(TestDescription::test("t").is_test());
        assert!(!TestDescription::suite("s").is_test());
    }

    #[test]
    fn test_run_result_millis() {
        let result = RunResult { elapsed: Duration::from_millis(1500), successful: true };
        assert_eq!(result.run_time_ms(), 1500);
    }
}
