//! Minimal synchronous test harness driving the listener event stream.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use tracing::debug;

use super::events::{RunListener, RunResult, TestDescription, TestFailure};

/// Outcome of executing one test case body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    Failed(String),
    /// The case opted out because a declared precondition was unmet.
    AssumptionFailed(String),
}

type TestBody = Box<dyn Fn() -> TestOutcome + Send + Sync>;

/// A leaf executable test.
pub struct TestCase {
    description: TestDescription,
    ignored: bool,
    body: TestBody,
}

impl TestCase {
    pub fn new(name: &str, body: impl Fn() -> TestOutcome + Send + Sync + 'static) -> Self {
        Self { description: TestDescription::test(name), ignored: false, body: Box::new(body) }
    }

    /// A case that is skipped without ever executing its body.
    pub fn ignored(name: &str) -> Self {
        Self {
            description: TestDescription::test(name),
            ignored: true,
            body: Box::new(|| TestOutcome::Passed),
        }
    }

    pub fn description(&self) -> &TestDescription {
        &self.description
    }

    pub fn is_ignored(&self) -> bool {
        self.ignored
    }
}

/// A named container of test cases.
pub struct TestUnit {
    description: TestDescription,
    cases: Vec<TestCase>,
}

impl TestUnit {
    pub fn new(identifier: &str) -> Self {
        Self { description: TestDescription::suite(identifier), cases: Vec::new() }
    }

    pub fn with_case(mut self, case: TestCase) -> Self {
        self.cases.push(case);
        self
    }

    pub fn identifier(&self) -> &str {
        self.description.display_name()
    }

    pub fn description(&self) -> &TestDescription {
        &self.description
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }
}

/// Registry of runnable units keyed by qualified identifier.
#[derive(Default)]
pub struct TestCatalog {
    units: HashMap<String, TestUnit>,
}

impl TestCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, unit: TestUnit) {
        self.units.insert(unit.identifier().to_string(), unit);
    }

    pub fn resolve(&self, identifier: &str) -> Option<&TestUnit> {
        self.units.get(identifier)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Synchronous single-batch dispatcher.
///
/// Events are delivered on the calling thread in unit/case order, so listener
/// counters see serialized updates without any locking discipline.
pub struct Runner;

impl Runner {
    /// Run all units as a single batch against one listener.
    ///
    /// Suite nodes surface through the same `test_started` stream as leaf
    /// tests; listeners filter on `is_test()`. Ignored cases fire only
    /// `test_ignored` and never execute.
    pub fn run(units: &[&TestUnit], listener: &mut dyn RunListener) -> RunResult {
        listener.registered();
        let started = Instant::now();
        listener.run_started();

        let mut failures = 0u64;
        for unit in units {
            debug!(unit = unit.identifier(), "dispatching unit");
            listener.test_started(unit.description());
            for case in unit.cases() {
                if case.is_ignored() {
                    listener.test_ignored(case.description());
                    continue;
                }
                listener.test_started(case.description());
                match Self::execute(case) {
                    TestOutcome::Passed => {}
                    TestOutcome::Failed(message) => {
                        failures += 1;
                        listener.test_failure(&TestFailure {
                            description: case.description().clone(),
                            message,
                        });
                    }
                    TestOutcome::AssumptionFailed(message) => {
                        listener.assumption_failure(&TestFailure {
                            description: case.description().clone(),
                            message,
                        });
                    }
                }
            }
        }

        let result = RunResult { elapsed: started.elapsed(), successful: failures == 0 };
        listener.run_finished(&result);
        result
    }

    /// Execute one case body, converting a panic into a failure outcome.
    fn execute(case: &TestCase) -> TestOutcome {
        panic::catch_unwind(AssertUnwindSafe(|| (case.body)()))
            .unwrap_or_else(|cause| TestOutcome::Failed(panic_message(cause)))
    }
}

fn panic_message(cause: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = cause.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = cause.downcast_ref::<String>() {
        message.clone()
    } else {
        "test panicked".to_string()
    }
}
