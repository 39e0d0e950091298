//! Run observation inside the worker process.
//!
//! The runner dispatches test events synchronously on the calling thread; a
//! [`SummaryListener`] subscribed to exactly one run aggregates counters and
//! emits the tagged summary lines on completion. The standalone driver wires
//! both together for a "run these named units and exit 0/1" invocation.

pub mod driver;
pub mod events;
pub mod runner;
pub mod summary;

pub use driver::{run_named_tests, DriverError};
pub use events::{NodeKind, RunListener, RunResult, TestDescription, TestFailure};
pub use runner::{Runner, TestCase, TestCatalog, TestOutcome, TestUnit};
pub use summary::{ListenerState, RunCounters, SummaryListener};
