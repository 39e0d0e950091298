//! FORKLINK Reporting Bridge
//!
//! Connects a forked test-running worker process to its controller when the
//! two sides share no binary-compatible types. The controller constructs
//! worker-side reporting objects through a typed registry of foreign types,
//! and the worker streams run progress back as tagged protocol lines that the
//! controller parses by key, not by position.
//!
//! # Design
//!
//! - **Bridge**: construction across loading spaces is registry-keyed and
//!   schema-versioned; version skew between controller and worker fails
//!   loudly at construction time instead of silently binding wrong semantics.
//! - **Protocol**: line-oriented, tag-prefixed, flushed per line so the
//!   parent reads coherent progress while the worker is still running.
//! - **Listener**: one run per listener instance; counters are mutated only
//!   by the runner's synchronous dispatch on the calling thread.

pub mod bridge;
pub mod config;
pub mod listener;
pub mod logging;
pub mod protocol;

pub use bridge::{build_reporter_factory, BridgeError, LoadingSpace, ReportSettings};
pub use listener::{run_named_tests, DriverError, SummaryListener};
pub use protocol::{RunSummary, SharedStream};
