//! Standalone driver: run an ordered list of named test units and aggregate.

use std::io::Write;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use super::runner::{Runner, TestCatalog};
use super::summary::SummaryListener;
use crate::protocol::{self, ProtocolError, SharedStream};

#[derive(Debug, Error)]
pub enum DriverError {
    /// A named unit is not loadable in the current execution context.
    #[error("could not resolve test unit [{identifier}]")]
    UnresolvedTest { identifier: String },

    /// The shared output stream rejected a protocol write.
    #[error(transparent)]
    Stream(#[from] ProtocolError),
}

/// Run the named units as a single batch and return the process exit code:
/// 0 when the batch had no failures, 1 otherwise.
///
/// All identifiers are resolved up front; a miss aborts the run before any
/// announcement is printed or any test executes, rather than silently running
/// a partial batch. Announcements are printed per unit, in input order, before
/// the batch executes; the summary lines follow from the listener.
pub fn run_named_tests<W: Write>(
    catalog: &TestCatalog,
    identifiers: &[String],
    out: &SharedStream<W>,
) -> Result<i32, DriverError> {
    let mut units = Vec::with_capacity(identifiers.len());
    for identifier in identifiers {
        let unit = catalog
            .resolve(identifier)
            .ok_or_else(|| DriverError::UnresolvedTest { identifier: identifier.clone() })?;
        units.push(unit);
    }

    let run_id = Uuid::new_v4();
    info!(%run_id, units = units.len(), "starting batch run");

    let mut announcements = out.clone();
    for unit in &units {
        protocol::write_announcement(&mut announcements, unit.identifier())?;
    }

    let mut listener = SummaryListener::new(out.clone());
    let result = Runner::run(&units, &mut listener);

    info!(%run_id, successful = result.successful, "batch run finished");
    Ok(if result.successful { 0 } else { 1 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::runner::{TestCase, TestOutcome, TestUnit};

    fn catalog() -> TestCatalog {
        let mut catalog = TestCatalog::new();
        catalog.register(
            TestUnit::new("com.acme.TestA")
                .with_case(TestCase::new("a1", || TestOutcome::Passed)),
        );
        catalog.register(
            TestUnit::new("com.acme.TestB")
                .with_case(TestCase::new("b1", || TestOutcome::Failed("broken".to_string()))),
        );
        catalog
    }

    #[test]
    fn test_unresolved_identifier_aborts_without_output() {
        let stream = SharedStream::new(Vec::new());
        let err = run_named_tests(
            &catalog(),
            &["com.acme.Missing".to_string()],
            &stream,
        )
        .unwrap_err();
        assert!(matches!(err, DriverError::UnresolvedTest { .. }));

        let out = stream.into_inner().unwrap();
        assert!(out.is_empty(), "nothing may be announced or run");
    }

    #[test]
    fn test_partial_resolution_is_not_attempted() {
        let stream = SharedStream::new(Vec::new());
        let identifiers = vec!["com.acme.TestA".to_string(), "com.acme.Missing".to_string()];
        let err = run_named_tests(&catalog(), &identifiers, &stream).unwrap_err();
        assert!(matches!(err, DriverError::UnresolvedTest { identifier } if identifier == "com.acme.Missing"));

        let out = stream.into_inner().unwrap();
        assert!(out.is_empty(), "the resolvable unit must not have been announced");
    }

    #[test]
    fn test_failing_batch_exits_one() {
        let stream = SharedStream::new(Vec::new());
        let code = run_named_tests(&catalog(), &["com.acme.TestB".to_string()], &stream).unwrap();
        assert_eq!(code, 1);
    }
}
