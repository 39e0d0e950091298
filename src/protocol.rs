//! Line protocol shared between the forked worker and its controller.
//!
//! The worker writes one complete, immediately flushed line per metric to the
//! shared output stream. Tag and key text are stable; consumers key on them,
//! never on line position. Arbitrary test output may interleave on the same
//! stream and is skipped by the parser.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tag prefixing every protocol line.
pub const LINE_TAG: &str = "[FORKLINK]";

pub const KEY_RUN_COUNT: &str = "Run Count";
pub const KEY_FAILURE_COUNT: &str = "Failure Count";
pub const KEY_IGNORE_COUNT: &str = "Ignore Count";
pub const KEY_RUN_TIME: &str = "Run Time (ms)";

const ANNOUNCEMENT_PREFIX: &str = "Running ";

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid protocol line: {0}")]
    InvalidFormat(String),

    #[error("missing required key: {0}")]
    MissingField(&'static str),

    #[error("stream error: {0}")]
    Io(#[from] io::Error),
}

/// Aggregated result of one run, as carried by the four summary lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_count: u64,
    pub failure_count: u64,
    pub ignore_count: u64,
    pub run_time_ms: u64,
}

impl RunSummary {
    pub fn was_successful(&self) -> bool {
        self.failure_count == 0
    }
}

/// A parsed protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolLine {
    Metric { key: String, value: u64 },
    Announcement { identifier: String },
}

/// Emit the four summary lines in fixed order.
///
/// A run with zero tests still produces the full four-line summary; emission
/// is never suppressed.
pub fn write_summary<W: Write>(out: &mut W, summary: &RunSummary) -> Result<(), ProtocolError> {
    write_metric(out, KEY_RUN_COUNT, summary.run_count)?;
    write_metric(out, KEY_FAILURE_COUNT, summary.failure_count)?;
    write_metric(out, KEY_IGNORE_COUNT, summary.ignore_count)?;
    write_metric(out, KEY_RUN_TIME, summary.run_time_ms)?;
    Ok(())
}

/// Emit the standalone-mode announcement line for one test unit.
pub fn write_announcement<W: Write>(out: &mut W, identifier: &str) -> Result<(), ProtocolError> {
    writeln!(out, "{} {}{}", LINE_TAG, ANNOUNCEMENT_PREFIX, identifier)?;
    out.flush()?;
    Ok(())
}

fn write_metric<W: Write>(out: &mut W, key: &str, value: u64) -> Result<(), ProtocolError> {
    // Each line is a complete flushed unit so the parent reads a coherent
    // protocol while the run is still in progress.
    writeln!(out, "{} {} : {}", LINE_TAG, key, value)?;
    out.flush()?;
    Ok(())
}

/// Parse one line from the shared stream.
///
/// Lines without the protocol tag belong to the tests themselves and yield
/// `Ok(None)`; tagged lines that do not parse are an error.
pub fn parse_line(line: &str) -> Result<Option<ProtocolLine>, ProtocolError> {
    let Some(rest) = line.trim_end().strip_prefix(LINE_TAG) else {
        return Ok(None);
    };
    let rest = rest.trim_start();

    if let Some(identifier) = rest.strip_prefix(ANNOUNCEMENT_PREFIX) {
        if identifier.is_empty() {
            return Err(ProtocolError::InvalidFormat(line.to_string()));
        }
        return Ok(Some(ProtocolLine::Announcement { identifier: identifier.to_string() }));
    }

    let (key, value) = rest
        .rsplit_once(" : ")
        .ok_or_else(|| ProtocolError::InvalidFormat(line.to_string()))?;
    let value = value
        .trim()
        .parse::<u64>()
        .map_err(|_| ProtocolError::InvalidFormat(line.to_string()))?;
    Ok(Some(ProtocolLine::Metric { key: key.trim().to_string(), value }))
}

/// Collect a full summary from a stream of lines.
///
/// Keys are matched by text in any order; line position carries no meaning.
/// Every one of the four keys must appear, so a truncated worker stream is an
/// error rather than a zero-filled summary.
pub fn parse_summary<'a, I>(lines: I) -> Result<RunSummary, ProtocolError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut run_count = None;
    let mut failure_count = None;
    let mut ignore_count = None;
    let mut run_time_ms = None;

    for line in lines {
        if let Some(ProtocolLine::Metric { key, value }) = parse_line(line)? {
            match key.as_str() {
                KEY_RUN_COUNT => run_count = Some(value),
                KEY_FAILURE_COUNT => failure_count = Some(value),
                KEY_IGNORE_COUNT => ignore_count = Some(value),
                KEY_RUN_TIME => run_time_ms = Some(value),
                // Unknown metric keys are tolerated so newer workers stay
                // readable by older controllers.
                _ => {}
            }
        }
    }

    Ok(RunSummary {
        run_count: run_count.ok_or(ProtocolError::MissingField(KEY_RUN_COUNT))?,
        failure_count: failure_count.ok_or(ProtocolError::MissingField(KEY_FAILURE_COUNT))?,
        ignore_count: ignore_count.ok_or(ProtocolError::MissingField(KEY_IGNORE_COUNT))?,
        run_time_ms: run_time_ms.ok_or(ProtocolError::MissingField(KEY_RUN_TIME))?,
    })
}

/// Clonable handle over one shared output stream.
///
/// The listener and the driver both write to the same stream; the lock keeps
/// each line a single unbroken unit.
pub struct SharedStream<W: Write> {
    inner: Arc<Mutex<W>>,
}

impl<W: Write> SharedStream<W> {
    pub fn new(inner: W) -> Self {
        Self { inner: Arc::new(Mutex::new(inner)) }
    }

    /// Recover the underlying stream once all handles are dropped.
    pub fn into_inner(self) -> Option<W> {
        Arc::try_unwrap(self.inner)
            .ok()
            .and_then(|mutex| mutex.into_inner().ok())
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, W>> {
        self.inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "shared stream lock poisoned"))
    }
}

impl<W: Write> Clone for SharedStream<W> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<W: Write> Write for SharedStream<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock()?.flush()
    }
}
