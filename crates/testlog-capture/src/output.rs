//! Test-output sinks used for echoing log lines.
//!
//! A [`TestOutput`] is the live output stream of the running test. Writing
//! may fail with [`OutputError::NoActiveTest`] once the owning test has
//! completed; loggers treat that failure as expected and discard the line.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

/// Errors returned when writing to a test-output sink.
#[derive(Debug, Error)]
pub enum OutputError {
    /// No test is running to receive the line.
    #[error("no test is currently active")]
    NoActiveTest,
    /// The underlying writer failed.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The sink refused the line for another reason.
    #[error("output rejected: {0}")]
    Rejected(String),
}

impl OutputError {
    /// Returns whether this is the "no active test" condition.
    #[must_use]
    pub const fn is_no_active_test(&self) -> bool {
        matches!(self, Self::NoActiveTest)
    }
}

/// Live output stream of a running test.
pub trait TestOutput: Send + Sync {
    /// Write a single line.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::NoActiveTest`] when called outside a test's
    /// execution window, or another variant when the write itself fails.
    fn write_line(&self, line: &str) -> Result<(), OutputError>;
}

/// Writes lines through `println!` so the test harness captures them per
/// test and shows them for failing tests or with `--nocapture`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutOutput;

impl TestOutput for StdoutOutput {
    #[expect(clippy::print_stdout, reason = "route lines through harness capture")]
    fn write_line(&self, line: &str) -> Result<(), OutputError> {
        println!("{line}");
        Ok(())
    }
}

#[derive(Debug)]
struct BufferState {
    lines: Vec<String>,
    active: bool,
}

/// In-memory output for a single test.
///
/// Clones share the same buffer. Once [`finish`](Self::finish) is called
/// every further write fails with [`OutputError::NoActiveTest`].
///
/// # Examples
///
/// ```
/// use testlog_capture::output::{TestOutput, TestOutputBuffer};
///
/// let output = TestOutputBuffer::new();
/// output.write_line("hello").expect("test is active");
/// output.finish();
/// assert!(output.write_line("late").is_err());
/// assert_eq!(output.lines(), ["hello"]);
/// ```
#[derive(Debug, Clone)]
pub struct TestOutputBuffer {
    state: Arc<Mutex<BufferState>>,
}

impl Default for TestOutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TestOutputBuffer {
    /// Create an active, empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BufferState {
                lines: Vec::new(),
                active: true,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BufferState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark the owning test as completed.
    pub fn finish(&self) {
        self.lock().active = false;
    }

    /// Returns whether the owning test is still running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.lock().active
    }

    /// Lines written so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lock().lines.clone()
    }

    /// All lines joined with newlines.
    #[must_use]
    pub fn contents(&self) -> String {
        self.lock().lines.join("\n")
    }
}

impl TestOutput for TestOutputBuffer {
    fn write_line(&self, line: &str) -> Result<(), OutputError> {
        let mut state = self.lock();
        if !state.active {
            return Err(OutputError::NoActiveTest);
        }
        state.lines.push(line.to_owned());
        Ok(())
    }
}

/// Writes each line, newline terminated, to an [`io::Write`].
#[derive(Debug)]
pub struct WriterOutput<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterOutput<W> {
    /// Wrap `writer`.
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Return the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> TestOutput for WriterOutput<W> {
    fn write_line(&self, line: &str) -> Result<(), OutputError> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{line}")?;
        writer.flush()?;
        Ok(())
    }
}
