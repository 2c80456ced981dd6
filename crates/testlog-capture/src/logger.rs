//! Capturing logger for tests.
//!
//! [`CapturingLogger`] keeps every accepted log event in memory so tests can
//! assert on it, and echoes events of selected categories to the running
//! test's output.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Local, SecondsFormat};
use testlog::{EventId, Level, LogRecord, LogState, SharedError};

use crate::config::EchoCategories;
use crate::output::{OutputError, TestOutput};

/// Predicate deciding whether `(category, level)` is logged.
pub type CategoryFilter = Arc<dyn Fn(&str, Level) -> bool + Send + Sync>;

/// A log call with its message already rendered.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity of the call.
    pub level: Level,
    /// Correlation identifier.
    pub event_id: EventId,
    /// Rendered message.
    pub message: String,
    /// State supplied by the caller.
    pub state: LogState,
    /// Error attached to the call.
    pub error: Option<SharedError>,
}

impl LogEntry {
    /// Entry with default event id, opaque state and no error.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            event_id: EventId::default(),
            message: message.into(),
            state: LogState::Opaque,
            error: None,
        }
    }

    /// Set the event id.
    #[must_use]
    pub fn with_event_id(mut self, event_id: impl Into<EventId>) -> Self {
        self.event_id = event_id.into();
        self
    }

    /// Set the state.
    #[must_use]
    pub fn with_state(mut self, state: impl Into<LogState>) -> Self {
        self.state = state.into();
        self
    }

    /// Attach an error.
    #[must_use]
    pub fn with_error(mut self, error: SharedError) -> Self {
        self.error = Some(error);
        self
    }
}

/// Handle returned by [`LogSink::begin_scope`].
///
/// Scopes are not tracked; dropping the handle does nothing.
#[derive(Debug, Default)]
#[must_use = "a scope ends when its guard is dropped"]
pub struct ScopeGuard {
    _private: (),
}

/// Destination for leveled, categorised, structured log events.
pub trait LogSink: Send + Sync {
    /// Returns whether events at `level` are accepted.
    fn is_enabled(&self, level: Level) -> bool;

    /// Log an entry whose message is already rendered.
    ///
    /// # Errors
    ///
    /// Returns the output failure when echoing the entry fails.
    fn log(&self, entry: LogEntry) -> Result<(), OutputError>;

    /// Log an event, rendering its message only when the level is enabled.
    ///
    /// `formatter` runs at most once, on the calling thread.
    ///
    /// # Errors
    ///
    /// Returns the output failure when echoing the event fails.
    fn log_with<F>(
        &self,
        level: Level,
        event_id: EventId,
        state: LogState,
        error: Option<SharedError>,
        formatter: F,
    ) -> Result<(), OutputError>
    where
        F: FnOnce(&LogState, Option<&SharedError>) -> String,
        Self: Sized,
    {
        if !self.is_enabled(level) {
            return Ok(());
        }
        let message = formatter(&state, error.as_ref());
        self.log(LogEntry {
            level,
            event_id,
            message,
            state,
            error,
        })
    }

    /// Enter a logging scope.
    fn begin_scope(&self, _name: &str) -> ScopeGuard {
        ScopeGuard::default()
    }
}

/// Logger that records every accepted event for later assertions.
///
/// Records are only ever appended, in acceptance order. When the logger's
/// category is in the echo set, each accepted event is also written to the
/// test output; a write made after the test has ended is discarded.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use testlog::Level;
/// use testlog_capture::config::EchoCategories;
/// use testlog_capture::logger::{CapturingLogger, LogEntry, LogSink};
/// use testlog_capture::output::TestOutputBuffer;
///
/// let output = TestOutputBuffer::new();
/// let echo: EchoCategories = ["Worker"].into_iter().collect();
/// let logger =
///     CapturingLogger::with_echo_categories(Arc::new(output.clone()), "Worker", None, &echo);
///
/// logger.log(LogEntry::new(Level::Information, "started")).expect("echo");
/// assert_eq!(logger.messages(), ["started"]);
/// assert!(output.contents().ends_with(": started"));
/// ```
pub struct CapturingLogger {
    category: String,
    filter: Option<CategoryFilter>,
    echo_enabled: bool,
    output: Arc<dyn TestOutput>,
    records: Mutex<Vec<LogRecord>>,
}

impl fmt::Debug for CapturingLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturingLogger")
            .field("category", &self.category)
            .field("filtered", &self.filter.is_some())
            .field("echo_enabled", &self.echo_enabled)
            .field("records", &self.len())
            .finish_non_exhaustive()
    }
}

impl CapturingLogger {
    /// Create a logger whose echo setting comes from the process-wide
    /// [`EchoCategories::global`] set.
    pub fn new(
        output: Arc<dyn TestOutput>,
        category: impl Into<String>,
        filter: Option<CategoryFilter>,
    ) -> Self {
        Self::with_echo_categories(output, category, filter, EchoCategories::global())
    }

    /// Create a logger that echoes when `category` is in `echo`.
    pub fn with_echo_categories(
        output: Arc<dyn TestOutput>,
        category: impl Into<String>,
        filter: Option<CategoryFilter>,
        echo: &EchoCategories,
    ) -> Self {
        let category = category.into();
        let echo_enabled = echo.contains(&category);
        Self {
            category,
            filter,
            echo_enabled,
            output,
            records: Mutex::new(Vec::new()),
        }
    }

    /// Name this logger records under.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Returns whether accepted events are written to the test output.
    #[must_use]
    pub const fn echo_enabled(&self) -> bool {
        self.echo_enabled
    }

    // Appends never leave the vector half-updated, so a poisoned lock is
    // still consistent.
    fn lock_records(&self) -> MutexGuard<'_, Vec<LogRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the captured records in acceptance order.
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.lock_records().clone()
    }

    /// Rendered messages of the captured records in acceptance order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.lock_records()
            .iter()
            .map(|record| record.message.clone())
            .collect()
    }

    /// Number of captured records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock_records().len()
    }

    /// Returns whether nothing has been captured yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock_records().is_empty()
    }

    fn echo(&self, message: &str) -> Result<(), OutputError> {
        let timestamp = Local::now().to_rfc3339_opts(SecondsFormat::Micros, false);
        match self.output.write_line(&format!("    {timestamp}: {message}")) {
            // Late events from background work arrive after the test ended.
            Err(OutputError::NoActiveTest) => Ok(()),
            other => other,
        }
    }

    // Callers have already applied the filter.
    fn append(&self, entry: LogEntry) -> Result<(), OutputError> {
        let record = LogRecord {
            level: entry.level,
            event_id: entry.event_id,
            state: entry.state.into_fields(),
            error: entry.error,
            message: entry.message,
            category: self.category.clone(),
        };
        let message = self.echo_enabled.then(|| record.message.clone());
        self.lock_records().push(record);

        match message {
            Some(message) => self.echo(&message),
            None => Ok(()),
        }
    }
}

impl LogSink for CapturingLogger {
    fn is_enabled(&self, level: Level) -> bool {
        self.filter
            .as_ref()
            .is_none_or(|filter| filter(&self.category, level))
    }

    /// Record `entry`, then echo it.
    ///
    /// The record is appended before the echo write, so it is kept even when
    /// the write fails.
    fn log(&self, entry: LogEntry) -> Result<(), OutputError> {
        if !self.is_enabled(entry.level) {
            return Ok(());
        }
        self.append(entry)
    }

    fn log_with<F>(
        &self,
        level: Level,
        event_id: EventId,
        state: LogState,
        error: Option<SharedError>,
        formatter: F,
    ) -> Result<(), OutputError>
    where
        F: FnOnce(&LogState, Option<&SharedError>) -> String,
        Self: Sized,
    {
        if !self.is_enabled(level) {
            return Ok(());
        }
        let message = formatter(&state, error.as_ref());
        self.append(LogEntry {
            level,
            event_id,
            message,
            state,
            error,
        })
    }
}
