//! Shared types for the testlog project.
//!
//! This library defines the data captured by the test loggers in
//! `testlog-capture`: severity levels, event identifiers, structured state
//! and the captured [`LogRecord`] itself.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod record;

pub use record::{CapturedError, Fields, LogRecord, LogState, SharedError};

/// Severity of a log event, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    /// Very detailed diagnostics.
    Trace,
    /// Development-time diagnostics.
    Debug,
    /// Normal operational messages.
    Information,
    /// Unexpected but recoverable conditions.
    Warning,
    /// Failures of the current operation.
    Error,
    /// Failures that leave the component unusable.
    Critical,
}

impl Level {
    /// All levels in ascending severity.
    pub const ALL: [Self; 6] = [
        Self::Trace,
        Self::Debug,
        Self::Information,
        Self::Warning,
        Self::Error,
        Self::Critical,
    ];

    /// Short name used when rendering records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Information => "info",
            Self::Warning => "warn",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier correlating related log statements.
///
/// The numeric id is opaque; `0` with no name is the "unspecified" event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId {
    /// Numeric identifier.
    pub id: i32,
    /// Optional human-readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EventId {
    /// Create an event id without a name.
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self { id, name: None }
    }

    /// Create an event id carrying a name.
    #[must_use]
    pub fn named(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }
}

impl From<i32> for EventId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)?;
        if let Some(name) = &self.name {
            write!(f, " ({name})")?;
        }
        Ok(())
    }
}
