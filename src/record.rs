//! Captured log records and the structured state attached to them.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::{EventId, Level};

/// Error object shared between the caller and any captured records.
pub type SharedError = Arc<dyn Error + Send + Sync + 'static>;

/// Ordered key-value pairs attached to a log call.
///
/// Insertion order is preserved and duplicate keys are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Fields(Vec<(String, Value)>);

impl Fields {
    /// Create an empty set of fields.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a field.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.push((key.into(), value.into()));
    }

    /// Append a field and return the updated set.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(key, value);
        self
    }

    /// Value of the first field named `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Iterate over the fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether no field has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Fields
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// State supplied with a log call.
///
/// The caller decides whether the payload is structured; nothing is
/// inferred from the payload's shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LogState {
    /// Key-value pairs that are captured alongside the message.
    Structured(Fields),
    /// State that carries no capturable fields.
    #[default]
    Opaque,
}

impl LogState {
    /// Fields carried by a structured state.
    #[must_use]
    pub const fn fields(&self) -> Option<&Fields> {
        match self {
            Self::Structured(fields) => Some(fields),
            Self::Opaque => None,
        }
    }

    /// Consume the state, keeping only structured fields.
    #[must_use]
    pub fn into_fields(self) -> Option<Fields> {
        match self {
            Self::Structured(fields) => Some(fields),
            Self::Opaque => None,
        }
    }
}

impl From<Fields> for LogState {
    fn from(fields: Fields) -> Self {
        Self::Structured(fields)
    }
}

/// Owned snapshot of an error that was only available by reference.
///
/// Keeps the display text of the error and of every error in its
/// `source()` chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedError {
    message: String,
    causes: Vec<String>,
}

impl CapturedError {
    /// Snapshot `err` and its source chain.
    #[must_use]
    pub fn capture(err: &(dyn Error + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        Self {
            message: err.to_string(),
            causes,
        }
    }

    /// Display text of the captured error.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Display text of each error in the source chain, outermost first.
    #[must_use]
    pub fn causes(&self) -> &[String] {
        &self.causes
    }
}

impl fmt::Display for CapturedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for CapturedError {}

/// A log event captured by a test logger.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    /// Severity of the event.
    pub level: Level,
    /// Correlation identifier supplied by the caller.
    pub event_id: EventId,
    /// Structured fields; `None` when the caller supplied opaque state.
    pub state: Option<Fields>,
    /// Error attached to the call, if any.
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<SharedError>,
    /// Message rendered once at capture time.
    pub message: String,
    /// Name of the logger that produced the record.
    pub category: String,
}

impl LogRecord {
    /// Serialise the record as a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if a field value cannot be represented as JSON.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.category, self.message)
    }
}

fn serialize_error<S: Serializer>(
    error: &Option<SharedError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    error.as_ref().map(ToString::to_string).serialize(serializer)
}
