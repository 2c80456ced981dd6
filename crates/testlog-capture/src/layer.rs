//! Bridge from `tracing` events to capturing loggers.
//!
//! [`CaptureLayer`] routes each event to the provider's logger for the
//! event's target. Code under test keeps logging through `tracing` macros:
//!
//! ```
//! use std::sync::Arc;
//! use testlog_capture::layer::CaptureLayer;
//! use testlog_capture::output::TestOutputBuffer;
//! use testlog_capture::provider::CapturingLoggerProvider;
//! use tracing_subscriber::layer::SubscriberExt as _;
//!
//! let provider = Arc::new(CapturingLoggerProvider::with_echo_categories(
//!     Arc::new(TestOutputBuffer::new()),
//!     None,
//!     Default::default(),
//! ));
//! let subscriber = tracing_subscriber::registry().with(CaptureLayer::new(Arc::clone(&provider)));
//! tracing::subscriber::with_default(subscriber, || {
//!     tracing::info!(target: "Worker", event_id = 7, job = "42", "job started");
//! });
//! assert_eq!(provider.records_for("Worker")[0].message, "job started");
//! ```

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use serde_json::{Number, Value};
use testlog::{CapturedError, EventId, Fields, Level, LogState, SharedError};
use tracing::field::{Field, Visit};
use tracing::subscriber::Interest;
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::logger::{LogEntry, LogSink};
use crate::provider::CapturingLoggerProvider;

const MESSAGE_FIELD: &str = "message";
const EVENT_ID_FIELD: &str = "event_id";
const EVENT_NAME_FIELD: &str = "event_name";
const ERROR_FIELD: &str = "error";

/// Convert a `tracing` level to a capture level.
#[must_use]
pub fn level_from_tracing(level: tracing::Level) -> Level {
    match level {
        tracing::Level::TRACE => Level::Trace,
        tracing::Level::DEBUG => Level::Debug,
        tracing::Level::INFO => Level::Information,
        tracing::Level::WARN => Level::Warning,
        _ => Level::Error,
    }
}

/// `tracing_subscriber` layer that captures events per target.
#[derive(Debug, Clone)]
pub struct CaptureLayer {
    provider: Arc<CapturingLoggerProvider>,
}

impl CaptureLayer {
    /// Layer feeding events into `provider`.
    pub const fn new(provider: Arc<CapturingLoggerProvider>) -> Self {
        Self { provider }
    }

    /// Provider receiving the captured events.
    #[must_use]
    pub fn provider(&self) -> &Arc<CapturingLoggerProvider> {
        &self.provider
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    // Interest is cached across every live dispatcher; decide per event.
    fn register_callsite(&self, _metadata: &'static Metadata<'static>) -> Interest {
        Interest::sometimes()
    }

    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        !metadata.is_event()
            || self
                .provider
                .is_enabled(metadata.target(), level_from_tracing(*metadata.level()))
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let entry = LogEntry {
            level: level_from_tracing(*metadata.level()),
            event_id: visitor.event_id(),
            message: visitor.message.unwrap_or_default(),
            state: LogState::Structured(visitor.fields),
            error: visitor.error,
        };
        if let Err(e) = self.provider.logger(metadata.target()).log(entry) {
            panic!("failed to echo `{}` event to test output: {e}", metadata.target());
        }
    }
}

#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    event_id: Option<i32>,
    event_name: Option<String>,
    error: Option<SharedError>,
    fields: Fields,
}

impl EventVisitor {
    fn event_id(&mut self) -> EventId {
        EventId {
            id: self.event_id.unwrap_or_default(),
            name: self.event_name.take(),
        }
    }

    fn record_value(&mut self, field: &Field, value: Value) {
        match field.name() {
            EVENT_ID_FIELD => {
                if let Some(id) = value.as_i64().and_then(|id| i32::try_from(id).ok()) {
                    self.event_id = Some(id);
                    return;
                }
                self.fields.push(field.name(), value);
            }
            MESSAGE_FIELD => self.message = Some(value_text(value)),
            EVENT_NAME_FIELD => self.event_name = Some(value_text(value)),
            name => self.fields.push(name, value),
        }
    }
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

impl Visit for EventVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        let value = Number::from_f64(value).map_or(Value::Null, Value::Number);
        self.record_value(field, value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_value(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        if field.name() == ERROR_FIELD {
            self.error = Some(Arc::new(CapturedError::capture(value)));
        } else {
            self.record_value(field, Value::from(value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_value(field, Value::from(format!("{value:?}")));
    }
}
