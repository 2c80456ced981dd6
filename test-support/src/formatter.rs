//! Formatters that count how often they run.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use testlog::{LogState, SharedError};

/// Produces formatters that render `"{prefix} {fields}"` and count calls.
///
/// Clones share the counter.
///
/// # Examples
///
/// ```
/// use testlog::LogState;
/// use test_support::CountingFormatter;
///
/// let counter = CountingFormatter::new("job");
/// let render = counter.formatter();
/// assert_eq!(render(&LogState::Opaque, None), "job");
/// assert_eq!(counter.calls(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct CountingFormatter {
    prefix: String,
    calls: Arc<AtomicUsize>,
}

impl CountingFormatter {
    /// Counter whose formatters start every message with `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of times any formatter from this counter has run.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Render `state` and `error` the way [`formatter`](Self::formatter)
    /// does, without counting.
    #[must_use]
    pub fn render(&self, state: &LogState, error: Option<&SharedError>) -> String {
        let mut out = self.prefix.clone();
        if let Some(fields) = state.fields() {
            for (key, value) in fields.iter() {
                out.push_str(&format!(" {key}={value}"));
            }
        }
        if let Some(err) = error {
            out.push_str(&format!(" error={err}"));
        }
        out
    }

    /// A formatter that renders like [`render`](Self::render) and counts.
    pub fn formatter(&self) -> impl Fn(&LogState, Option<&SharedError>) -> String + use<> {
        let this = self.clone();
        move |state: &LogState, error: Option<&SharedError>| {
            this.calls.fetch_add(1, Ordering::SeqCst);
            this.render(state, error)
        }
    }
}
