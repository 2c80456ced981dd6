//! Logging initialisation for tests.
//!
//! Installs a `tracing-subscriber` registry whose [`CaptureLayer`] feeds a
//! [`CapturingLoggerProvider`], so events emitted through `tracing` by the
//! code under test are captured.

use std::sync::Arc;

use tracing::Subscriber;
use tracing::subscriber::{DefaultGuard, SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

use crate::layer::CaptureLayer;
use crate::provider::CapturingLoggerProvider;

/// Build a subscriber capturing into `provider`, filtered by `filter`.
pub fn subscriber(
    provider: Arc<CapturingLoggerProvider>,
    filter: EnvFilter,
) -> impl Subscriber + Send + Sync {
    tracing_subscriber::registry()
        .with(filter)
        .with(CaptureLayer::new(provider))
}

/// Initialise the global subscriber, reading the filter from `RUST_LOG`.
///
/// # Panics
///
/// Panics if a global subscriber is already installed; use [`try_init`] to
/// handle that case.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use testlog_capture::logging::init;
/// use testlog_capture::output::StdoutOutput;
/// use testlog_capture::provider::CapturingLoggerProvider;
///
/// let provider = Arc::new(CapturingLoggerProvider::new(Arc::new(StdoutOutput), None));
/// init(Arc::clone(&provider));
/// tracing::info!("Logging is initialised!");
/// ```
pub fn init(provider: Arc<CapturingLoggerProvider>) {
    subscriber(provider, EnvFilter::from_default_env()).init();
}

/// Initialise the global subscriber, reading the filter from `RUST_LOG`.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn try_init(provider: Arc<CapturingLoggerProvider>) -> Result<(), SetGlobalDefaultError> {
    tracing::subscriber::set_global_default(subscriber(provider, EnvFilter::from_default_env()))
}

/// Capture into `provider` on the current thread until the guard drops.
///
/// The filter is given explicitly so tests never depend on the environment.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use testlog_capture::logging::set_default;
/// use testlog_capture::output::TestOutputBuffer;
/// use testlog_capture::provider::CapturingLoggerProvider;
///
/// let provider = Arc::new(CapturingLoggerProvider::with_echo_categories(
///     Arc::new(TestOutputBuffer::new()),
///     None,
///     Default::default(),
/// ));
/// let _guard = set_default(Arc::clone(&provider), "info");
/// tracing::debug!("filtered out");
/// tracing::info!("captured");
/// assert_eq!(provider.all_records().len(), 1);
/// ```
#[must_use = "capture stops when the guard is dropped"]
pub fn set_default(provider: Arc<CapturingLoggerProvider>, filter: &str) -> DefaultGuard {
    subscriber(provider, EnvFilter::new(filter)).set_default()
}
