//! Per-category logger factory.
//!
//! A [`CapturingLoggerProvider`] hands out one [`CapturingLogger`] per
//! category, all sharing the same test output, filter and echo set, and can
//! collect the records of every logger it created.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use testlog::{Level, LogRecord};

use crate::config::EchoCategories;
use crate::logger::{CapturingLogger, CategoryFilter};
use crate::output::TestOutput;

/// Creates and remembers capturing loggers for a single test.
pub struct CapturingLoggerProvider {
    output: Arc<dyn TestOutput>,
    filter: Option<CategoryFilter>,
    echo: EchoCategories,
    loggers: Mutex<Vec<Arc<CapturingLogger>>>,
}

impl std::fmt::Debug for CapturingLoggerProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturingLoggerProvider")
            .field("echo", &self.echo)
            .field("loggers", &*self.lock_loggers())
            .finish_non_exhaustive()
    }
}

impl CapturingLoggerProvider {
    /// Provider using the process-wide echo set.
    pub fn new(output: Arc<dyn TestOutput>, filter: Option<CategoryFilter>) -> Self {
        Self::with_echo_categories(output, filter, EchoCategories::global().clone())
    }

    /// Provider echoing the categories in `echo`.
    pub fn with_echo_categories(
        output: Arc<dyn TestOutput>,
        filter: Option<CategoryFilter>,
        echo: EchoCategories,
    ) -> Self {
        Self {
            output,
            filter,
            echo,
            loggers: Mutex::new(Vec::new()),
        }
    }

    fn lock_loggers(&self) -> MutexGuard<'_, Vec<Arc<CapturingLogger>>> {
        self.loggers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns whether the shared filter accepts `level` for `category`.
    ///
    /// Creates no logger.
    #[must_use]
    pub fn is_enabled(&self, category: &str, level: Level) -> bool {
        self.filter
            .as_ref()
            .is_none_or(|filter| filter(category, level))
    }

    /// Logger for `category`, created on first request.
    pub fn logger(&self, category: &str) -> Arc<CapturingLogger> {
        let mut loggers = self.lock_loggers();
        if let Some(existing) = loggers.iter().find(|l| l.category() == category) {
            return Arc::clone(existing);
        }
        let logger = Arc::new(CapturingLogger::with_echo_categories(
            Arc::clone(&self.output),
            category,
            self.filter.clone(),
            &self.echo,
        ));
        loggers.push(Arc::clone(&logger));
        logger
    }

    /// Loggers created so far, in creation order.
    #[must_use]
    pub fn loggers(&self) -> Vec<Arc<CapturingLogger>> {
        self.lock_loggers().clone()
    }

    /// Records of every logger, grouped by logger in creation order.
    #[must_use]
    pub fn all_records(&self) -> Vec<LogRecord> {
        self.loggers()
            .iter()
            .flat_map(|logger| logger.records())
            .collect()
    }

    /// Records captured for `category`; empty when no such logger exists.
    #[must_use]
    pub fn records_for(&self, category: &str) -> Vec<LogRecord> {
        self.lock_loggers()
            .iter()
            .find(|l| l.category() == category)
            .map(|l| l.records())
            .unwrap_or_default()
    }
}
