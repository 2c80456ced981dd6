#![cfg_attr(docsrs, feature(doc_cfg))]

//! Capturing loggers for tests.
//!
//! # Overview
//! This crate exposes:
//! - [`logger::CapturingLogger`] — records every accepted event in memory and
//!   echoes selected categories to the running test's output.
//! - [`output`] — the test-output sinks echo lines are written to.
//! - [`config::EchoCategories`] — the process-wide set of echoing categories,
//!   loaded from `testlog.toml` and `TESTLOG_*` environment variables.
//! - [`provider::CapturingLoggerProvider`] — one logger per category with
//!   aggregated records.
//! - [`layer::CaptureLayer`] and [`logging`] — capture of `tracing` events.
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use testlog::Level;
//! use testlog_capture::logger::{LogEntry, LogSink};
//! use testlog_capture::output::TestOutputBuffer;
//! use testlog_capture::provider::CapturingLoggerProvider;
//!
//! let provider = CapturingLoggerProvider::with_echo_categories(
//!     Arc::new(TestOutputBuffer::new()),
//!     None,
//!     ["Worker"].into_iter().collect(),
//! );
//! let logger = provider.logger("Worker");
//! logger.log(LogEntry::new(Level::Warning, "queue is full")).expect("echo");
//! assert_eq!(provider.all_records().len(), 1);
//! ```
pub mod config;
pub mod layer;
pub mod logger;
pub mod logging;
pub mod output;
pub mod provider;

pub use config::{EchoCategories, EchoConfig};
pub use logger::{CapturingLogger, CategoryFilter, LogEntry, LogSink, ScopeGuard};
pub use output::{OutputError, StdoutOutput, TestOutput, TestOutputBuffer, WriterOutput};
pub use provider::CapturingLoggerProvider;
