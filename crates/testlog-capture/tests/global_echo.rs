//! Tests for loggers that read the process-wide echo set.
//!
//! Kept in their own test binary so the global set is loaded exactly once,
//! from the environment prepared here.

use std::sync::Arc;

use test_support::EnvVarGuard;
use testlog::Level;
use testlog_capture::output::TestOutputBuffer;
use testlog_capture::{CapturingLogger, CapturingLoggerProvider, EchoCategories, LogEntry, LogSink};

#[test]
#[serial_test::serial]
fn global_echo_set_comes_from_environment() {
    {
        let _env = EnvVarGuard::set("TESTLOG_ECHO_CATEGORIES", "Worker, Scheduler")
            .and_set("TESTLOG_CONFIG", "/nonexistent/testlog.toml");
        assert!(EchoCategories::global().contains("Worker"));
    }
    // Loaded once; later environment changes have no effect.
    let _env = EnvVarGuard::set("TESTLOG_ECHO_CATEGORIES", "Listener");
    assert!(EchoCategories::global().contains("Scheduler"));
    assert!(!EchoCategories::global().contains("Listener"));

    let output = TestOutputBuffer::new();
    let worker = CapturingLogger::new(Arc::new(output.clone()), "Worker", None);
    let listener = CapturingLogger::new(Arc::new(output.clone()), "Listener", None);
    assert!(worker.echo_enabled());
    assert!(!listener.echo_enabled());

    worker
        .log(LogEntry::new(Level::Information, "from worker"))
        .expect("echo succeeds");
    listener
        .log(LogEntry::new(Level::Information, "from listener"))
        .expect("no echo");
    assert_eq!(output.lines().len(), 1);
    assert!(output.contents().ends_with(": from worker"));

    let provider = CapturingLoggerProvider::new(Arc::new(output.clone()), None);
    assert!(provider.logger("Scheduler").echo_enabled());
    assert_eq!(
        EchoCategories::install_global(EchoCategories::new()),
        Err(EchoCategories::new())
    );
}
