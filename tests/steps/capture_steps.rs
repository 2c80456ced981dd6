//! Behavioural steps for capturing and echoing log records.
#![expect(
    clippy::expect_used,
    clippy::needless_pass_by_value,
    reason = "simplify test failure output"
)]

use std::io;
use std::sync::Arc;

use cucumber::{World, given, then, when};
use test_support::CountingFormatter;
use testlog::{EventId, Fields, Level, LogState};
use testlog_capture::output::{OutputError, TestOutput, TestOutputBuffer};
use testlog_capture::{CapturingLogger, CategoryFilter, EchoCategories, LogEntry, LogSink};

#[derive(Debug)]
struct BrokenOutput;

impl TestOutput for BrokenOutput {
    fn write_line(&self, _line: &str) -> Result<(), OutputError> {
        Err(OutputError::Io(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "test runner disconnected",
        )))
    }
}

#[derive(Debug, Default, World)]
pub struct CaptureWorld {
    echo: EchoCategories,
    output: TestOutputBuffer,
    logger: Option<CapturingLogger>,
    counter: Option<CountingFormatter>,
    last_state: Option<LogState>,
    result: Option<Result<(), OutputError>>,
}

impl CaptureWorld {
    fn logger(&self) -> &CapturingLogger {
        self.logger.as_ref().expect("logger created in a Given step")
    }

    fn build_logger(
        &mut self,
        category: &str,
        output: Arc<dyn TestOutput>,
        filter: Option<CategoryFilter>,
    ) {
        self.logger = Some(CapturingLogger::with_echo_categories(
            output,
            category,
            filter,
            &self.echo,
        ));
    }
}

fn parse_level(name: &str) -> Level {
    serde_json::from_value(serde_json::Value::from(name)).expect("known level name")
}

#[given(regex = r#"^the echo categories "([^"]*)"$"#)]
fn echo_categories(world: &mut CaptureWorld, names: String) {
    world.echo = names.split(',').map(str::trim).collect();
}

#[given(regex = r#"^a capturing logger for "(\w+)"$"#)]
fn capturing_logger(world: &mut CaptureWorld, category: String) {
    let output = Arc::new(world.output.clone());
    world.build_logger(&category, output, None);
}

#[given(regex = r#"^a capturing logger for "(\w+)" accepting (\w+) and above$"#)]
fn filtered_logger(world: &mut CaptureWorld, category: String, minimum: String) {
    let minimum = parse_level(&minimum);
    let filter: CategoryFilter = Arc::new(move |_: &str, level: Level| level >= minimum);
    let output = Arc::new(world.output.clone());
    world.build_logger(&category, output, Some(filter));
}

#[given(regex = r#"^a capturing logger for "(\w+)" writing to a broken output$"#)]
fn broken_logger(world: &mut CaptureWorld, category: String) {
    world.build_logger(&category, Arc::new(BrokenOutput), None);
}

#[given("the test output has finished")]
fn output_finished(world: &mut CaptureWorld) {
    world.output.finish();
}

#[when(regex = r#"^an? (\w+) event (\d+) with job "([^"]*)" is logged$"#)]
fn event_is_logged(world: &mut CaptureWorld, level: String, id: i32, job: String) {
    let counter = CountingFormatter::new("processing");
    let state = LogState::Structured(Fields::new().with("job", job));
    let result = world.logger().log_with(
        parse_level(&level),
        EventId::new(id),
        state.clone(),
        None,
        counter.formatter(),
    );
    world.counter = Some(counter);
    world.last_state = Some(state);
    world.result = Some(result);
}

#[when(regex = r"^(\d+) (\w+) events are logged$")]
fn events_are_logged(world: &mut CaptureWorld, count: i32, level: String) {
    let level = parse_level(&level);
    for n in 0..count {
        let entry = LogEntry::new(level, format!("event {n}")).with_event_id(n);
        world.logger().log(entry).expect("no echo failure");
    }
}

#[then("the log call succeeds")]
fn log_call_succeeds(world: &mut CaptureWorld) {
    match world.result.take() {
        Some(Ok(())) => {}
        other => panic!("expected success, got {other:?}"),
    }
}

#[then("the log call fails with an I/O error")]
fn log_call_fails(world: &mut CaptureWorld) {
    match world.result.take() {
        Some(Err(OutputError::Io(e))) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
        other => panic!("expected an I/O error, got {other:?}"),
    }
}

#[then(regex = r"^(\d+) records? (?:is|are) captured$")]
fn records_captured(world: &mut CaptureWorld, count: usize) {
    assert_eq!(world.logger().len(), count);
}

#[then(regex = r#"^the last record has level (\w+), event id (\d+) and category "(\w+)"$"#)]
fn last_record_fields(world: &mut CaptureWorld, level: String, id: i32, category: String) {
    let records = world.logger().records();
    let record = records.last().expect("a record was captured");
    assert_eq!(record.level, parse_level(&level));
    assert_eq!(record.event_id, EventId::new(id));
    assert_eq!(record.category, category);
    assert_eq!(
        record.state.as_ref(),
        world.last_state.as_ref().and_then(LogState::fields)
    );
}

#[then("the last record message matches the formatter output")]
fn last_message_matches(world: &mut CaptureWorld) {
    let counter = world.counter.as_ref().expect("an event was logged");
    let state = world.last_state.as_ref().expect("an event was logged");
    let records = world.logger().records();
    let record = records.last().expect("a record was captured");
    assert_eq!(record.message, counter.render(state, None));
}

#[then(regex = r"^(\d+) lines? (?:is|are) echoed$")]
fn lines_echoed(world: &mut CaptureWorld, count: usize) {
    assert_eq!(world.output.lines().len(), count);
}

#[then(regex = r"^(\d+) lines? (?:is|are) echoed containing the last message$")]
fn lines_echoed_with_message(world: &mut CaptureWorld, count: usize) {
    let lines = world.output.lines();
    assert_eq!(lines.len(), count);
    let records = world.logger().records();
    let record = records.last().expect("a record was captured");
    assert!(lines.iter().all(|line| line.contains(&record.message)));
}

#[then(regex = r"^the formatter ran (\d+) times?$")]
fn formatter_ran(world: &mut CaptureWorld, count: usize) {
    let counter = world.counter.as_ref().expect("an event was logged");
    assert_eq!(counter.calls(), count);
}
