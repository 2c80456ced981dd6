//! Step definitions for the behavioural tests.

mod capture_steps;

pub use capture_steps::CaptureWorld;
