//! Test support utilities.
//!
//! Shared by the workspace's unit, integration and behavioural tests.

pub mod env_guard;
pub mod formatter;

pub use env_guard::EnvVarGuard;
pub use formatter::CountingFormatter;
