//! Test helpers for managing environment variables.
//!
//! `EnvVarGuard` overrides one or more environment variables (such as
//! `TESTLOG_ECHO_CATEGORIES` or `RUST_LOG`) and restores their previous
//! values on drop, in reverse order.

use std::ffi::OsString;

#[derive(Debug, Default)]
#[must_use = "the variable is restored when the guard is dropped"]
pub struct EnvVarGuard {
    saved: Vec<(String, Option<OsString>)>,
}

impl EnvVarGuard {
    /// Set an environment variable for the lifetime of the returned guard.
    pub fn set(key: &str, value: &str) -> Self {
        Self::default().and_set(key, value)
    }

    /// Remove an environment variable for the lifetime of the returned guard.
    pub fn remove(key: &str) -> Self {
        Self::default().and_remove(key)
    }

    /// Additionally set `key`, restoring it with the others.
    pub fn and_set(mut self, key: &str, value: &str) -> Self {
        self.saved.push((key.to_owned(), std::env::var_os(key)));
        set_env_var(key, value);
        self
    }

    /// Additionally remove `key`, restoring it with the others.
    pub fn and_remove(mut self, key: &str) -> Self {
        self.saved.push((key.to_owned(), std::env::var_os(key)));
        remove_env_var(key);
        self
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        while let Some((key, original)) = self.saved.pop() {
            match original {
                // Safety: callers hold `serial_test::serial`, so no other
                // thread reads the environment concurrently.
                Some(value) => unsafe { std::env::set_var(&key, value) },
                None => remove_env_var(&key),
            }
        }
    }
}

/// Set an environment variable for tests.
///
/// Callers must run serially (`#[serial_test::serial]`).
pub fn set_env_var(key: &str, value: &str) {
    // Safety: tests mutating the environment execute serially.
    unsafe { std::env::set_var(key, value) };
}

/// Remove an environment variable for tests.
///
/// Callers must run serially (`#[serial_test::serial]`).
pub fn remove_env_var(key: &str) {
    // Safety: tests mutating the environment execute serially.
    unsafe { std::env::remove_var(key) };
}
