//! Echo configuration for test loggers.
//!
//! Decides which logger categories echo their records to the live test
//! output. Values come from an optional `testlog.toml` and may be overridden
//! by environment variables using the `TESTLOG_` prefix:
//!
//! ```toml
//! echo_categories = ["Worker", "Scheduler"]
//! ```
//!
//! or `TESTLOG_ECHO_CATEGORIES=Worker,Scheduler`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Prefix of environment variables that override file values.
pub const ENV_PREFIX: &str = "TESTLOG_";
/// Environment variable naming the configuration file.
pub const CONFIG_PATH_VAR: &str = "TESTLOG_CONFIG";

static GLOBAL: OnceLock<EchoCategories> = OnceLock::new();

/// Errors raised while loading the echo configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The requested configuration file does not exist.
    #[error("configuration file not found: {}", .path.display())]
    NotFound { path: PathBuf },
    /// The merged configuration could not be extracted.
    #[error(transparent)]
    Extract(#[from] Box<figment::Error>),
}

/// Set of logger categories whose records are echoed to the test output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EchoCategories(BTreeSet<String>);

impl EchoCategories {
    /// An empty set; no category echoes.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Returns whether `category` echoes its records.
    #[must_use]
    pub fn contains(&self, category: &str) -> bool {
        self.0.contains(category)
    }

    /// Returns whether no category echoes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the category names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Process-wide set, loaded from [`EchoConfig::load`] on first use.
    ///
    /// A configuration that fails to load leaves echo disabled for every
    /// category.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(|| match EchoConfig::load() {
            Ok(cfg) => {
                tracing::debug!(categories = ?cfg.echo_categories, "Loaded echo categories");
                cfg.echo_categories
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load echo categories; echo disabled");
                Self::new()
            }
        })
    }

    /// Install the process-wide set before anything reads it.
    ///
    /// # Errors
    ///
    /// Returns `categories` unchanged when the global set was already
    /// initialised.
    pub fn install_global(categories: Self) -> Result<(), Self> {
        GLOBAL.set(categories)
    }
}

impl<S: Into<String>> FromIterator<S> for EchoCategories {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Echo configuration as loaded from file and environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EchoConfig {
    /// Categories echoed to the live test output.
    #[serde(default, deserialize_with = "deserialize_categories")]
    pub echo_categories: EchoCategories,
}

impl EchoConfig {
    /// Default configuration file, relative to the working directory.
    pub const DEFAULT_PATH: &'static str = "testlog.toml";

    /// Load the configuration from the file named by `TESTLOG_CONFIG` (or
    /// [`Self::DEFAULT_PATH`]) and `TESTLOG_*` environment variables.
    ///
    /// A missing file is not an error; the environment alone applies.
    ///
    /// # Errors
    ///
    /// Returns an error when the file or environment values are malformed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_PATH_VAR)
            .map_or_else(|| PathBuf::from(Self::DEFAULT_PATH), PathBuf::from);
        Self::extract(Figment::from(Toml::file(path)))
    }

    /// Load the configuration from `path`, merging `TESTLOG_*` environment
    /// variables over file values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] when `path` does not exist, or an
    /// extraction error when the contents are malformed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Self::extract(Figment::from(Toml::file(path)))
    }

    fn extract(fig: Figment) -> Result<Self, ConfigError> {
        let fig = fig.merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]));
        fig.extract().map_err(|e| ConfigError::from(Box::new(e)))
    }
}

fn deserialize_categories<'de, D>(deserializer: D) -> Result<EchoCategories, D::Error>
where
    D: Deserializer<'de>,
{
    // Environment values arrive as scalars: `42` and `true` are names too.
    let names = match Value::deserialize(deserializer)? {
        Value::String(joined) => joined.split(',').map(str::to_owned).collect(),
        Value::Array(items) => items
            .into_iter()
            .map(|item| category_name(item).ok_or_else(|| D::Error::custom(NOT_A_NAME)))
            .collect::<Result<Vec<_>, _>>()?,
        Value::Null => Vec::new(),
        other => vec![category_name(other).ok_or_else(|| D::Error::custom(NOT_A_NAME))?],
    };
    Ok(names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .collect())
}

const NOT_A_NAME: &str = "expected a category name or a list of names";

fn category_name(value: Value) -> Option<String> {
    match value {
        Value::String(name) => Some(name),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use tempfile::tempdir;

    use test_support::env_guard::{EnvVarGuard, remove_env_var};

    const CATEGORIES_VAR: &str = "TESTLOG_ECHO_CATEGORIES";

    #[rstest]
    #[serial_test::serial]
    fn loads_from_file() {
        remove_env_var(CATEGORIES_VAR);
        let dir = tempdir().unwrap();
        let path = dir.path().join("testlog.toml");
        fs::write(&path, "echo_categories = ['Worker', 'Scheduler']").unwrap();
        let cfg = EchoConfig::from_file(&path).unwrap();
        assert!(cfg.echo_categories.contains("Worker"));
        assert!(cfg.echo_categories.contains("Scheduler"));
        assert!(!cfg.echo_categories.contains("Listener"));
    }

    #[rstest]
    #[serial_test::serial]
    fn error_when_missing_file() {
        let res = EchoConfig::from_file(Path::new("/nonexistent/testlog.toml"));
        assert!(matches!(res, Err(ConfigError::NotFound { .. })));
    }

    #[rstest]
    #[serial_test::serial]
    fn error_with_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("testlog.toml");
        fs::write(&path, "echo_categories = [ this is not toml").unwrap();
        assert!(EchoConfig::from_file(&path).is_err());
    }

    #[rstest]
    #[serial_test::serial]
    fn env_var_overrides_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("testlog.toml");
        fs::write(&path, "echo_categories = ['Worker']").unwrap();
        let _guard = EnvVarGuard::set(CATEGORIES_VAR, "Listener");
        let cfg = EchoConfig::from_file(&path).unwrap();
        assert_eq!(cfg.echo_categories.iter().collect::<Vec<_>>(), ["Listener"]);
    }

    #[rstest]
    #[case::comma_separated("Worker,Scheduler", &["Scheduler", "Worker"])]
    #[case::padded(" Worker , Scheduler ", &["Scheduler", "Worker"])]
    #[case::trailing_comma("Worker,", &["Worker"])]
    #[case::blank("", &[])]
    #[case::numeric("42", &["42"])]
    #[case::boolean("true", &["true"])]
    #[case::mixed("Worker,42", &["42", "Worker"])]
    #[serial_test::serial]
    fn env_var_accepts_joined_list(#[case] value: &str, #[case] expected: &[&str]) {
        let _config = EnvVarGuard::set(CONFIG_PATH_VAR, "/nonexistent/testlog.toml");
        let _guard = EnvVarGuard::set(CATEGORIES_VAR, value);
        let cfg = EchoConfig::load().unwrap();
        assert_eq!(cfg.echo_categories.iter().collect::<Vec<_>>(), expected);
    }

    #[rstest]
    #[serial_test::serial]
    fn load_without_file_or_env_is_empty() {
        let _config = EnvVarGuard::set(CONFIG_PATH_VAR, "/nonexistent/testlog.toml");
        let _guard = EnvVarGuard::remove(CATEGORIES_VAR);
        let cfg = EchoConfig::load().unwrap();
        assert!(cfg.echo_categories.is_empty());
    }

    #[rstest]
    #[serial_test::serial]
    fn load_reads_file_named_by_env() {
        let _guard = EnvVarGuard::remove(CATEGORIES_VAR);
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "echo_categories = 'Worker'").unwrap();
        let _config = EnvVarGuard::set(CONFIG_PATH_VAR, path.to_str().unwrap());
        let cfg = EchoConfig::load().unwrap();
        assert!(cfg.echo_categories.contains("Worker"));
    }

    #[rstest]
    #[serial_test::serial]
    fn file_list_accepts_scalar_names() {
        let _guard = EnvVarGuard::remove(CATEGORIES_VAR);
        let dir = tempdir().unwrap();
        let path = dir.path().join("testlog.toml");
        fs::write(&path, "echo_categories = ['Worker', 7, false]").unwrap();
        let cfg = EchoConfig::from_file(&path).unwrap();
        assert_eq!(
            cfg.echo_categories.iter().collect::<Vec<_>>(),
            ["7", "Worker", "false"]
        );
    }

    #[rstest]
    #[serial_test::serial]
    fn nested_table_is_rejected() {
        let _guard = EnvVarGuard::remove(CATEGORIES_VAR);
        let dir = tempdir().unwrap();
        let path = dir.path().join("testlog.toml");
        fs::write(&path, "[echo_categories]\nWorker = true").unwrap();
        assert!(matches!(
            EchoConfig::from_file(&path),
            Err(ConfigError::Extract(_))
        ));
    }

    #[test]
    fn categories_collect_from_names() {
        let set: EchoCategories = ["b", "a", "b"].into_iter().collect();
        assert_eq!(set.iter().collect::<Vec<_>>(), ["a", "b"]);
        assert!(!EchoCategories::new().contains("a"));
    }
}
