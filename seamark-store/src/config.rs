//! Store configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all)
//! yields an in-memory store suitable for tests.

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fs::read_to_string;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// SQLite journal mode applied when the store opens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalMode {
    /// Rollback journal deleted after each transaction.
    Delete,
    /// Write-ahead log.
    #[default]
    Wal,
    /// Journal kept in memory.
    Memory,
}

impl JournalMode {
    pub(crate) const fn pragma_value(self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Wal => "WAL",
            Self::Memory => "MEMORY",
        }
    }
}

/// How SQLite coordinates access between processes sharing the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockingMode {
    /// File locks are released after each transaction.
    #[default]
    Normal,
    /// The first writer keeps the file locked until the connection closes.
    Exclusive,
}

impl LockingMode {
    pub(crate) const fn pragma_value(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Exclusive => "EXCLUSIVE",
        }
    }
}

/// Settings used by [`crate::Database::open`].
///
/// # Examples
/// ```
/// use seamark_store::{JournalMode, StoreConfig};
///
/// let config = StoreConfig::from_json(r#"{ "journal_mode": "delete" }"#)
///     .expect("parse configuration");
/// assert_eq!(config.journal_mode, JournalMode::Delete);
/// assert!(config.database_path.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file. `None` keeps the store in memory.
    pub database_path: Option<Utf8PathBuf>,
    /// How long a statement waits on a locked file before failing.
    pub busy_timeout_ms: u64,
    /// Journal mode.
    pub journal_mode: JournalMode,
    /// Inter-process locking mode.
    pub locking_mode: LockingMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: JournalMode::default(),
            locking_mode: LockingMode::default(),
        }
    }
}

/// Errors raised while loading a [`StoreConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read store configuration from {path}")]
    Read {
        /// File that was requested.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The configuration was not valid JSON for [`StoreConfig`].
    #[error("failed to parse store configuration")]
    Parse {
        /// JSON decoding failure.
        #[source]
        source: serde_json::Error,
    },
}

impl StoreConfig {
    /// Configuration for a file-backed store with default settings.
    #[must_use]
    pub fn at_path(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            database_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Parse configuration from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|source| ConfigError::Parse { source })
    }

    /// Load configuration from a JSON file.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let json = read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Busy timeout as a [`Duration`].
    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    fn empty_document_uses_defaults() {
        let config = StoreConfig::from_json("{}").expect("parse empty config");
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.busy_timeout(), Duration::from_secs(5));
    }

    #[rstest]
    #[case("\"wal\"", JournalMode::Wal)]
    #[case("\"delete\"", JournalMode::Delete)]
    #[case("\"memory\"", JournalMode::Memory)]
    fn parses_journal_modes(#[case] value: &str, #[case] expected: JournalMode) {
        let json = format!("{{ \"journal_mode\": {value} }}");
        let config = StoreConfig::from_json(&json).expect("parse config");
        assert_eq!(config.journal_mode, expected);
    }

    #[rstest]
    fn rejects_unknown_locking_mode() {
        let result = StoreConfig::from_json(r#"{ "locking_mode": "shared" }"#);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[rstest]
    fn loads_from_file() {
        let dir = TempDir::new().expect("create temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("store.json"))
            .expect("utf-8 temp path");
        std::fs::write(
            &path,
            r#"{ "database_path": "data/markers.db", "locking_mode": "exclusive" }"#,
        )
        .expect("write config");

        let config = StoreConfig::load(&path).expect("load config");

        assert_eq!(config.database_path.as_deref(), Some(Utf8Path::new("data/markers.db")));
        assert_eq!(config.locking_mode, LockingMode::Exclusive);
    }

    #[rstest]
    fn missing_file_reports_path() {
        let result = StoreConfig::load(Utf8Path::new("/nonexistent/seamark.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
