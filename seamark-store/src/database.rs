//! The single shared connection and the guard protecting it.

use std::fmt;

use camino::Utf8PathBuf;
use log::info;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use rusqlite::{Connection, Error as SqliteError};
use seamark_core::{AccessLock, AccessScope};
use thiserror::Error;

use crate::config::StoreConfig;
use crate::fs::ensure_parent_dir;
use crate::schema::{SchemaError, initialise_schema};

/// Borrowed connection, held while a leaf operation or adapter call runs.
pub type ConnectionGuard<'a> = ReentrantMutexGuard<'a, Connection>;

/// Errors raised while opening a [`Database`].
#[derive(Debug, Error)]
pub enum OpenStoreError {
    /// The directory for the database file could not be created.
    #[error("failed to create parent directory for {path}")]
    CreateDirectory {
        /// Database path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// SQLite could not open the database.
    #[error("failed to open SQLite database at {path}")]
    Open {
        /// Database path, or `:memory:`.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// A connection setting could not be applied.
    #[error("failed to apply SQLite setting {setting}")]
    Setting {
        /// Pragma or option being applied.
        setting: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Creating or validating the schema failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Explicit handle to the store, shared by every adapter.
///
/// Callers wrap each logical unit of work in [`Database::shared`] or
/// [`Database::exclusive`]; adapters never take the guard themselves. The
/// connection is additionally serialised per call because SQLite
/// connections cannot be used from two threads at once.
///
/// # Examples
/// ```
/// use seamark_store::Database;
///
/// let db = Database::open_in_memory().expect("open store");
/// let _scope = db.exclusive();
/// let tiles: i64 = db
///     .connection()
///     .query_row("SELECT COUNT(*) FROM tiles", [], |row| row.get(0))
///     .expect("count tiles");
/// assert_eq!(tiles, 0);
/// ```
pub struct Database {
    lock: AccessLock,
    connection: ReentrantMutex<Connection>,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("lock", &self.lock)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Open the store described by `config`, creating the schema if needed.
    pub fn open(config: &StoreConfig) -> Result<Self, OpenStoreError> {
        let Some(path) = config.database_path.as_deref() else {
            let connection = Connection::open_in_memory().map_err(|source| {
                OpenStoreError::Open {
                    path: Utf8PathBuf::from(":memory:"),
                    source,
                }
            })?;
            return Self::from_connection(connection, config);
        };

        ensure_parent_dir(path).map_err(|source| OpenStoreError::CreateDirectory {
            path: path.to_path_buf(),
            source,
        })?;
        let connection =
            Connection::open(path.as_std_path()).map_err(|source| OpenStoreError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        info!("opened marker store at {path}");
        Self::from_connection(connection, config)
    }

    /// Open a private in-memory store with default settings.
    pub fn open_in_memory() -> Result<Self, OpenStoreError> {
        Self::open(&StoreConfig::default())
    }

    fn from_connection(
        mut connection: Connection,
        config: &StoreConfig,
    ) -> Result<Self, OpenStoreError> {
        connection
            .busy_timeout(config.busy_timeout())
            .map_err(|source| OpenStoreError::Setting {
                setting: "busy_timeout",
                source,
            })?;
        apply_mode(&connection, "journal_mode", config.journal_mode.pragma_value())?;
        apply_mode(&connection, "locking_mode", config.locking_mode.pragma_value())?;
        initialise_schema(&mut connection)?;

        Ok(Self {
            lock: AccessLock::new(),
            connection: ReentrantMutex::new(connection),
        })
    }

    /// Acquire shared access for a read-only unit of work.
    pub fn shared(&self) -> AccessScope<'_> {
        self.lock.shared()
    }

    /// Acquire exclusive access for a unit of work that writes.
    pub fn exclusive(&self) -> AccessScope<'_> {
        self.lock.exclusive()
    }

    /// The guard itself, for callers that pick the mode dynamically.
    #[must_use]
    pub const fn lock(&self) -> &AccessLock {
        &self.lock
    }

    /// Borrow the connection. Reentrant on the calling thread.
    pub fn connection(&self) -> ConnectionGuard<'_> {
        self.connection.lock()
    }
}

// Modes echo the applied value back as a row, so they cannot go through a
// plain execute.
fn apply_mode(
    connection: &Connection,
    setting: &'static str,
    value: &str,
) -> Result<(), OpenStoreError> {
    connection
        .pragma_update_and_check(None, setting, value, |_| Ok(()))
        .map_err(|source| OpenStoreError::Setting { setting, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{JournalMode, LockingMode};
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    fn opens_file_store_in_new_directory() {
        let dir = TempDir::new().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");
        let config = StoreConfig {
            journal_mode: JournalMode::Delete,
            locking_mode: LockingMode::Normal,
            ..StoreConfig::at_path(root.join("nested/markers.db"))
        };

        let db = Database::open(&config).expect("open store");

        let mode: String = db
            .connection()
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .expect("read journal mode");
        assert_eq!(mode.to_ascii_lowercase(), "delete");
        assert!(root.join("nested/markers.db").is_file());
    }

    #[rstest]
    fn connection_is_reentrant_on_one_thread() {
        let db = Database::open_in_memory().expect("open store");
        let outer = db.connection();
        let inner = db.connection();
        let one: i64 = inner
            .query_row("SELECT 1", [], |row| row.get(0))
            .expect("query through nested guard");
        assert_eq!(one, 1);
        drop(inner);
        drop(outer);
    }

    #[rstest]
    fn database_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Database>();
    }
}
