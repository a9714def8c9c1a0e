//! SQLite schema for markers, reviews, tiles and watermarks.
//!
//! No foreign keys are declared between satellites and their markers: the
//! store performs no cascades, and deletion order is enforced by the update
//! adapter instead.

use log::info;
use rusqlite::{Connection, Error as SqliteError, OptionalExtension, Transaction};
use thiserror::Error;

/// Version recorded in `seamark_schema_version`.
pub const SCHEMA_VERSION: i64 = 1;

/// Create every table and index, then record the schema version.
///
/// Existing installations must already match [`SCHEMA_VERSION`]; mismatches
/// are rejected so migrations can be applied explicitly.
///
/// # Examples
/// ```
/// use rusqlite::Connection;
/// use seamark_store::initialise_schema;
///
/// let mut conn = Connection::open_in_memory().expect("create in-memory database");
/// initialise_schema(&mut conn).expect("create schema");
/// initialise_schema(&mut conn).expect("schema creation is idempotent");
///
/// let version: i64 = conn
///     .query_row("SELECT version FROM seamark_schema_version", [], |row| row.get(0))
///     .expect("read schema version");
/// assert_eq!(version, 1);
/// ```
pub fn initialise_schema(connection: &mut Connection) -> Result<(), SchemaError> {
    let transaction = connection
        .transaction()
        .map_err(|source| SchemaError::Migration {
            step: "begin schema transaction",
            source,
        })?;

    create_marker_tables(&transaction)?;
    create_satellite_tables(&transaction)?;
    create_review_tables(&transaction)?;
    create_sync_tables(&transaction)?;
    create_support_tables(&transaction)?;
    ensure_schema_version(&transaction)?;

    transaction
        .commit()
        .map_err(|source| SchemaError::Migration {
            step: "commit schema transaction",
            source,
        })
}

fn create_marker_tables(transaction: &Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "create markers",
        "CREATE TABLE IF NOT EXISTS markers (
            id INTEGER PRIMARY KEY,
            kind INTEGER NOT NULL,
            lon REAL NOT NULL,
            lat REAL NOT NULL,
            spatial_key INTEGER NOT NULL,
            last_updated INTEGER NOT NULL,
            search_filter INTEGER NOT NULL,
            sponsorship_tier INTEGER NOT NULL DEFAULT -1
        )",
    )?;
    run_migration_step(
        transaction,
        "index markers",
        "CREATE INDEX IF NOT EXISTS idx_markers_spatial_key ON markers(spatial_key)",
    )?;
    run_migration_step(
        transaction,
        "create marker_positions",
        "CREATE TABLE IF NOT EXISTS marker_positions (
            id INTEGER PRIMARY KEY,
            lon REAL NOT NULL,
            lat REAL NOT NULL,
            spatial_key INTEGER NOT NULL
        )",
    )?;
    run_migration_step(
        transaction,
        "index marker_positions",
        "CREATE INDEX IF NOT EXISTS idx_marker_positions_lon_lat
            ON marker_positions(lon, lat)",
    )?;
    run_migration_step(
        transaction,
        "create marker_meta",
        "CREATE TABLE IF NOT EXISTS marker_meta (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            note TEXT
        )",
    )
}

fn create_satellite_tables(transaction: &Transaction<'_>) -> Result<(), SchemaError> {
    const SATELLITES: [(&str, &str); 11] = [
        (
            "create addresses",
            "CREATE TABLE IF NOT EXISTS addresses (
                id INTEGER PRIMARY KEY,
                street TEXT, city TEXT, region TEXT, postal_code TEXT, country TEXT
            )",
        ),
        (
            "create amenities",
            "CREATE TABLE IF NOT EXISTS amenities (
                id INTEGER PRIMARY KEY,
                restrooms INTEGER NOT NULL, showers INTEGER NOT NULL,
                laundry INTEGER NOT NULL, pump_out INTEGER NOT NULL,
                wifi INTEGER NOT NULL, pool INTEGER NOT NULL, notes TEXT
            )",
        ),
        (
            "create businesses",
            "CREATE TABLE IF NOT EXISTS businesses (
                id INTEGER PRIMARY KEY,
                hours TEXT, season TEXT, payment_methods TEXT, notes TEXT
            )",
        ),
        (
            "create contacts",
            "CREATE TABLE IF NOT EXISTS contacts (
                id INTEGER PRIMARY KEY,
                phone TEXT, vhf_channel TEXT, email TEXT, website TEXT
            )",
        ),
        (
            "create dockage",
            "CREATE TABLE IF NOT EXISTS dockage (
                id INTEGER PRIMARY KEY,
                transient_slips INTEGER, max_length REAL, min_depth REAL,
                rate_per_metre REAL, power TEXT, notes TEXT
            )",
        ),
        (
            "create fuel",
            "CREATE TABLE IF NOT EXISTS fuel (
                id INTEGER PRIMARY KEY,
                diesel INTEGER NOT NULL, gasoline INTEGER NOT NULL,
                diesel_price REAL, gasoline_price REAL, notes TEXT
            )",
        ),
        (
            "create moorings",
            "CREATE TABLE IF NOT EXISTS moorings (
                id INTEGER PRIMARY KEY,
                count INTEGER, rate REAL, notes TEXT
            )",
        ),
        (
            "create navigation",
            "CREATE TABLE IF NOT EXISTS navigation (
                id INTEGER PRIMARY KEY,
                approach_depth REAL, dock_depth REAL, tide_range REAL, notes TEXT
            )",
        ),
        (
            "create retail",
            "CREATE TABLE IF NOT EXISTS retail (
                id INTEGER PRIMARY KEY,
                provisions INTEGER NOT NULL, chandlery INTEGER NOT NULL,
                ice INTEGER NOT NULL, notes TEXT
            )",
        ),
        (
            "create services",
            "CREATE TABLE IF NOT EXISTS services (
                id INTEGER PRIMARY KEY,
                repairs INTEGER NOT NULL, haul_out INTEGER NOT NULL,
                storage INTEGER NOT NULL, notes TEXT
            )",
        ),
        (
            "create sponsorship_programs",
            "CREATE TABLE IF NOT EXISTS sponsorship_programs (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL, tier INTEGER NOT NULL,
                starts_at INTEGER NOT NULL, ends_at INTEGER NOT NULL
            )",
        ),
    ];
    for (step, sql) in SATELLITES {
        run_migration_step(transaction, step, sql)?;
    }

    run_migration_step(
        transaction,
        "create photos",
        "CREATE TABLE IF NOT EXISTS photos (
            marker_id INTEGER NOT NULL,
            photo_id INTEGER NOT NULL,
            position INTEGER NOT NULL,
            url TEXT NOT NULL,
            caption TEXT,
            PRIMARY KEY (marker_id, photo_id)
        ) WITHOUT ROWID",
    )?;
    run_migration_step(
        transaction,
        "create competitors",
        "CREATE TABLE IF NOT EXISTS competitors (
            subject_id INTEGER NOT NULL,
            competitor_id INTEGER NOT NULL,
            rank INTEGER NOT NULL,
            PRIMARY KEY (subject_id, competitor_id)
        ) WITHOUT ROWID",
    )
}

fn create_review_tables(transaction: &Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "create reviews",
        "CREATE TABLE IF NOT EXISTS reviews (
            id INTEGER PRIMARY KEY,
            marker_id INTEGER NOT NULL,
            rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
            title TEXT NOT NULL,
            date TEXT NOT NULL,
            author TEXT NOT NULL,
            body TEXT NOT NULL,
            votes INTEGER NOT NULL,
            response TEXT,
            last_updated INTEGER NOT NULL
        )",
    )?;
    run_migration_step(
        transaction,
        "index reviews",
        "CREATE INDEX IF NOT EXISTS idx_reviews_marker ON reviews(marker_id, id)",
    )?;
    run_migration_step(
        transaction,
        "create review_photos",
        "CREATE TABLE IF NOT EXISTS review_photos (
            review_id INTEGER NOT NULL,
            photo_id INTEGER NOT NULL,
            position INTEGER NOT NULL,
            url TEXT NOT NULL,
            caption TEXT,
            PRIMARY KEY (review_id, photo_id)
        ) WITHOUT ROWID",
    )
}

fn create_sync_tables(transaction: &Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "create tiles",
        "CREATE TABLE IF NOT EXISTS tiles (
            id INTEGER PRIMARY KEY,
            x INTEGER NOT NULL,
            y INTEGER NOT NULL,
            key_start INTEGER NOT NULL,
            key_end INTEGER NOT NULL CHECK (key_end > key_start),
            min_lon REAL NOT NULL,
            min_lat REAL NOT NULL,
            max_lon REAL NOT NULL,
            max_lat REAL NOT NULL,
            UNIQUE (x, y)
        )",
    )?;
    run_migration_step(
        transaction,
        "create watermarks",
        "CREATE TABLE IF NOT EXISTS watermarks (
            tile_id INTEGER PRIMARY KEY,
            marker_last_update INTEGER NOT NULL DEFAULT 0,
            review_last_update INTEGER NOT NULL DEFAULT 0
        )",
    )
}

fn create_support_tables(transaction: &Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "create languages",
        "CREATE TABLE IF NOT EXISTS languages (
            code TEXT PRIMARY KEY CHECK (length(trim(code)) > 0),
            name TEXT NOT NULL
        ) WITHOUT ROWID",
    )?;
    run_migration_step(
        transaction,
        "create templates",
        "CREATE TABLE IF NOT EXISTS templates (
            id INTEGER PRIMARY KEY,
            language TEXT NOT NULL,
            name TEXT NOT NULL,
            body TEXT NOT NULL
        )",
    )?;
    run_migration_step(
        transaction,
        "create translations",
        "CREATE TABLE IF NOT EXISTS translations (
            string_key TEXT NOT NULL,
            language TEXT NOT NULL,
            text TEXT NOT NULL,
            PRIMARY KEY (string_key, language)
        ) WITHOUT ROWID",
    )
}

fn ensure_schema_version(transaction: &Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "create schema version table",
        "CREATE TABLE IF NOT EXISTS seamark_schema_version (
            version INTEGER PRIMARY KEY CHECK (version > 0),
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        ) WITHOUT ROWID",
    )?;

    let existing_version: Option<i64> = transaction
        .query_row(
            "SELECT version FROM seamark_schema_version LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|source| SchemaError::Migration {
            step: "read schema version",
            source,
        })?;

    match existing_version {
        Some(version) if version == SCHEMA_VERSION => {}
        Some(found) => {
            return Err(SchemaError::VersionMismatch {
                expected: SCHEMA_VERSION,
                found,
            });
        }
        None => {
            transaction
                .execute(
                    "INSERT INTO seamark_schema_version (version) VALUES (?1)",
                    [SCHEMA_VERSION],
                )
                .map_err(|source| SchemaError::Migration {
                    step: "record schema version",
                    source,
                })?;
            info!("initialised store schema version {SCHEMA_VERSION}");
        }
    }

    Ok(())
}

fn run_migration_step(
    transaction: &Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), SchemaError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| SchemaError::Migration { step, source })
}

/// Errors raised when initialising the store schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A DDL statement failed.
    #[error("failed to execute migration step '{step}'")]
    Migration {
        /// Label of the failing step.
        step: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// The database was created by a different schema version.
    #[error(
        "expected store schema version {expected} but found {found}; apply migrations before retrying"
    )]
    VersionMismatch {
        /// Version this build understands.
        expected: i64,
        /// Version recorded in the database.
        found: i64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn connection() -> Connection {
        Connection::open_in_memory().expect("open in-memory database")
    }

    #[rstest]
    fn creates_every_table(mut connection: Connection) -> Result<(), SchemaError> {
        initialise_schema(&mut connection)?;

        let table_count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN (
                    'markers', 'marker_positions', 'marker_meta', 'addresses', 'amenities',
                    'businesses', 'contacts', 'dockage', 'fuel', 'moorings', 'navigation',
                    'retail', 'services', 'sponsorship_programs', 'photos', 'competitors',
                    'reviews', 'review_photos', 'tiles', 'watermarks', 'languages',
                    'templates', 'translations'
                )",
                [],
                |row| row.get(0),
            )
            .expect("query tables");
        assert_eq!(table_count, 23);
        Ok(())
    }

    #[rstest]
    fn rejects_foreign_schema_version(mut connection: Connection) {
        initialise_schema(&mut connection).expect("create schema");
        connection
            .execute("UPDATE seamark_schema_version SET version = 7", [])
            .expect("tamper with version");

        let err = initialise_schema(&mut connection).expect_err("mismatch should fail");
        assert!(matches!(
            err,
            SchemaError::VersionMismatch {
                expected: SCHEMA_VERSION,
                found: 7
            }
        ));
    }
}
