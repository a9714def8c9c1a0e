//! Errors raised by leaf tables and composite operations.

use std::fmt;

use rusqlite::Error as SqliteError;
use seamark_core::{MarkerId, ReviewId, TileCoord};
use thiserror::Error;

/// Failure of a single leaf-table operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite rejected a statement.
    #[error("failed to {operation} in {table}")]
    Sqlite {
        /// Table the statement targeted.
        table: &'static str,
        /// What the statement was doing.
        operation: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
}

impl StoreError {
    /// Adapter turning a `rusqlite` error into a labelled [`StoreError`].
    pub(crate) fn sqlite(
        table: &'static str,
        operation: &'static str,
    ) -> impl FnOnce(SqliteError) -> Self {
        move |source| Self::Sqlite {
            table,
            operation,
            source,
        }
    }
}

/// Errors that stop a composite operation before it touches any row.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// The tile is not part of the provisioned partition.
    #[error("tile {coord} is not in the tile index")]
    UnknownTile {
        /// Requested tile.
        coord: TileCoord,
    },
    /// Reading or writing bookkeeping rows failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Entity a composite step was working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A marker and its satellites.
    Marker(MarkerId),
    /// A review and its photos.
    Review(ReviewId),
    /// Every row inside a tile's key range.
    Tile(TileCoord),
    /// The language, template and translation tables.
    SupportData,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Marker(id) => write!(f, "marker {id}"),
            Self::Review(id) => write!(f, "review {id}"),
            Self::Tile(coord) => write!(f, "tile {coord}"),
            Self::SupportData => f.write_str("support data"),
        }
    }
}

/// A failed sub-step of a composite operation.
///
/// Earlier and later sub-steps may have committed; nothing is rolled back.
#[derive(Debug, Error)]
#[error("{step} failed for {target}")]
pub struct StepFailure {
    /// Entity being written or deleted.
    pub target: Target,
    /// Sub-step label.
    pub step: &'static str,
    /// Underlying leaf failure.
    #[source]
    pub source: StoreError,
}
