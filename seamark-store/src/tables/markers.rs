//! Primary marker rows and the derived position relation.

use std::sync::Arc;

use geo::{Coord, Rect};
use rusqlite::types::Type;
use rusqlite::{Error as SqliteError, OptionalExtension, Row, params};
use seamark_core::{KeyRange, Marker, MarkerId, MarkerType, SpatialKey};

use super::Page;
use crate::database::Database;
use crate::error::StoreError;

const MARKERS: &str = "markers";
const POSITIONS: &str = "marker_positions";
const NO_SPONSORSHIP: i64 = -1;

/// The primary relation every marker aggregate hangs off.
#[derive(Debug, Clone)]
pub struct MarkerTable {
    db: Arc<Database>,
}

impl MarkerTable {
    /// Wrap the relation on `db`.
    #[must_use]
    pub const fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// The primary row for `id`, if present.
    pub fn get(&self, id: MarkerId) -> Result<Option<Marker>, StoreError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare_cached(
                "SELECT id, kind, lon, lat, spatial_key, last_updated, search_filter, \
                 sponsorship_tier FROM markers WHERE id = ?1",
            )
            .map_err(StoreError::sqlite(MARKERS, "prepare get"))?;
        stmt.query_row([id], marker_from_row)
            .optional()
            .map_err(StoreError::sqlite(MARKERS, "get row"))
    }

    /// Insert or replace the primary row.
    pub fn write(&self, marker: &Marker) -> Result<(), StoreError> {
        let tier = marker.sponsorship_tier.map_or(NO_SPONSORSHIP, i64::from);
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare_cached(
                "INSERT OR REPLACE INTO markers \
                 (id, kind, lon, lat, spatial_key, last_updated, search_filter, sponsorship_tier) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .map_err(StoreError::sqlite(MARKERS, "prepare write"))?;
        stmt.execute(params![
            marker.id,
            marker.kind.bit(),
            marker.position.x,
            marker.position.y,
            marker.spatial_key,
            marker.last_updated,
            marker.search_filter,
            tier,
        ])
        .map(|_| ())
        .map_err(StoreError::sqlite(MARKERS, "write row"))
    }

    /// Remove the primary row.
    pub fn delete(&self, id: MarkerId) -> Result<(), StoreError> {
        self.db
            .connection()
            .execute("DELETE FROM markers WHERE id = ?1", [id])
            .map(|_| ())
            .map_err(StoreError::sqlite(MARKERS, "delete row"))
    }

    /// Remove every marker whose own key falls in `range`.
    pub fn delete_range(&self, range: KeyRange) -> Result<(), StoreError> {
        self.db
            .connection()
            .execute(
                "DELETE FROM markers WHERE spatial_key >= ?1 AND spatial_key < ?2",
                params![range.start(), range.end()],
            )
            .map(|_| ())
            .map_err(StoreError::sqlite(MARKERS, "delete range"))
    }

    /// Marker ids in ascending order.
    pub fn ids(&self, page: Page) -> Result<Vec<MarkerId>, StoreError> {
        let (limit, offset) = page.limit_offset();
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare_cached("SELECT id FROM markers ORDER BY id LIMIT ?1 OFFSET ?2")
            .map_err(StoreError::sqlite(MARKERS, "prepare ids"))?;
        let rows = stmt
            .query_map(params![limit, offset], |row| row.get(0))
            .map_err(StoreError::sqlite(MARKERS, "list ids"))?;
        rows.collect::<Result<Vec<MarkerId>, _>>()
            .map_err(StoreError::sqlite(MARKERS, "decode ids"))
    }
}

fn marker_from_row(row: &Row<'_>) -> rusqlite::Result<Marker> {
    let bits: u32 = row.get(1)?;
    let kind = MarkerType::from_bits(bits)
        .map_err(|err| SqliteError::FromSqlConversionFailure(1, Type::Integer, Box::new(err)))?;
    let tier: i64 = row.get(7)?;
    let sponsorship_tier = if tier == NO_SPONSORSHIP {
        None
    } else {
        Some(
            u32::try_from(tier)
                .map_err(|err| SqliteError::FromSqlConversionFailure(7, Type::Integer, Box::new(err)))?,
        )
    };

    Ok(Marker {
        id: row.get(0)?,
        kind,
        position: Coord {
            x: row.get(2)?,
            y: row.get(3)?,
        },
        spatial_key: row.get(4)?,
        last_updated: row.get(5)?,
        search_filter: row.get(6)?,
        sponsorship_tier,
    })
}

/// A marker's location as kept in the position relation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerPosition {
    /// Owning marker.
    pub id: MarkerId,
    /// Longitude and latitude.
    pub position: Coord<f64>,
    /// Key the marker is filed under.
    pub spatial_key: SpatialKey,
}

impl From<&Marker> for MarkerPosition {
    fn from(marker: &Marker) -> Self {
        Self {
            id: marker.id,
            position: marker.position,
            spatial_key: marker.spatial_key,
        }
    }
}

/// Positions derived from the primary rows, indexed for box queries.
#[derive(Debug, Clone)]
pub struct PositionTable {
    db: Arc<Database>,
}

impl PositionTable {
    /// Wrap the relation on `db`.
    #[must_use]
    pub const fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// The position of `id`, if recorded.
    pub fn get(&self, id: MarkerId) -> Result<Option<MarkerPosition>, StoreError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare_cached("SELECT id, lon, lat, spatial_key FROM marker_positions WHERE id = ?1")
            .map_err(StoreError::sqlite(POSITIONS, "prepare get"))?;
        stmt.query_row([id], position_from_row)
            .optional()
            .map_err(StoreError::sqlite(POSITIONS, "get row"))
    }

    /// Insert or replace the position derived from `marker`.
    pub fn write(&self, marker: &Marker) -> Result<(), StoreError> {
        let position = MarkerPosition::from(marker);
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare_cached(
                "INSERT OR REPLACE INTO marker_positions (id, lon, lat, spatial_key) \
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .map_err(StoreError::sqlite(POSITIONS, "prepare write"))?;
        stmt.execute(params![
            position.id,
            position.position.x,
            position.position.y,
            position.spatial_key,
        ])
        .map(|_| ())
        .map_err(StoreError::sqlite(POSITIONS, "write row"))
    }

    /// Remove the position of `id`.
    pub fn delete(&self, id: MarkerId) -> Result<(), StoreError> {
        self.db
            .connection()
            .execute("DELETE FROM marker_positions WHERE id = ?1", [id])
            .map(|_| ())
            .map_err(StoreError::sqlite(POSITIONS, "delete row"))
    }

    /// Remove every position whose key falls in `range`.
    pub fn delete_range(&self, range: KeyRange) -> Result<(), StoreError> {
        self.db
            .connection()
            .execute(
                "DELETE FROM marker_positions WHERE spatial_key >= ?1 AND spatial_key < ?2",
                params![range.start(), range.end()],
            )
            .map(|_| ())
            .map_err(StoreError::sqlite(POSITIONS, "delete range"))
    }

    /// Positions inside `bbox`, edges included, ordered by marker id.
    pub fn in_bbox(&self, bbox: &Rect<f64>) -> Result<Vec<MarkerPosition>, StoreError> {
        let (min, max) = (bbox.min(), bbox.max());
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare_cached(
                "SELECT id, lon, lat, spatial_key FROM marker_positions \
                 WHERE lon BETWEEN ?1 AND ?3 AND lat BETWEEN ?2 AND ?4 ORDER BY id",
            )
            .map_err(StoreError::sqlite(POSITIONS, "prepare bbox query"))?;
        let rows = stmt
            .query_map(params![min.x, min.y, max.x, max.y], position_from_row)
            .map_err(StoreError::sqlite(POSITIONS, "query bbox"))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::sqlite(POSITIONS, "decode bbox rows"))
    }
}

fn position_from_row(row: &Row<'_>) -> rusqlite::Result<MarkerPosition> {
    Ok(MarkerPosition {
        id: row.get(0)?,
        position: Coord {
            x: row.get(1)?,
            y: row.get(2)?,
        },
        spatial_key: row.get(3)?,
    })
}
