//! The tile index.

use std::sync::Arc;

use geo::{Coord, Rect};
use rusqlite::types::Type;
use rusqlite::{Error as SqliteError, OptionalExtension, Row, params};
use seamark_core::{KeyRange, Tile, TileCoord};

use crate::database::Database;
use crate::error::StoreError;

const TILES: &str = "tiles";
const TILE_COLUMNS: &str = "id, key_start, key_end, min_lon, min_lat, max_lon, max_lat";

/// Area overlap with the box bound as `?1..?4`, matching [`Tile::overlaps`].
pub(crate) const INTERSECTS_BBOX: &str = "\
    (CASE WHEN ?1 >= ?3 THEN min_lon <= ?1 AND max_lon >= ?1 \
     ELSE min_lon < ?3 AND max_lon > ?1 END) AND \
    (CASE WHEN ?2 >= ?4 THEN min_lat <= ?2 AND max_lat >= ?2 \
     ELSE min_lat < ?4 AND max_lat > ?2 END)";

/// Read-only view of the provisioned tile partition.
#[derive(Debug, Clone)]
pub struct TileTable {
    db: Arc<Database>,
}

impl TileTable {
    /// Wrap the relation on `db`.
    #[must_use]
    pub const fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// The tile at `coord`, if provisioned.
    pub fn get(&self, coord: TileCoord) -> Result<Option<Tile>, StoreError> {
        let sql = format!("SELECT {TILE_COLUMNS} FROM tiles WHERE id = ?1");
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare_cached(&sql)
            .map_err(StoreError::sqlite(TILES, "prepare get"))?;
        stmt.query_row([coord.id()], tile_from_row)
            .optional()
            .map_err(StoreError::sqlite(TILES, "get row"))
    }

    /// Tiles overlapping `bbox`, ordered by tile id.
    pub fn in_bbox(&self, bbox: &Rect<f64>) -> Result<Vec<Tile>, StoreError> {
        let (min, max) = (bbox.min(), bbox.max());
        let sql = format!("SELECT {TILE_COLUMNS} FROM tiles WHERE {INTERSECTS_BBOX} ORDER BY id");
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare_cached(&sql)
            .map_err(StoreError::sqlite(TILES, "prepare bbox query"))?;
        let rows = stmt
            .query_map(params![min.x, min.y, max.x, max.y], tile_from_row)
            .map_err(StoreError::sqlite(TILES, "query bbox"))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::sqlite(TILES, "decode bbox rows"))
    }

    /// Provision a tile, replacing any existing tile at the same position.
    ///
    /// The sync engine never calls this; it exists for seeding stores.
    pub fn insert(&self, tile: &Tile) -> Result<(), StoreError> {
        let (min, max) = (tile.bounds.min(), tile.bounds.max());
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare_cached(
                "INSERT OR REPLACE INTO tiles \
                 (id, x, y, key_start, key_end, min_lon, min_lat, max_lon, max_lat) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )
            .map_err(StoreError::sqlite(TILES, "prepare insert"))?;
        stmt.execute(params![
            tile.coord.id(),
            tile.coord.x(),
            tile.coord.y(),
            tile.keys.start(),
            tile.keys.end(),
            min.x,
            min.y,
            max.x,
            max.y,
        ])
        .map(|_| ())
        .map_err(StoreError::sqlite(TILES, "insert row"))
    }
}

/// Decode a tile id column, rejecting ids with no grid position.
pub(crate) fn coord_from_column(row: &Row<'_>, index: usize) -> rusqlite::Result<TileCoord> {
    TileCoord::from_id(row.get(index)?).map_err(|err| {
        SqliteError::FromSqlConversionFailure(index, Type::Integer, Box::new(err))
    })
}

fn tile_from_row(row: &Row<'_>) -> rusqlite::Result<Tile> {
    let keys = KeyRange::new(row.get(1)?, row.get(2)?)
        .map_err(|err| SqliteError::FromSqlConversionFailure(2, Type::Integer, Box::new(err)))?;
    Ok(Tile {
        coord: coord_from_column(row, 0)?,
        keys,
        bounds: Rect::new(
            Coord {
                x: row.get(3)?,
                y: row.get(4)?,
            },
            Coord {
                x: row.get(5)?,
                y: row.get(6)?,
            },
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use seamark_core::test_support::tile;

    #[fixture]
    fn table() -> TileTable {
        TileTable::new(Arc::new(Database::open_in_memory().expect("open store")))
    }

    #[rstest]
    fn provisioned_tile_is_found_by_coord(table: TileTable) {
        let seeded = tile(4, 6, 6000, 6999);
        table.insert(&seeded).expect("seed tile");

        let coord = TileCoord::new(4, 6).expect("valid coord");
        assert_eq!(table.get(coord).expect("read"), Some(seeded));
        let missing = TileCoord::new(5, 6).expect("valid coord");
        assert_eq!(table.get(missing).expect("read"), None);
    }

    fn seed_row(table: &TileTable) {
        for (x, start) in [(0, 0), (1, 100), (2, 200)] {
            table
                .insert(&tile(x, 0, start, start + 100))
                .expect("seed tile");
        }
    }

    fn xs_in(table: &TileTable, bbox: &Rect<f64>) -> Vec<u16> {
        table
            .in_bbox(bbox)
            .expect("query bbox")
            .iter()
            .map(|t| t.coord.x())
            .collect()
    }

    #[rstest]
    #[case((0.5, 0.5), (1.5, 0.8), vec![0, 1])]
    #[case((1.0, 0.0), (2.0, 1.0), vec![1])]
    #[case((0.0, 0.0), (3.0, 1.0), vec![0, 1, 2])]
    #[case((2.0, 0.5), (2.0, 0.5), vec![1, 2])]
    #[case((5.0, 5.0), (6.0, 6.0), vec![])]
    fn bbox_query_returns_overlapping_tiles(
        table: TileTable,
        #[case] from: (f64, f64),
        #[case] to: (f64, f64),
        #[case] expected: Vec<u16>,
    ) {
        seed_row(&table);
        let bbox = Rect::new(Coord { x: from.0, y: from.1 }, Coord { x: to.0, y: to.1 });
        assert_eq!(xs_in(&table, &bbox), expected);
    }

    #[rstest]
    fn out_of_range_tile_id_is_a_decode_error(table: TileTable) {
        table
            .db
            .connection()
            .execute(
                "INSERT INTO tiles \
                 (id, x, y, key_start, key_end, min_lon, min_lat, max_lon, max_lat) \
                 VALUES (?1, 0, 0, 0, 10, 0.0, 0.0, 1.0, 1.0)",
                [1_u32 << 20],
            )
            .expect("insert raw row");

        let bbox = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 });
        assert!(table.in_bbox(&bbox).is_err());
    }
}
