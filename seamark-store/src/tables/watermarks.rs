//! Per-tile high-water marks.

use std::sync::Arc;

use geo::Rect;
use rusqlite::{OptionalExtension, params};
use seamark_core::{TileCoord, Watermark, WatermarkMap};

use super::tiles::{INTERSECTS_BBOX, coord_from_column};
use crate::database::Database;
use crate::error::StoreError;

const WATERMARKS: &str = "watermarks";

/// Watermark records keyed by tile id. A missing record reads as zero.
#[derive(Debug, Clone)]
pub struct WatermarkTable {
    db: Arc<Database>,
}

impl WatermarkTable {
    /// Wrap the relation on `db`.
    #[must_use]
    pub const fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// The record for `coord`, if one was ever written.
    pub fn get(&self, coord: TileCoord) -> Result<Option<Watermark>, StoreError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare_cached(
                "SELECT marker_last_update, review_last_update FROM watermarks WHERE tile_id = ?1",
            )
            .map_err(StoreError::sqlite(WATERMARKS, "prepare get"))?;
        stmt.query_row([coord.id()], |row| {
            Ok(Watermark::new(row.get(0)?, row.get(1)?))
        })
        .optional()
        .map_err(StoreError::sqlite(WATERMARKS, "get row"))
    }

    /// Insert or replace the record for `coord`.
    ///
    /// Values are stored as given; monotonic advancement is the caller's job.
    pub fn write(&self, coord: TileCoord, watermark: Watermark) -> Result<(), StoreError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare_cached(
                "INSERT OR REPLACE INTO watermarks \
                 (tile_id, marker_last_update, review_last_update) VALUES (?1, ?2, ?3)",
            )
            .map_err(StoreError::sqlite(WATERMARKS, "prepare write"))?;
        stmt.execute(params![
            coord.id(),
            watermark.marker_last_update,
            watermark.review_last_update
        ])
        .map(|_| ())
        .map_err(StoreError::sqlite(WATERMARKS, "write row"))
    }

    /// Remove the record for `coord`.
    pub fn delete(&self, coord: TileCoord) -> Result<(), StoreError> {
        self.db
            .connection()
            .execute("DELETE FROM watermarks WHERE tile_id = ?1", [coord.id()])
            .map(|_| ())
            .map_err(StoreError::sqlite(WATERMARKS, "delete row"))
    }

    /// One entry per tile overlapping `bbox`, zero-filled where unset.
    pub fn get_bbox(&self, bbox: &Rect<f64>) -> Result<WatermarkMap, StoreError> {
        let (min, max) = (bbox.min(), bbox.max());
        let sql = format!(
            "SELECT t.id, COALESCE(w.marker_last_update, 0), COALESCE(w.review_last_update, 0) \
             FROM tiles t LEFT JOIN watermarks w ON w.tile_id = t.id WHERE {INTERSECTS_BBOX}"
        );
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare_cached(&sql)
            .map_err(StoreError::sqlite(WATERMARKS, "prepare bbox query"))?;
        let rows = stmt
            .query_map(params![min.x, min.y, max.x, max.y], |row| {
                Ok((
                    coord_from_column(row, 0)?,
                    Watermark::new(row.get(1)?, row.get(2)?),
                ))
            })
            .map_err(StoreError::sqlite(WATERMARKS, "query bbox"))?;
        rows.collect::<Result<WatermarkMap, _>>()
            .map_err(StoreError::sqlite(WATERMARKS, "decode bbox rows"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::TileTable;
    use geo::Coord;
    use rstest::{fixture, rstest};
    use seamark_core::test_support::tile;

    struct Fixture {
        tiles: TileTable,
        watermarks: WatermarkTable,
    }

    #[fixture]
    fn store() -> Fixture {
        let db = Arc::new(Database::open_in_memory().expect("open store"));
        Fixture {
            tiles: TileTable::new(Arc::clone(&db)),
            watermarks: WatermarkTable::new(db),
        }
    }

    fn coord(x: u16, y: u16) -> TileCoord {
        TileCoord::new(x, y).expect("valid coord")
    }

    #[rstest]
    fn bbox_fills_unset_tiles_with_zero(store: Fixture) {
        store.tiles.insert(&tile(0, 0, 0, 100)).expect("tile a");
        store.tiles.insert(&tile(1, 0, 100, 200)).expect("tile b");
        store.tiles.insert(&tile(5, 5, 500, 600)).expect("far tile");
        store
            .watermarks
            .write(coord(1, 0), Watermark::new(40, 7))
            .expect("write watermark");

        let bbox = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.5, y: 0.5 });
        let map = store.watermarks.get_bbox(&bbox).expect("query bbox");

        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&coord(0, 0)), Some(&Watermark::default()));
        assert_eq!(map.get(&coord(1, 0)), Some(&Watermark::new(40, 7)));
    }

    /// One-degree tiles covering columns 3..=5 and rows 5..=7.
    fn seed_block_around_4_6(store: &Fixture) {
        let mut key = 0;
        for y in 5..=7 {
            for x in 3..=5 {
                store
                    .tiles
                    .insert(&tile(x, y, key, key + 100))
                    .expect("seed tile");
                key += 100;
            }
        }
    }

    #[rstest]
    fn bbox_aligned_to_one_tile_skips_its_neighbours(store: Fixture) {
        seed_block_around_4_6(&store);

        let bbox = Rect::new(Coord { x: 4.0, y: 6.0 }, Coord { x: 5.0, y: 7.0 });
        let map = store.watermarks.get_bbox(&bbox).expect("query bbox");

        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&coord(4, 6)), Some(&Watermark::default()));
    }

    #[rstest]
    fn bbox_spanning_two_by_two_tiles_returns_four(store: Fixture) {
        seed_block_around_4_6(&store);

        let bbox = Rect::new(Coord { x: 4.0, y: 6.0 }, Coord { x: 6.0, y: 8.0 });
        let coords: Vec<TileCoord> = store
            .watermarks
            .get_bbox(&bbox)
            .expect("query bbox")
            .into_keys()
            .collect();

        assert_eq!(
            coords,
            vec![coord(4, 6), coord(4, 7), coord(5, 6), coord(5, 7)]
        );
    }
}
