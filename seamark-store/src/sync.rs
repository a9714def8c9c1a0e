//! Caller-side session tying batches, the access guard and watermarks together.

use std::sync::Arc;

use geo::Rect;
use log::{debug, warn};
use seamark_core::{
    MarkerId, MarkerRecord, MarkerUpdate, ReviewRecord, ReviewUpdate, SupportTables, Tile,
    TileCoord, Watermark, WatermarkMap,
};

use crate::database::Database;
use crate::error::{StoreError, UpdateError};
use crate::merge::MergeAdapter;
use crate::tables::Page;
use crate::update::{ApplyReport, UpdateAdapter};

/// Applies parsed server batches for one tile at a time.
///
/// Every write runs under an exclusive scope and every read under a shared
/// one. A tile's watermark is advanced only after a batch applied without
/// any failed step, and never moves backwards.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use geo::{Coord, Rect};
/// use seamark_core::{KeyRange, Tile, TileCoord};
/// use seamark_store::{Database, TileSync};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let db = Arc::new(Database::open_in_memory()?);
/// let sync = TileSync::new(Arc::clone(&db));
/// let coord = TileCoord::new(4, 6)?;
/// sync.provision(&Tile {
///     coord,
///     keys: KeyRange::new(6000, 6999)?,
///     bounds: Rect::new(Coord { x: 4.0, y: 6.0 }, Coord { x: 5.0, y: 7.0 }),
/// })?;
///
/// assert_eq!(sync.watermark(coord)?.marker_last_update, 0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TileSync {
    db: Arc<Database>,
    merge: MergeAdapter,
    update: UpdateAdapter,
}

impl TileSync {
    /// Build a session over `db`.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            merge: MergeAdapter::new(Arc::clone(&db)),
            update: UpdateAdapter::new(Arc::clone(&db)),
            db,
        }
    }

    /// Seed a tile into the index.
    pub fn provision(&self, tile: &Tile) -> Result<(), StoreError> {
        let _scope = self.db.exclusive();
        self.update.tables().tiles.insert(tile)
    }

    /// Apply a marker batch received for `coord`.
    pub fn apply_markers(
        &self,
        coord: TileCoord,
        batch: &[MarkerUpdate],
    ) -> Result<ApplyReport, UpdateError> {
        let _scope = self.db.exclusive();
        self.ensure_tile(coord)?;
        let report = self.update.update_markers(batch);
        self.persist(coord, &report, Watermark::advance_markers)?;
        Ok(report)
    }

    /// Apply a review batch received for `coord`.
    pub fn apply_reviews(
        &self,
        coord: TileCoord,
        batch: &[ReviewUpdate],
    ) -> Result<ApplyReport, UpdateError> {
        let _scope = self.db.exclusive();
        self.ensure_tile(coord)?;
        let report = self.update.update_reviews(batch);
        self.persist(coord, &report, Watermark::advance_reviews)?;
        Ok(report)
    }

    /// Store a delivery of support data.
    #[must_use]
    pub fn apply_support_data(&self, data: &SupportTables) -> ApplyReport {
        let _scope = self.db.exclusive();
        self.update.update_support_tables(data)
    }

    /// Drop everything stored for `coord`.
    pub fn delete_tile(&self, coord: TileCoord) -> Result<ApplyReport, UpdateError> {
        let _scope = self.db.exclusive();
        self.update.delete_tile(coord)
    }

    /// Drop the reviews stored for `coord`.
    pub fn delete_tile_reviews(&self, coord: TileCoord) -> Result<ApplyReport, UpdateError> {
        let _scope = self.db.exclusive();
        self.update.delete_tile_reviews(coord)
    }

    /// Current watermark of `coord`, zero when never written.
    pub fn watermark(&self, coord: TileCoord) -> Result<Watermark, StoreError> {
        let _scope = self.db.shared();
        Ok(self
            .update
            .tables()
            .watermarks
            .get(coord)?
            .unwrap_or_default())
    }

    /// Watermarks of every tile touching `bbox`, for building a sync request.
    pub fn watermarks(&self, bbox: &Rect<f64>) -> Result<WatermarkMap, StoreError> {
        let _scope = self.db.shared();
        self.update.tables().watermarks.get_bbox(bbox)
    }

    /// The stored aggregate for `id`.
    pub fn marker(&self, id: MarkerId) -> Result<Option<MarkerRecord>, StoreError> {
        let _scope = self.db.shared();
        self.merge.get_marker(id)
    }

    /// Reviews stored for `marker_id`.
    pub fn reviews(&self, marker_id: MarkerId, page: Page) -> Result<Vec<ReviewRecord>, StoreError> {
        let _scope = self.db.shared();
        self.merge.get_reviews(marker_id, page)
    }

    /// Stored support data, when every table is populated.
    pub fn support_data(&self) -> Result<Option<SupportTables>, StoreError> {
        let _scope = self.db.shared();
        self.merge.get_support_table_data()
    }

    fn ensure_tile(&self, coord: TileCoord) -> Result<(), UpdateError> {
        if self.update.tables().tiles.get(coord)?.is_none() {
            return Err(UpdateError::UnknownTile { coord });
        }
        Ok(())
    }

    fn persist(
        &self,
        coord: TileCoord,
        report: &ApplyReport,
        advance: fn(Watermark, u64) -> Watermark,
    ) -> Result<(), StoreError> {
        if !report.is_success() {
            warn!(
                "tile {coord}: {} failed steps, watermark left unchanged",
                report.failures.len()
            );
            return Ok(());
        }
        let watermarks = &self.update.tables().watermarks;
        let current = watermarks.get(coord)?.unwrap_or_default();
        let next = advance(current, report.max_last_updated);
        if next != current {
            debug!("tile {coord}: watermark advanced to {next:?}");
            watermarks.write(coord, next)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use seamark_core::test_support::{marker_record, review, tile};

    fn coord() -> TileCoord {
        TileCoord::new(4, 6).expect("valid coord")
    }

    #[fixture]
    fn sync() -> TileSync {
        let sync = TileSync::new(Arc::new(Database::open_in_memory().expect("open store")));
        sync.provision(&tile(4, 6, 6000, 6999)).expect("seed tile");
        sync
    }

    #[rstest]
    fn watermark_never_moves_backwards(sync: TileSync) {
        sync.apply_markers(coord(), &[MarkerUpdate::upsert(marker_record(1, 6100, 50))])
            .expect("first batch");
        sync.apply_markers(coord(), &[MarkerUpdate::upsert(marker_record(2, 6200, 20))])
            .expect("older batch");

        assert_eq!(sync.watermark(coord()).expect("read"), Watermark::new(50, 0));
    }

    #[rstest]
    fn review_batches_advance_only_the_review_field(sync: TileSync) {
        sync.apply_reviews(coord(), &[ReviewUpdate::Upsert(review(1, 1, 30))])
            .expect("review batch");

        assert_eq!(sync.watermark(coord()).expect("read"), Watermark::new(0, 30));
    }

    #[rstest]
    fn unknown_tile_is_rejected_before_applying(sync: TileSync) {
        let elsewhere = TileCoord::new(0, 0).expect("valid coord");
        let result =
            sync.apply_markers(elsewhere, &[MarkerUpdate::upsert(marker_record(1, 10, 5))]);

        assert!(matches!(result, Err(UpdateError::UnknownTile { .. })));
        assert_eq!(sync.marker(1).expect("read"), None);
    }

    #[rstest]
    fn shared_reads_nest_inside_exclusive_scope(sync: TileSync) {
        let _outer = sync.db.exclusive();
        assert_eq!(sync.watermark(coord()).expect("nested read"), Watermark::default());
    }
}
