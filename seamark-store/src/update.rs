//! Applies inbound batches and whole-tile deletions.
//!
//! Every sub-step runs on its own and nothing is rolled back: a failed step
//! is recorded in the [`ApplyReport`] and the remaining steps still run.

use std::sync::Arc;

use log::{debug, info, warn};
use seamark_core::{
    KeyRange, MarkerId, MarkerRecord, MarkerUpdate, ReviewRecord, ReviewUpdate, SupportTables,
    TileCoord,
};

use crate::database::Database;
use crate::error::{StepFailure, StoreError, Target, UpdateError};
use crate::tables::Tables;

type MarkerStep = (&'static str, fn(&Tables, MarkerId) -> Result<(), StoreError>);
type RangeStep = (&'static str, fn(&Tables, KeyRange) -> Result<(), StoreError>);

/// Everything a marker owns, photos before their owners, primary row last.
const MARKER_DELETE_STEPS: [MarkerStep; 18] = [
    ("delete photos", |t, id| t.photos.delete(id)),
    ("delete review photos", |t, id| t.review_photos.delete_for_marker(id)),
    ("delete reviews", |t, id| t.reviews.delete_for_marker(id)),
    ("delete meta", |t, id| t.meta.delete(id)),
    ("delete address", |t, id| t.address.delete(id)),
    ("delete amenities", |t, id| t.amenities.delete(id)),
    ("delete business", |t, id| t.business.delete(id)),
    ("delete sponsorship", |t, id| t.sponsorship.delete(id)),
    ("delete competitors", |t, id| t.competitors.delete(id)),
    ("delete contact", |t, id| t.contact.delete(id)),
    ("delete dockage", |t, id| t.dockage.delete(id)),
    ("delete fuel", |t, id| t.fuel.delete(id)),
    ("delete moorings", |t, id| t.moorings.delete(id)),
    ("delete navigation", |t, id| t.navigation.delete(id)),
    ("delete position", |t, id| t.positions.delete(id)),
    ("delete retail", |t, id| t.retail.delete(id)),
    ("delete services", |t, id| t.services.delete(id)),
    ("delete marker", |t, id| t.markers.delete(id)),
];

/// Range deletes resolve owners through `markers`, so it must come last.
const TILE_DELETE_STEPS: [RangeStep; 18] = [
    ("delete meta", |t, r| t.meta.delete_range(r)),
    ("delete address", |t, r| t.address.delete_range(r)),
    ("delete amenities", |t, r| t.amenities.delete_range(r)),
    ("delete business", |t, r| t.business.delete_range(r)),
    ("delete photos", |t, r| t.photos.delete_range(r)),
    ("delete sponsorship", |t, r| t.sponsorship.delete_range(r)),
    ("delete competitors", |t, r| t.competitors.delete_range(r)),
    ("delete contact", |t, r| t.contact.delete_range(r)),
    ("delete dockage", |t, r| t.dockage.delete_range(r)),
    ("delete fuel", |t, r| t.fuel.delete_range(r)),
    ("delete moorings", |t, r| t.moorings.delete_range(r)),
    ("delete navigation", |t, r| t.navigation.delete_range(r)),
    ("delete position", |t, r| t.positions.delete_range(r)),
    ("delete retail", |t, r| t.retail.delete_range(r)),
    ("delete review photos", |t, r| t.review_photos.delete_range(r)),
    ("delete reviews", |t, r| t.reviews.delete_range(r)),
    ("delete services", |t, r| t.services.delete_range(r)),
    ("delete markers", |t, r| t.markers.delete_range(r)),
];

/// Outcome of a composite operation.
#[derive(Debug, Default)]
pub struct ApplyReport {
    /// Largest `last_updated` seen in the batch, whatever each row's outcome.
    pub max_last_updated: u64,
    /// Sub-steps that failed, in execution order.
    pub failures: Vec<StepFailure>,
}

impl ApplyReport {
    /// Whether every sub-step succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn observe(&mut self, last_updated: u64) {
        self.max_last_updated = self.max_last_updated.max(last_updated);
    }

    fn record(&mut self, target: Target, step: &'static str, result: Result<(), StoreError>) {
        if let Err(source) = result {
            warn!("{step} failed for {target}: {source}");
            self.failures.push(StepFailure {
                target,
                step,
                source,
            });
        }
    }
}

/// Write side of the store.
///
/// Callers hold an exclusive scope from [`Database::exclusive`] around each
/// batch and persist [`ApplyReport::max_last_updated`] only when
/// [`ApplyReport::is_success`] holds.
#[derive(Debug, Clone)]
pub struct UpdateAdapter {
    tables: Tables,
}

impl UpdateAdapter {
    /// Build an adapter over `db`.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            tables: Tables::new(&db),
        }
    }

    /// Leaf tables used by the adapter.
    #[must_use]
    pub const fn tables(&self) -> &Tables {
        &self.tables
    }

    /// Apply an ordered marker batch.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use seamark_core::MarkerUpdate;
    /// use seamark_store::{Database, UpdateAdapter};
    ///
    /// let db = Arc::new(Database::open_in_memory().expect("open store"));
    /// let update = UpdateAdapter::new(Arc::clone(&db));
    /// let _scope = db.exclusive();
    /// let report = update.update_markers(&[MarkerUpdate::tombstone(42)]);
    /// assert!(report.is_success());
    /// ```
    #[must_use]
    pub fn update_markers(&self, batch: &[MarkerUpdate]) -> ApplyReport {
        let mut report = ApplyReport::default();
        for update in batch {
            report.observe(update.last_updated());
            match update {
                MarkerUpdate::Upsert(record) => self.upsert_marker(record, &mut report),
                MarkerUpdate::Tombstone { id, .. } => self.remove_marker(*id, &mut report),
            }
        }
        debug!(
            "applied {} marker updates, {} failed steps, max last_updated {}",
            batch.len(),
            report.failures.len(),
            report.max_last_updated
        );
        report
    }

    fn upsert_marker(&self, record: &MarkerRecord, report: &mut ApplyReport) {
        let t = &self.tables;
        let id = record.id();
        let target = Target::Marker(id);

        report.record(target, "write marker", t.markers.write(&record.marker));
        report.record(target, "write position", t.positions.write(&record.marker));
        report.record(target, "write meta", t.meta.write(id, &record.meta));

        // Omitted singular satellites keep whatever is stored.
        if let Some(row) = &record.address {
            report.record(target, "write address", t.address.write(id, row));
        }
        if let Some(row) = &record.amenities {
            report.record(target, "write amenities", t.amenities.write(id, row));
        }
        if let Some(row) = &record.business {
            report.record(target, "write business", t.business.write(id, row));
        }
        if let Some(row) = &record.contact {
            report.record(target, "write contact", t.contact.write(id, row));
        }
        if let Some(row) = &record.dockage {
            report.record(target, "write dockage", t.dockage.write(id, row));
        }
        if let Some(row) = &record.fuel {
            report.record(target, "write fuel", t.fuel.write(id, row));
        }
        if let Some(row) = &record.moorings {
            report.record(target, "write moorings", t.moorings.write(id, row));
        }
        if let Some(row) = &record.navigation {
            report.record(target, "write navigation", t.navigation.write(id, row));
        }
        if let Some(row) = &record.retail {
            report.record(target, "write retail", t.retail.write(id, row));
        }
        if let Some(row) = &record.services {
            report.record(target, "write services", t.services.write(id, row));
        }

        // Sponsorship is the one singular satellite cleared when omitted.
        match &record.sponsorship {
            Some(row) => report.record(target, "write sponsorship", t.sponsorship.write(id, row)),
            None => report.record(target, "clear sponsorship", t.sponsorship.delete(id)),
        }

        report.record(target, "delete photos", t.photos.delete(id));
        report.record(target, "write photos", t.photos.write(id, &record.photos));
        report.record(target, "delete competitors", t.competitors.delete(id));
        report.record(
            target,
            "write competitors",
            t.competitors.write(id, &record.competitors),
        );
    }

    fn remove_marker(&self, id: MarkerId, report: &mut ApplyReport) {
        for (step, delete) in MARKER_DELETE_STEPS {
            report.record(Target::Marker(id), step, delete(&self.tables, id));
        }
    }

    /// Apply an ordered review batch.
    #[must_use]
    pub fn update_reviews(&self, batch: &[ReviewUpdate]) -> ApplyReport {
        let mut report = ApplyReport::default();
        for update in batch {
            report.observe(update.last_updated());
            match update {
                ReviewUpdate::Upsert(record) => self.upsert_review(record, &mut report),
                ReviewUpdate::Tombstone { id, .. } => {
                    let target = Target::Review(*id);
                    let t = &self.tables;
                    report.record(target, "delete review photos", t.review_photos.delete(*id));
                    report.record(target, "delete review", t.reviews.delete(*id));
                }
            }
        }
        debug!(
            "applied {} review updates, {} failed steps, max last_updated {}",
            batch.len(),
            report.failures.len(),
            report.max_last_updated
        );
        report
    }

    fn upsert_review(&self, record: &ReviewRecord, report: &mut ApplyReport) {
        let t = &self.tables;
        let id = record.id();
        let target = Target::Review(id);
        report.record(target, "write review", t.reviews.write(&record.review));
        report.record(target, "delete review photos", t.review_photos.delete(id));
        report.record(
            target,
            "write review photos",
            t.review_photos.write(id, &record.photos),
        );
    }

    /// Upsert every language, template and translation row.
    #[must_use]
    pub fn update_support_tables(&self, data: &SupportTables) -> ApplyReport {
        let t = &self.tables;
        let mut report = ApplyReport::default();
        for language in &data.languages {
            report.record(Target::SupportData, "write language", t.languages.write(language));
        }
        for template in &data.templates {
            report.record(Target::SupportData, "write template", t.templates.write(template));
        }
        for translation in &data.translations {
            report.record(
                Target::SupportData,
                "write translation",
                t.translations.write(translation),
            );
        }
        report
    }

    /// Remove every row in the tile's key range, then its watermark.
    ///
    /// Fails before deleting anything when the tile is not provisioned.
    pub fn delete_tile(&self, coord: TileCoord) -> Result<ApplyReport, UpdateError> {
        let range = self.resolve(coord)?;
        info!("deleting tile {coord} covering keys {range}");

        let target = Target::Tile(coord);
        let mut report = ApplyReport::default();
        for (step, delete) in TILE_DELETE_STEPS {
            report.record(target, step, delete(&self.tables, range));
        }
        report.record(target, "delete watermark", self.tables.watermarks.delete(coord));
        Ok(report)
    }

    /// Remove reviews in the tile's key range and zero its review watermark.
    pub fn delete_tile_reviews(&self, coord: TileCoord) -> Result<ApplyReport, UpdateError> {
        let range = self.resolve(coord)?;
        info!("deleting reviews of tile {coord} covering keys {range}");

        let t = &self.tables;
        let target = Target::Tile(coord);
        let mut report = ApplyReport::default();
        report.record(target, "delete review photos", t.review_photos.delete_range(range));
        report.record(target, "delete reviews", t.reviews.delete_range(range));
        report.record(target, "clear review watermark", self.clear_review_watermark(coord));
        Ok(report)
    }

    /// A missing record is left missing, which already reads as zero.
    fn clear_review_watermark(&self, coord: TileCoord) -> Result<(), StoreError> {
        let watermarks = &self.tables.watermarks;
        watermarks.get(coord)?.map_or(Ok(()), |current| {
            watermarks.write(coord, current.without_reviews())
        })
    }

    fn resolve(&self, coord: TileCoord) -> Result<KeyRange, UpdateError> {
        self.tables
            .tiles
            .get(coord)?
            .map(|tile| tile.keys)
            .ok_or(UpdateError::UnknownTile { coord })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use seamark_core::test_support::{marker_record, photo, review, review_photo, tile};
    use seamark_core::{Address, Fuel, SponsorshipProgram, Watermark};

    #[fixture]
    fn update() -> UpdateAdapter {
        UpdateAdapter::new(Arc::new(Database::open_in_memory().expect("open store")))
    }

    fn coord(x: u16, y: u16) -> TileCoord {
        TileCoord::new(x, y).expect("valid coord")
    }

    fn applied(report: ApplyReport) {
        assert!(report.is_success(), "failed steps: {:?}", report.failures);
    }

    fn full_record(id: MarkerId, key: u64, ts: u64) -> MarkerRecord {
        let mut record = marker_record(id, key, ts);
        record.address = Some(Address {
            city: Some("Beaufort".into()),
            ..Address::default()
        });
        record.fuel = Some(Fuel {
            diesel: true,
            ..Fuel::default()
        });
        record.sponsorship = Some(SponsorshipProgram {
            name: "Harbour Partners".into(),
            tier: 1,
            starts_at: 0,
            ends_at: 100,
        });
        record.photos = vec![photo(1), photo(2)];
        record.competitors = vec![8, 9];
        record
    }

    #[rstest]
    fn max_last_updated_spans_the_whole_batch(update: UpdateAdapter) {
        let batch: Vec<MarkerUpdate> = [5, 3, 9, 1]
            .into_iter()
            .enumerate()
            .map(|(i, ts)| MarkerUpdate::upsert(marker_record(i as u64 + 1, 10, ts)))
            .collect();

        let report = update.update_markers(&batch);

        assert!(report.is_success());
        assert_eq!(report.max_last_updated, 9);
    }

    #[rstest]
    fn tombstone_timestamp_counts_towards_max(update: UpdateAdapter) {
        let batch = [
            MarkerUpdate::upsert(marker_record(1, 10, 4)),
            MarkerUpdate::Tombstone {
                id: 2,
                last_updated: 12,
            },
        ];
        assert_eq!(update.update_markers(&batch).max_last_updated, 12);
    }

    #[rstest]
    fn tombstone_is_idempotent(update: UpdateAdapter) {
        let t = update.tables().clone();
        applied(update.update_markers(&[MarkerUpdate::upsert(full_record(1, 10, 1))]));

        let first = update.update_markers(&[MarkerUpdate::tombstone(1)]);
        let second = update.update_markers(&[MarkerUpdate::tombstone(1)]);

        assert!(first.is_success() && second.is_success());
        assert_eq!(t.markers.get(1).expect("read marker"), None);
        assert_eq!(t.address.get(1).expect("read address"), None);
        assert!(t.photos.get(1).expect("read photos").is_empty());
        assert!(t.competitors.get(1).expect("read edges").is_empty());
    }

    #[rstest]
    fn upsert_replaces_multi_row_satellites(update: UpdateAdapter) {
        let t = update.tables().clone();
        applied(update.update_markers(&[MarkerUpdate::upsert(full_record(1, 10, 1))]));

        let mut second = marker_record(1, 10, 2);
        second.photos = vec![photo(3)];
        applied(update.update_markers(&[MarkerUpdate::upsert(second)]));

        assert_eq!(t.photos.get(1).expect("read photos"), vec![photo(3)]);
        assert!(t.competitors.get(1).expect("read edges").is_empty());
    }

    #[rstest]
    fn upsert_without_photos_clears_stored_photos(update: UpdateAdapter) {
        let t = update.tables().clone();
        applied(update.update_markers(&[MarkerUpdate::upsert(full_record(1, 10, 1))]));
        assert_eq!(t.photos.get(1).expect("read photos").len(), 2);

        let report = update.update_markers(&[MarkerUpdate::upsert(marker_record(1, 10, 2))]);

        assert!(report.is_success());
        assert!(t.photos.get(1).expect("read photos").is_empty());
    }

    #[rstest]
    fn omitted_satellites_are_kept_except_sponsorship(update: UpdateAdapter) {
        let t = update.tables().clone();
        applied(update.update_markers(&[MarkerUpdate::upsert(full_record(1, 10, 1))]));

        applied(update.update_markers(&[MarkerUpdate::upsert(marker_record(1, 10, 2))]));

        assert!(t.address.get(1).expect("read address").is_some());
        assert!(t.fuel.get(1).expect("read fuel").is_some());
        assert_eq!(t.sponsorship.get(1).expect("read sponsorship"), None);
    }

    #[rstest]
    fn review_upsert_rewrites_photos(update: UpdateAdapter) {
        let t = update.tables().clone();
        let mut first = review(1, 7, 3);
        first.photos = vec![review_photo(1), review_photo(2)];
        let mut second = review(1, 7, 4);
        second.photos = vec![review_photo(3)];

        let report = update.update_reviews(&[
            ReviewUpdate::Upsert(first),
            ReviewUpdate::Upsert(second),
        ]);

        assert!(report.is_success());
        assert_eq!(report.max_last_updated, 4);
        assert_eq!(
            t.review_photos.for_review(1).expect("read photos"),
            vec![review_photo(3)]
        );
    }

    #[rstest]
    fn unknown_tile_fails_before_deleting(update: UpdateAdapter) {
        let t = update.tables().clone();
        applied(update.update_markers(&[MarkerUpdate::upsert(marker_record(1, 6500, 1))]));

        let result = update.delete_tile(coord(4, 6));

        assert!(matches!(result, Err(UpdateError::UnknownTile { .. })));
        assert!(t.markers.get(1).expect("read marker").is_some());
    }

    #[rstest]
    fn tile_delete_removes_range_and_watermark(update: UpdateAdapter) {
        let t = update.tables().clone();
        t.tiles.insert(&tile(4, 6, 6000, 6999)).expect("seed tile");
        t.watermarks
            .write(coord(4, 6), Watermark::new(1000, 500))
            .expect("seed watermark");
        applied(update.update_markers(&[
            MarkerUpdate::upsert(full_record(1, 6500, 1)),
            MarkerUpdate::upsert(full_record(2, 7500, 1)),
        ]));
        applied(update.update_reviews(&[ReviewUpdate::Upsert(review(10, 1, 1))]));

        let report = update.delete_tile(coord(4, 6)).expect("known tile");

        assert!(report.is_success());
        assert_eq!(t.markers.get(1).expect("read"), None);
        assert_eq!(t.address.get(1).expect("read"), None);
        assert_eq!(t.reviews.get(10).expect("read"), None);
        assert!(t.markers.get(2).expect("read").is_some());
        assert!(t.address.get(2).expect("read").is_some());
        assert_eq!(t.watermarks.get(coord(4, 6)).expect("read"), None);
    }

    fn count_rows(db: &Database, table: &str) -> i64 {
        db.connection()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })
            .expect("count rows")
    }

    #[rstest]
    fn tile_delete_clears_every_table_owned_by_the_range() {
        let db = Arc::new(Database::open_in_memory().expect("open store"));
        let update = UpdateAdapter::new(Arc::clone(&db));
        let t = update.tables().clone();
        t.tiles.insert(&tile(4, 6, 6000, 6999)).expect("seed tile");
        applied(update.update_markers(&[MarkerUpdate::upsert(full_record(1, 6500, 1))]));
        let mut pictured = review(10, 1, 1);
        pictured.photos = vec![review_photo(100), review_photo(101)];
        applied(update.update_reviews(&[
            ReviewUpdate::Upsert(pictured),
            ReviewUpdate::Upsert(review(11, 1, 2)),
        ]));
        assert_eq!(count_rows(&db, "review_photos"), 2);
        assert_eq!(count_rows(&db, "reviews"), 2);
        assert_eq!(count_rows(&db, "photos"), 2);
        assert_eq!(count_rows(&db, "competitors"), 2);

        let report = update.delete_tile(coord(4, 6)).expect("known tile");

        assert!(report.is_success(), "failed steps: {:?}", report.failures);
        for table in [
            "markers",
            "marker_positions",
            "marker_meta",
            "addresses",
            "fuel",
            "sponsorship_programs",
            "photos",
            "competitors",
            "reviews",
            "review_photos",
        ] {
            assert_eq!(count_rows(&db, table), 0, "{table} still holds rows");
        }
    }

    #[rstest]
    fn tile_review_delete_keeps_markers(update: UpdateAdapter) {
        let t = update.tables().clone();
        t.tiles.insert(&tile(4, 6, 6000, 6999)).expect("seed tile");
        t.watermarks
            .write(coord(4, 6), Watermark::new(1000, 500))
            .expect("seed watermark");
        applied(update.update_markers(&[MarkerUpdate::upsert(marker_record(1, 6500, 1))]));
        applied(update.update_reviews(&[ReviewUpdate::Upsert(review(10, 1, 1))]));

        let report = update.delete_tile_reviews(coord(4, 6)).expect("known tile");

        assert!(report.is_success());
        assert!(t.markers.get(1).expect("read").is_some());
        assert_eq!(t.reviews.get(10).expect("read"), None);
        assert_eq!(
            t.watermarks.get(coord(4, 6)).expect("read"),
            Some(Watermark::new(1000, 0))
        );
    }

    #[rstest]
    fn tile_review_delete_leaves_missing_watermark_missing(update: UpdateAdapter) {
        let t = update.tables().clone();
        t.tiles.insert(&tile(4, 6, 6000, 6999)).expect("seed tile");

        let report = update.delete_tile_reviews(coord(4, 6)).expect("known tile");

        assert!(report.is_success());
        assert_eq!(t.watermarks.get(coord(4, 6)).expect("read"), None);
    }

    #[rstest]
    fn failed_steps_are_reported_without_stopping() {
        let db = Arc::new(Database::open_in_memory().expect("open store"));
        let update = UpdateAdapter::new(Arc::clone(&db));
        db.connection()
            .execute("DROP TABLE competitors", [])
            .expect("drop table");

        let report = update.update_markers(&[
            MarkerUpdate::upsert(full_record(1, 10, 3)),
            MarkerUpdate::upsert(marker_record(2, 11, 4)),
        ]);

        assert!(!report.is_success());
        assert_eq!(report.max_last_updated, 4);
        assert!(report.failures.iter().all(|f| f.step.contains("competitors")));
        assert!(update.tables().markers.get(2).expect("read").is_some());
    }
}
