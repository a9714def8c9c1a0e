//! Read-side assembly of complete marker and review aggregates.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;
use seamark_core::{MarkerId, MarkerRecord, ReviewPhoto, ReviewRecord, SupportTables};

use crate::database::Database;
use crate::error::StoreError;
use crate::tables::{Page, Tables};

/// Reassembles what [`crate::UpdateAdapter`] wrote.
///
/// Callers hold a shared scope from [`Database::shared`] around each logical
/// read; the adapter itself never takes the guard.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use seamark_store::{Database, MergeAdapter};
///
/// let db = Arc::new(Database::open_in_memory().expect("open store"));
/// let merge = MergeAdapter::new(Arc::clone(&db));
/// let _scope = db.shared();
/// assert!(merge.get_marker(1).expect("read marker").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct MergeAdapter {
    tables: Tables,
}

impl MergeAdapter {
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

    /// The full aggregate for `id`.
    ///
    /// Returns `None` unless both the primary and meta rows exist. Optional
    /// satellites are `Some` exactly when their row exists, even if every
    /// field in it is empty.
    pub fn get_marker(&self, id: MarkerId) -> Result<Option<MarkerRecord>, StoreError> {
        let t = &self.tables;
        let Some(marker) = t.markers.get(id)? else {
            return Ok(None);
        };
        let Some(meta) = t.meta.get(id)? else {
            debug!("marker {id} has no meta row; treating as absent");
            return Ok(None);
        };

        let mut record = MarkerRecord::new(marker, meta);
        record.address = t.address.get(id)?;
        record.amenities = t.amenities.get(id)?;
        record.business = t.business.get(id)?;
        record.contact = t.contact.get(id)?;
        record.dockage = t.dockage.get(id)?;
        record.fuel = t.fuel.get(id)?;
        record.moorings = t.moorings.get(id)?;
        record.navigation = t.navigation.get(id)?;
        record.retail = t.retail.get(id)?;
        record.services = t.services.get(id)?;
        record.sponsorship = t.sponsorship.get(id)?;
        record.photos = t.photos.get(id)?;
        record.competitors = t.competitors.get(id)?;
        Ok(Some(record))
    }

    /// One page of marker ids in ascending order.
    ///
    /// Pages past the end, and pages of size zero, are empty.
    pub fn get_marker_ids(&self, page: u32, size: u32) -> Result<Vec<MarkerId>, StoreError> {
        self.tables.markers.ids(Page::Window { index: page, size })
    }

    /// Aggregates for one page of ids, skipping ids that are incomplete.
    pub fn get_markers(&self, page: u32, size: u32) -> Result<Vec<MarkerRecord>, StoreError> {
        let ids = self.get_marker_ids(page, size)?;
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = self.get_marker(id)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Reviews of `marker_id` with their photos attached.
    pub fn get_reviews(
        &self,
        marker_id: MarkerId,
        page: Page,
    ) -> Result<Vec<ReviewRecord>, StoreError> {
        let reviews = self.tables.reviews.for_marker(marker_id, page)?;
        let mut photos: BTreeMap<_, Vec<ReviewPhoto>> = BTreeMap::new();
        for (review_id, photo) in self.tables.review_photos.for_marker(marker_id)? {
            photos.entry(review_id).or_default().push(photo);
        }

        Ok(reviews
            .into_iter()
            .map(|review| {
                let attached = photos.remove(&review.id).unwrap_or_default();
                ReviewRecord {
                    review,
                    photos: attached,
                }
            })
            .collect())
    }

    /// Languages, templates and translations, or `None` when any is empty.
    pub fn get_support_table_data(&self) -> Result<Option<SupportTables>, StoreError> {
        let tables = SupportTables {
            languages: self.tables.languages.all()?,
            templates: self.tables.templates.all()?,
            translations: self.tables.translations.all()?,
        };
        if tables.is_complete() {
            Ok(Some(tables))
        } else {
            debug!(
                "support data incomplete: {} languages, {} templates, {} translations",
                tables.languages.len(),
                tables.templates.len(),
                tables.translations.len()
            );
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use seamark_core::test_support::{marker, review, review_photo};
    use seamark_core::{Language, MarkerMeta, Template};

    #[fixture]
    fn adapter() -> MergeAdapter {
        MergeAdapter::new(Arc::new(Database::open_in_memory().expect("open store")))
    }

    #[rstest]
    fn marker_without_meta_is_absent(adapter: MergeAdapter) {
        adapter
            .tables()
            .markers
            .write(&marker(1, 10, 1))
            .expect("write primary row");

        assert_eq!(adapter.get_marker(1).expect("read"), None);

        adapter
            .tables()
            .meta
            .write(
                1,
                &MarkerMeta {
                    title: "Harbour".into(),
                    note: None,
                },
            )
            .expect("write meta");
        let record = adapter.get_marker(1).expect("read").expect("complete");
        assert_eq!(record.meta.title, "Harbour");
        assert_eq!(record.address, None);
        assert!(record.photos.is_empty());
    }

    #[rstest]
    fn marker_pages_skip_ids_without_meta(adapter: MergeAdapter) {
        let t = adapter.tables();
        for id in 1..=4 {
            t.markers.write(&marker(id, 10, 1)).expect("write primary row");
            if id != 2 {
                let meta = MarkerMeta {
                    title: format!("Marker {id}"),
                    note: None,
                };
                t.meta.write(id, &meta).expect("write meta");
            }
        }
        let page = |index| -> Vec<MarkerId> {
            adapter
                .get_markers(index, 2)
                .expect("read page")
                .iter()
                .map(MarkerRecord::id)
                .collect()
        };

        assert_eq!(page(0), vec![1]);
        assert_eq!(page(1), vec![3, 4]);
        assert!(page(2).is_empty());
    }

    #[rstest]
    fn reviews_carry_only_their_own_photos(adapter: MergeAdapter) {
        let t = adapter.tables();
        t.reviews.write(&review(1, 5, 1).review).expect("review 1");
        t.reviews.write(&review(2, 5, 1).review).expect("review 2");
        t.review_photos.write(2, &[review_photo(20)]).expect("photo");

        let reviews = adapter.get_reviews(5, Page::All).expect("read reviews");

        assert_eq!(reviews.len(), 2);
        assert!(reviews[0].photos.is_empty());
        assert_eq!(reviews[1].photos, vec![review_photo(20)]);
    }

    #[rstest]
    fn support_data_requires_every_table(adapter: MergeAdapter) {
        let t = adapter.tables();
        t.languages
            .write(&Language {
                code: "en".into(),
                name: "English".into(),
            })
            .expect("language");
        t.templates
            .write(&Template {
                id: 1,
                language: "en".into(),
                name: "welcome".into(),
                body: "Welcome aboard".into(),
            })
            .expect("template");

        assert_eq!(adapter.get_support_table_data().expect("read"), None);
    }
}
