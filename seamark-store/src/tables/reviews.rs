//! Reviews and review photos.

use std::sync::Arc;

use rusqlite::types::Type;
use rusqlite::{Error as SqliteError, OptionalExtension, Row, params};
use seamark_core::{KeyRange, MarkerId, Rating, Review, ReviewId, ReviewPhoto};

use super::{OWNED_BY_RANGE, Page};
use crate::database::Database;
use crate::error::StoreError;

const REVIEWS: &str = "reviews";
const REVIEW_PHOTOS: &str = "review_photos";
const REVIEW_COLUMNS: &str =
    "id, marker_id, rating, title, date, author, body, votes, response, last_updated";

/// Reviews, keyed by review id and grouped by marker.
#[derive(Debug, Clone)]
pub struct ReviewTable {
    db: Arc<Database>,
}

impl ReviewTable {
    /// Wrap the relation on `db`.
    #[must_use]
    pub const fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// The review with `id`, if present.
    pub fn get(&self, id: ReviewId) -> Result<Option<Review>, StoreError> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = ?1");
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare_cached(&sql)
            .map_err(StoreError::sqlite(REVIEWS, "prepare get"))?;
        stmt.query_row([id], review_from_row)
            .optional()
            .map_err(StoreError::sqlite(REVIEWS, "get row"))
    }

    /// Reviews of `marker_id` in ascending id order.
    pub fn for_marker(&self, marker_id: MarkerId, page: Page) -> Result<Vec<Review>, StoreError> {
        let (limit, offset) = page.limit_offset();
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE marker_id = ?1 \
             ORDER BY id LIMIT ?2 OFFSET ?3"
        );
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare_cached(&sql)
            .map_err(StoreError::sqlite(REVIEWS, "prepare marker query"))?;
        let rows = stmt
            .query_map(params![marker_id, limit, offset], review_from_row)
            .map_err(StoreError::sqlite(REVIEWS, "query marker reviews"))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::sqlite(REVIEWS, "decode reviews"))
    }

    /// Insert or replace a review.
    pub fn write(&self, review: &Review) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT OR REPLACE INTO reviews ({REVIEW_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
        );
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare_cached(&sql)
            .map_err(StoreError::sqlite(REVIEWS, "prepare write"))?;
        stmt.execute(params![
            review.id,
            review.marker_id,
            review.rating.get(),
            review.title,
            review.date,
            review.author,
            review.body,
            review.votes,
            review.response,
            review.last_updated,
        ])
        .map(|_| ())
        .map_err(StoreError::sqlite(REVIEWS, "write row"))
    }

    /// Remove the review with `id`.
    pub fn delete(&self, id: ReviewId) -> Result<(), StoreError> {
        self.db
            .connection()
            .execute("DELETE FROM reviews WHERE id = ?1", [id])
            .map(|_| ())
            .map_err(StoreError::sqlite(REVIEWS, "delete row"))
    }

    /// Remove every review of `marker_id`.
    pub fn delete_for_marker(&self, marker_id: MarkerId) -> Result<(), StoreError> {
        self.db
            .connection()
            .execute("DELETE FROM reviews WHERE marker_id = ?1", [marker_id])
            .map(|_| ())
            .map_err(StoreError::sqlite(REVIEWS, "delete marker reviews"))
    }

    /// Remove reviews of every marker whose key falls in `range`.
    pub fn delete_range(&self, range: KeyRange) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM reviews WHERE marker_id IN ({OWNED_BY_RANGE})");
        self.db
            .connection()
            .execute(&sql, params![range.start(), range.end()])
            .map(|_| ())
            .map_err(StoreError::sqlite(REVIEWS, "delete range"))
    }
}

fn review_from_row(row: &Row<'_>) -> rusqlite::Result<Review> {
    let stars: u8 = row.get(2)?;
    let rating = Rating::new(stars)
        .map_err(|err| SqliteError::FromSqlConversionFailure(2, Type::Integer, Box::new(err)))?;
    Ok(Review {
        id: row.get(0)?,
        marker_id: row.get(1)?,
        rating,
        title: row.get(3)?,
        date: row.get(4)?,
        author: row.get(5)?,
        body: row.get(6)?,
        votes: row.get(7)?,
        response: row.get(8)?,
        last_updated: row.get(9)?,
    })
}

/// Photos attached to reviews.
///
/// Ownership runs review to marker, so range and marker deletes resolve
/// through the review relation and must run before reviews are removed.
#[derive(Debug, Clone)]
pub struct ReviewPhotoTable {
    db: Arc<Database>,
}

impl ReviewPhotoTable {
    /// Wrap the relation on `db`.
    #[must_use]
    pub const fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Photos of `review_id` in stored order.
    pub fn for_review(&self, review_id: ReviewId) -> Result<Vec<ReviewPhoto>, StoreError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare_cached(
                "SELECT photo_id, url, caption FROM review_photos \
                 WHERE review_id = ?1 ORDER BY position",
            )
            .map_err(StoreError::sqlite(REVIEW_PHOTOS, "prepare get"))?;
        let rows = stmt
            .query_map([review_id], |row| review_photo_from_row(row, 0))
            .map_err(StoreError::sqlite(REVIEW_PHOTOS, "query photos"))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::sqlite(REVIEW_PHOTOS, "decode photos"))
    }

    /// Photos of every review of `marker_id`, tagged with their review id.
    pub fn for_marker(
        &self,
        marker_id: MarkerId,
    ) -> Result<Vec<(ReviewId, ReviewPhoto)>, StoreError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare_cached(
                "SELECT p.review_id, p.photo_id, p.url, p.caption FROM review_photos p \
                 JOIN reviews r ON r.id = p.review_id \
                 WHERE r.marker_id = ?1 ORDER BY p.review_id, p.position",
            )
            .map_err(StoreError::sqlite(REVIEW_PHOTOS, "prepare marker query"))?;
        let rows = stmt
            .query_map([marker_id], |row| {
                Ok((row.get(0)?, review_photo_from_row(row, 1)?))
            })
            .map_err(StoreError::sqlite(REVIEW_PHOTOS, "query marker photos"))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::sqlite(REVIEW_PHOTOS, "decode marker photos"))
    }

    /// Add `photos` to `review_id`, replacing rows with the same photo id.
    pub fn write(&self, review_id: ReviewId, photos: &[ReviewPhoto]) -> Result<(), StoreError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare_cached(
                "INSERT OR REPLACE INTO review_photos \
                 (review_id, photo_id, position, url, caption) VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .map_err(StoreError::sqlite(REVIEW_PHOTOS, "prepare write"))?;
        for (position, photo) in photos.iter().enumerate() {
            stmt.execute(params![
                review_id,
                photo.id,
                position,
                photo.url,
                photo.caption
            ])
            .map_err(StoreError::sqlite(REVIEW_PHOTOS, "write row"))?;
        }
        Ok(())
    }

    /// Remove every photo of `review_id`.
    pub fn delete(&self, review_id: ReviewId) -> Result<(), StoreError> {
        self.db
            .connection()
            .execute("DELETE FROM review_photos WHERE review_id = ?1", [review_id])
            .map(|_| ())
            .map_err(StoreError::sqlite(REVIEW_PHOTOS, "delete rows"))
    }

    /// Remove photos of every review of `marker_id`.
    pub fn delete_for_marker(&self, marker_id: MarkerId) -> Result<(), StoreError> {
        self.db
            .connection()
            .execute(
                "DELETE FROM review_photos WHERE review_id IN \
                 (SELECT id FROM reviews WHERE marker_id = ?1)",
                [marker_id],
            )
            .map(|_| ())
            .map_err(StoreError::sqlite(REVIEW_PHOTOS, "delete marker photos"))
    }

    /// Remove photos of reviews on every marker whose key falls in `range`.
    pub fn delete_range(&self, range: KeyRange) -> Result<(), StoreError> {
        let sql = format!(
            "DELETE FROM review_photos WHERE review_id IN \
             (SELECT id FROM reviews WHERE marker_id IN ({OWNED_BY_RANGE}))"
        );
        self.db
            .connection()
            .execute(&sql, params![range.start(), range.end()])
            .map(|_| ())
            .map_err(StoreError::sqlite(REVIEW_PHOTOS, "delete range"))
    }
}

fn review_photo_from_row(row: &Row<'_>, first: usize) -> rusqlite::Result<ReviewPhoto> {
    Ok(ReviewPhoto {
        id: row.get(first)?,
        url: row.get(first + 1)?,
        caption: row.get(first + 2)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use seamark_core::test_support::{review, review_photo};

    #[fixture]
    fn db() -> Arc<Database> {
        Arc::new(Database::open_in_memory().expect("open store"))
    }

    #[rstest]
    fn reviews_are_listed_per_marker(db: Arc<Database>) {
        let table = ReviewTable::new(db);
        for (id, marker_id) in [(3, 1), (1, 1), (2, 2)] {
            table
                .write(&review(id, marker_id, 10).review)
                .expect("write review");
        }

        let ids: Vec<ReviewId> = table
            .for_marker(1, Page::All)
            .expect("list reviews")
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(
            table
                .for_marker(1, Page::Window { index: 1, size: 1 })
                .expect("second page")
                .len(),
            1
        );
    }

    #[rstest]
    fn marker_photo_join_tags_review_ids(db: Arc<Database>) {
        let reviews = ReviewTable::new(Arc::clone(&db));
        let photos = ReviewPhotoTable::new(db);
        reviews.write(&review(1, 7, 1).review).expect("review 1");
        reviews.write(&review(2, 8, 1).review).expect("review 2");
        photos.write(1, &[review_photo(11), review_photo(12)]).expect("photos 1");
        photos.write(2, &[review_photo(21)]).expect("photos 2");

        let tagged = photos.for_marker(7).expect("join photos");

        assert_eq!(
            tagged,
            vec![(1, review_photo(11)), (1, review_photo(12))]
        );
    }

    #[rstest]
    fn marker_delete_removes_photos_through_reviews(db: Arc<Database>) {
        let reviews = ReviewTable::new(Arc::clone(&db));
        let photos = ReviewPhotoTable::new(db);
        reviews.write(&review(1, 7, 1).review).expect("review");
        photos.write(1, &[review_photo(11)]).expect("photos");

        photos.delete_for_marker(7).expect("delete photos");
        reviews.delete_for_marker(7).expect("delete reviews");

        assert!(photos.for_review(1).expect("read photos").is_empty());
        assert_eq!(reviews.get(1).expect("read review"), None);
    }
}
