//! Multi-row marker satellites: photos and competitor edges.

use std::sync::Arc;

use rusqlite::{params, Row};
use seamark_core::{KeyRange, MarkerId, Photo};

use super::OWNED_BY_RANGE;
use crate::database::Database;
use crate::error::StoreError;

const PHOTOS: &str = "photos";
const COMPETITORS: &str = "competitors";

/// Photos attached to a marker, kept in upload order.
#[derive(Debug, Clone)]
pub struct PhotoTable {
    db: Arc<Database>,
}

impl PhotoTable {
    /// Wrap the relation on `db`.
    #[must_use]
    pub const fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Photos of `marker_id` in stored order.
    pub fn get(&self, marker_id: MarkerId) -> Result<Vec<Photo>, StoreError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare_cached(
                "SELECT photo_id, url, caption FROM photos WHERE marker_id = ?1 ORDER BY position",
            )
            .map_err(StoreError::sqlite(PHOTOS, "prepare get"))?;
        let rows = stmt
            .query_map([marker_id], photo_from_row)
            .map_err(StoreError::sqlite(PHOTOS, "query photos"))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::sqlite(PHOTOS, "decode photos"))
    }

    /// Add `photos` to `marker_id`, replacing rows with the same photo id.
    ///
    /// Existing photos are kept; callers replacing the set delete it first.
    pub fn write(&self, marker_id: MarkerId, photos: &[Photo]) -> Result<(), StoreError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare_cached(
                "INSERT OR REPLACE INTO photos (marker_id, photo_id, position, url, caption) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .map_err(StoreError::sqlite(PHOTOS, "prepare write"))?;
        for (position, photo) in photos.iter().enumerate() {
            stmt.execute(params![
                marker_id,
                photo.id,
                position,
                photo.url,
                photo.caption
            ])
            .map_err(StoreError::sqlite(PHOTOS, "write row"))?;
        }
        Ok(())
    }

    /// Remove every photo of `marker_id`.
    pub fn delete(&self, marker_id: MarkerId) -> Result<(), StoreError> {
        self.db
            .connection()
            .execute("DELETE FROM photos WHERE marker_id = ?1", [marker_id])
            .map(|_| ())
            .map_err(StoreError::sqlite(PHOTOS, "delete rows"))
    }

    /// Remove photos of every marker whose key falls in `range`.
    pub fn delete_range(&self, range: KeyRange) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM photos WHERE marker_id IN ({OWNED_BY_RANGE})");
        self.db
            .connection()
            .execute(&sql, params![range.start(), range.end()])
            .map(|_| ())
            .map_err(StoreError::sqlite(PHOTOS, "delete range"))
    }
}

fn photo_from_row(row: &Row<'_>) -> rusqlite::Result<Photo> {
    Ok(Photo {
        id: row.get(0)?,
        url: row.get(1)?,
        caption: row.get(2)?,
    })
}

/// Ordered subject to competitor edges.
///
/// Edges belong to the subject: deleting a marker never touches edges that
/// name it as a competitor.
#[derive(Debug, Clone)]
pub struct CompetitorTable {
    db: Arc<Database>,
}

impl CompetitorTable {
    /// Wrap the relation on `db`.
    #[must_use]
    pub const fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Competitors of `subject` in rank order.
    pub fn get(&self, subject: MarkerId) -> Result<Vec<MarkerId>, StoreError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare_cached(
                "SELECT competitor_id FROM competitors WHERE subject_id = ?1 ORDER BY rank",
            )
            .map_err(StoreError::sqlite(COMPETITORS, "prepare get"))?;
        let rows = stmt
            .query_map([subject], |row| row.get(0))
            .map_err(StoreError::sqlite(COMPETITORS, "query edges"))?;
        rows.collect::<Result<Vec<MarkerId>, _>>()
            .map_err(StoreError::sqlite(COMPETITORS, "decode edges"))
    }

    /// Add edges from `subject` to each of `competitors`, ranked in order.
    pub fn write(&self, subject: MarkerId, competitors: &[MarkerId]) -> Result<(), StoreError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare_cached(
                "INSERT OR REPLACE INTO competitors (subject_id, competitor_id, rank) \
                 VALUES (?1, ?2, ?3)",
            )
            .map_err(StoreError::sqlite(COMPETITORS, "prepare write"))?;
        for (rank, competitor) in competitors.iter().enumerate() {
            stmt.execute(params![subject, competitor, rank])
                .map_err(StoreError::sqlite(COMPETITORS, "write edge"))?;
        }
        Ok(())
    }

    /// Remove every edge whose subject is `subject`.
    pub fn delete(&self, subject: MarkerId) -> Result<(), StoreError> {
        self.db
            .connection()
            .execute("DELETE FROM competitors WHERE subject_id = ?1", [subject])
            .map(|_| ())
            .map_err(StoreError::sqlite(COMPETITORS, "delete edges"))
    }

    /// Remove edges of every subject whose key falls in `range`.
    pub fn delete_range(&self, range: KeyRange) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM competitors WHERE subject_id IN ({OWNED_BY_RANGE})");
        self.db
            .connection()
            .execute(&sql, params![range.start(), range.end()])
            .map(|_| ())
            .map_err(StoreError::sqlite(COMPETITORS, "delete range"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use seamark_core::test_support::photo;

    #[fixture]
    fn db() -> Arc<Database> {
        Arc::new(Database::open_in_memory().expect("open store"))
    }

    #[rstest]
    fn photos_keep_upload_order(db: Arc<Database>) {
        let table = PhotoTable::new(db);
        let photos = vec![photo(9), photo(2), photo(5)];
        table.write(1, &photos).expect("write photos");

        assert_eq!(table.get(1).expect("read photos"), photos);
        assert!(table.get(2).expect("read other marker").is_empty());
    }

    #[rstest]
    fn deleting_a_subject_keeps_edges_naming_it(db: Arc<Database>) {
        let table = CompetitorTable::new(db);
        table.write(1, &[2, 3]).expect("edges of 1");
        table.write(2, &[1]).expect("edges of 2");

        table.delete(1).expect("delete subject 1");

        assert!(table.get(1).expect("read 1").is_empty());
        assert_eq!(table.get(2).expect("read 2"), vec![1]);
    }
}
