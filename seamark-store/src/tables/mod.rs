//! Leaf table wrappers.
//!
//! Each wrapper owns one relation and exposes the same small contract:
//! `get` by owner id, `write`, `delete` by owner id and, for relations that
//! take part in tile deletion, `delete_range` over the owning marker's
//! spatial key. Wrappers never acquire the access guard; callers do.

mod markers;
mod photos;
mod reviews;
mod satellites;
mod support;
mod tiles;
mod watermarks;

use std::marker::PhantomData;
use std::sync::Arc;

use rusqlite::{OptionalExtension, Row, ToSql, params};
use seamark_core::{
    Address, Amenities, Business, Contact, Dockage, Fuel, KeyRange, MarkerId, MarkerMeta,
    Moorings, Navigation, Retail, Services, SponsorshipProgram,
};

use crate::database::Database;
use crate::error::StoreError;

pub use markers::{MarkerPosition, MarkerTable, PositionTable};
pub use photos::{CompetitorTable, PhotoTable};
pub use reviews::{ReviewPhotoTable, ReviewTable};
pub use support::{LanguageTable, TemplateTable, TranslationTable};
pub use tiles::TileTable;
pub use watermarks::WatermarkTable;

/// Rows owned by markers living in `range`.
pub(crate) const OWNED_BY_RANGE: &str =
    "SELECT id FROM markers WHERE spatial_key >= ?1 AND spatial_key < ?2";

/// Slice of an ordered listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Page {
    /// Every row.
    #[default]
    All,
    /// `size` rows starting at row `index * size`.
    Window {
        /// Zero-based page number.
        index: u32,
        /// Rows per page.
        size: u32,
    },
}

impl Page {
    /// `LIMIT` and `OFFSET` values. SQLite treats a negative limit as none.
    pub(crate) fn limit_offset(self) -> (i64, i64) {
        match self {
            Self::All => (-1, 0),
            Self::Window { index, size } => {
                (i64::from(size), i64::from(index) * i64::from(size))
            }
        }
    }
}

/// A satellite stored as at most one row per marker, keyed by marker id.
pub trait SingularRow: Sized {
    /// Relation name.
    const TABLE: &'static str;
    /// Value columns in binding order, excluding `id`.
    const COLUMNS: &'static [&'static str];

    /// Values for [`Self::COLUMNS`], in order.
    fn bind(&self) -> Vec<&dyn ToSql>;

    /// Decode a row selected as [`Self::COLUMNS`].
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Leaf wrapper for a [`SingularRow`] relation.
#[derive(Debug)]
pub struct SingularTable<R> {
    db: Arc<Database>,
    row: PhantomData<fn() -> R>,
}

impl<R> Clone for SingularTable<R> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.db))
    }
}

impl<R> SingularTable<R> {
    /// Wrap the relation on `db`.
    #[must_use]
    pub const fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            row: PhantomData,
        }
    }
}

impl<R: SingularRow> SingularTable<R> {
    /// The row owned by `id`, if present.
    pub fn get(&self, id: MarkerId) -> Result<Option<R>, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?1",
            R::COLUMNS.join(", "),
            R::TABLE
        );
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare_cached(&sql)
            .map_err(StoreError::sqlite(R::TABLE, "prepare get"))?;
        stmt.query_row([id], R::from_row)
            .optional()
            .map_err(StoreError::sqlite(R::TABLE, "get row"))
    }

    /// Insert or replace the row owned by `id`.
    pub fn write(&self, id: MarkerId, row: &R) -> Result<(), StoreError> {
        let placeholders: Vec<String> = (1..=R::COLUMNS.len() + 1)
            .map(|index| format!("?{index}"))
            .collect();
        let sql = format!(
            "INSERT OR REPLACE INTO {} (id, {}) VALUES ({})",
            R::TABLE,
            R::COLUMNS.join(", "),
            placeholders.join(", ")
        );
        let mut values = vec![&id as &dyn ToSql];
        values.extend(row.bind());

        let conn = self.db.connection();
        let mut stmt = conn
            .prepare_cached(&sql)
            .map_err(StoreError::sqlite(R::TABLE, "prepare write"))?;
        stmt.execute(values.as_slice())
            .map(|_| ())
            .map_err(StoreError::sqlite(R::TABLE, "write row"))
    }

    /// Remove the row owned by `id`. Removing a missing row succeeds.
    pub fn delete(&self, id: MarkerId) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", R::TABLE);
        let conn = self.db.connection();
        conn.execute(&sql, [id])
            .map(|_| ())
            .map_err(StoreError::sqlite(R::TABLE, "delete row"))
    }

    /// Remove every row whose owning marker's key falls in `range`.
    ///
    /// Owners are resolved through the primary marker table, so this must run
    /// before the markers themselves are removed.
    pub fn delete_range(&self, range: KeyRange) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {} WHERE id IN ({OWNED_BY_RANGE})", R::TABLE);
        let conn = self.db.connection();
        conn.execute(&sql, params![range.start(), range.end()])
            .map(|_| ())
            .map_err(StoreError::sqlite(R::TABLE, "delete range"))
    }
}

/// Title and summary note.
pub type MetaTable = SingularTable<MarkerMeta>;
/// Postal addresses.
pub type AddressTable = SingularTable<Address>;
/// Shore-side amenities.
pub type AmenitiesTable = SingularTable<Amenities>;
/// Business details.
pub type BusinessTable = SingularTable<Business>;
/// Contact channels.
pub type ContactTable = SingularTable<Contact>;
/// Transient dockage.
pub type DockageTable = SingularTable<Dockage>;
/// Fuel availability.
pub type FuelTable = SingularTable<Fuel>;
/// Mooring fields.
pub type MooringsTable = SingularTable<Moorings>;
/// Approach and depth information.
pub type NavigationTable = SingularTable<Navigation>;
/// Retail offering.
pub type RetailTable = SingularTable<Retail>;
/// Repair and yard services.
pub type ServicesTable = SingularTable<Services>;
/// Sponsorship programs.
pub type SponsorshipTable = SingularTable<SponsorshipProgram>;

/// Every leaf wrapper over one shared [`Database`].
#[derive(Debug, Clone)]
pub struct Tables {
    /// Primary marker rows.
    pub markers: MarkerTable,
    /// Derived position rows.
    pub positions: PositionTable,
    /// Title and summary note.
    pub meta: MetaTable,
    /// Postal addresses.
    pub address: AddressTable,
    /// Shore-side amenities.
    pub amenities: AmenitiesTable,
    /// Business details.
    pub business: BusinessTable,
    /// Contact channels.
    pub contact: ContactTable,
    /// Transient dockage.
    pub dockage: DockageTable,
    /// Fuel availability.
    pub fuel: FuelTable,
    /// Mooring fields.
    pub moorings: MooringsTable,
    /// Approach and depth information.
    pub navigation: NavigationTable,
    /// Retail offering.
    pub retail: RetailTable,
    /// Repair and yard services.
    pub services: ServicesTable,
    /// Sponsorship programs.
    pub sponsorship: SponsorshipTable,
    /// Marker photos.
    pub photos: PhotoTable,
    /// Competitor edges.
    pub competitors: CompetitorTable,
    /// Reviews.
    pub reviews: ReviewTable,
    /// Review photos.
    pub review_photos: ReviewPhotoTable,
    /// Tile index.
    pub tiles: TileTable,
    /// Per-tile watermarks.
    pub watermarks: WatermarkTable,
    /// Languages.
    pub languages: LanguageTable,
    /// Message templates.
    pub templates: TemplateTable,
    /// String translations.
    pub translations: TranslationTable,
}

impl Tables {
    /// Build every wrapper over `db`.
    #[must_use]
    pub fn new(db: &Arc<Database>) -> Self {
        Self {
            markers: MarkerTable::new(Arc::clone(db)),
            positions: PositionTable::new(Arc::clone(db)),
            meta: MetaTable::new(Arc::clone(db)),
            address: AddressTable::new(Arc::clone(db)),
            amenities: AmenitiesTable::new(Arc::clone(db)),
            business: BusinessTable::new(Arc::clone(db)),
            contact: ContactTable::new(Arc::clone(db)),
            dockage: DockageTable::new(Arc::clone(db)),
            fuel: FuelTable::new(Arc::clone(db)),
            moorings: MooringsTable::new(Arc::clone(db)),
            navigation: NavigationTable::new(Arc::clone(db)),
            retail: RetailTable::new(Arc::clone(db)),
            services: ServicesTable::new(Arc::clone(db)),
            sponsorship: SponsorshipTable::new(Arc::clone(db)),
            photos: PhotoTable::new(Arc::clone(db)),
            competitors: CompetitorTable::new(Arc::clone(db)),
            reviews: ReviewTable::new(Arc::clone(db)),
            review_photos: ReviewPhotoTable::new(Arc::clone(db)),
            tiles: TileTable::new(Arc::clone(db)),
            watermarks: WatermarkTable::new(Arc::clone(db)),
            languages: LanguageTable::new(Arc::clone(db)),
            templates: TemplateTable::new(Arc::clone(db)),
            translations: TranslationTable::new(Arc::clone(db)),
        }
    }
}
