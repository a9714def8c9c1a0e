//! Per-tile synchronisation high-water marks.

use std::collections::BTreeMap;

use crate::TileCoord;

/// Highest `last_updated` values applied for a tile.
///
/// A tile without a stored record behaves exactly like
/// `Watermark::default()`, so "never synced" and "synced at time zero" are
/// the same state.
///
/// # Examples
/// ```
/// use seamark_core::Watermark;
///
/// let mark = Watermark::default().advance_markers(1000).advance_markers(900);
/// assert_eq!(mark.marker_last_update, 1000);
/// assert_eq!(mark.review_last_update, 0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Watermark {
    /// Latest marker update applied to the tile.
    pub marker_last_update: u64,
    /// Latest review update applied to the tile.
    pub review_last_update: u64,
}

impl Watermark {
    /// Construct a watermark from both fields.
    #[must_use]
    pub const fn new(marker_last_update: u64, review_last_update: u64) -> Self {
        Self {
            marker_last_update,
            review_last_update,
        }
    }

    /// Raise the marker field to `last_updated`, never lowering it.
    #[must_use]
    pub fn advance_markers(self, last_updated: u64) -> Self {
        Self {
            marker_last_update: self.marker_last_update.max(last_updated),
            ..self
        }
    }

    /// Raise the review field to `last_updated`, never lowering it.
    #[must_use]
    pub fn advance_reviews(self, last_updated: u64) -> Self {
        Self {
            review_last_update: self.review_last_update.max(last_updated),
            ..self
        }
    }

    /// Reset the review field while keeping the marker field.
    #[must_use]
    pub const fn without_reviews(self) -> Self {
        Self {
            marker_last_update: self.marker_last_update,
            review_last_update: 0,
        }
    }
}

/// Watermarks keyed by tile, one entry per tile of interest.
pub type WatermarkMap = BTreeMap<TileCoord, Watermark>;
