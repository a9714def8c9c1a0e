//! Reviews attached to markers.

use thiserror::Error;

use crate::{MarkerId, PhotoId};

/// Externally assigned review identifier.
pub type ReviewId = u64;

/// Star rating between one and five.
///
/// # Examples
/// ```
/// use seamark_core::Rating;
///
/// assert_eq!(Rating::new(4).map(Rating::get), Ok(4));
/// assert!(Rating::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub struct Rating(u8);

/// Errors returned by [`Rating::new`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RatingError {
    /// The value lies outside `1..=5`.
    #[error("rating {value} must be between 1 and 5")]
    OutOfRange {
        /// Rejected value.
        value: u8,
    },
}

impl Rating {
    /// Validates and constructs a [`Rating`].
    pub const fn new(value: u8) -> Result<Self, RatingError> {
        if value < 1 || value > 5 {
            return Err(RatingError::OutOfRange { value });
        }
        Ok(Self(value))
    }

    /// Number of stars.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = RatingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// A review row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Review {
    /// Stable identifier.
    pub id: ReviewId,
    /// Marker the review belongs to.
    pub marker_id: MarkerId,
    /// Star rating.
    pub rating: Rating,
    /// Headline.
    pub title: String,
    /// Visit date as supplied by the server.
    pub date: String,
    /// Display name of the reviewer.
    pub author: String,
    /// Review text.
    pub body: String,
    /// Helpful votes.
    pub votes: i32,
    /// Reply from the business, if any.
    pub response: Option<String>,
    /// Server timestamp of the last change.
    pub last_updated: u64,
}

/// A photo attached to a review.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReviewPhoto {
    /// Server identifier.
    pub id: PhotoId,
    /// Download location.
    pub url: String,
    /// Optional caption.
    pub caption: Option<String>,
}

/// A review with its complete photo set.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReviewRecord {
    /// Review row.
    pub review: Review,
    /// Photos in display order.
    pub photos: Vec<ReviewPhoto>,
}

impl ReviewRecord {
    /// A record without photos.
    #[must_use]
    pub const fn new(review: Review) -> Self {
        Self {
            review,
            photos: Vec::new(),
        }
    }

    /// Identifier of the review.
    #[must_use]
    pub const fn id(&self) -> ReviewId {
        self.review.id
    }
}

/// One instruction in an inbound review batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewUpdate {
    /// Create or replace the review and its photo set.
    Upsert(ReviewRecord),
    /// Remove the review and its photos.
    Tombstone {
        /// Review to remove.
        id: ReviewId,
        /// Server timestamp of the deletion, zero when not supplied.
        last_updated: u64,
    },
}

impl ReviewUpdate {
    /// A tombstone without a deletion timestamp.
    #[must_use]
    pub const fn tombstone(id: ReviewId) -> Self {
        Self::Tombstone {
            id,
            last_updated: 0,
        }
    }

    /// Identifier the instruction targets.
    #[must_use]
    pub const fn id(&self) -> ReviewId {
        match self {
            Self::Upsert(record) => record.review.id,
            Self::Tombstone { id, .. } => *id,
        }
    }

    /// Timestamp contributing to the batch watermark.
    #[must_use]
    pub const fn last_updated(&self) -> u64 {
        match self {
            Self::Upsert(record) => record.review.last_updated,
            Self::Tombstone { last_updated, .. } => *last_updated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1)]
    #[case(5)]
    fn accepts_boundary_ratings(#[case] value: u8) {
        assert_eq!(Rating::new(value).map(Rating::get), Ok(value));
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    fn rejects_out_of_range_ratings(#[case] value: u8) {
        assert_eq!(Rating::new(value), Err(RatingError::OutOfRange { value }));
    }
}
