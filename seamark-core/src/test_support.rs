//! Fixture builders shared by unit and behaviour tests.

use geo::{Coord, Rect};

use crate::{
    KeyRange, Marker, MarkerId, MarkerMeta, MarkerRecord, MarkerType, Photo, Rating, Review,
    ReviewId, ReviewPhoto, ReviewRecord, SpatialKey, Tile, TileCoord,
};

/// A marina at the origin with the given key and timestamp.
#[must_use]
pub fn marker(id: MarkerId, spatial_key: SpatialKey, last_updated: u64) -> Marker {
    Marker {
        id,
        kind: MarkerType::Marina,
        position: Coord { x: 0.0, y: 0.0 },
        spatial_key,
        last_updated,
        search_filter: MarkerType::Marina.bit(),
        sponsorship_tier: None,
    }
}

/// A record holding only the required primary and meta rows.
#[must_use]
pub fn marker_record(id: MarkerId, spatial_key: SpatialKey, last_updated: u64) -> MarkerRecord {
    MarkerRecord::new(
        marker(id, spatial_key, last_updated),
        MarkerMeta {
            title: format!("Marker {id}"),
            note: None,
        },
    )
}

/// A photo with a deterministic URL.
#[must_use]
pub fn photo(id: u64) -> Photo {
    Photo {
        id,
        url: format!("https://photos.invalid/{id}.jpg"),
        caption: None,
    }
}

/// A four-star review of `marker_id`.
#[must_use]
pub fn review(id: ReviewId, marker_id: MarkerId, last_updated: u64) -> ReviewRecord {
    ReviewRecord::new(Review {
        id,
        marker_id,
        rating: Rating::new(4).unwrap_or_else(|_| unreachable!("4 is a valid rating")),
        title: format!("Review {id}"),
        date: "2024-06-01".into(),
        author: "Skipper".into(),
        body: "Calm water and friendly staff.".into(),
        votes: 0,
        response: None,
        last_updated,
    })
}

/// A review photo with a deterministic URL.
#[must_use]
pub fn review_photo(id: u64) -> ReviewPhoto {
    ReviewPhoto {
        id,
        url: format!("https://photos.invalid/reviews/{id}.jpg"),
        caption: None,
    }
}

/// A one-degree tile at `(x, y)` owning `start..end`.
///
/// # Panics
/// Panics when the coordinates or range are invalid.
#[must_use]
pub fn tile(x: u16, y: u16, start: SpatialKey, end: SpatialKey) -> Tile {
    let coord = TileCoord::new(x, y).unwrap_or_else(|err| panic!("invalid fixture tile: {err}"));
    let keys = KeyRange::new(start, end).unwrap_or_else(|err| panic!("invalid fixture range: {err}"));
    let min = Coord {
        x: f64::from(x),
        y: f64::from(y),
    };
    let max = Coord {
        x: min.x + 1.0,
        y: min.y + 1.0,
    };
    Tile {
        coord,
        keys,
        bounds: Rect::new(min, max),
    }
}
