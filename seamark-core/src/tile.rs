//! Spatial tiling over the precomputed key space.
//!
//! Markers carry an externally computed spatial key. The key space is split
//! into fixed rectangular tiles, each owning a contiguous half-open key range.
//! Tiles never change once provisioned; the sync engine only reads them.

use std::fmt;

use geo::{Coord, Intersects, Rect};
use thiserror::Error;

/// Number of tile columns in the grid. Tile identifiers are `y * 16 + x`.
pub const GRID_COLUMNS: u16 = 16;

/// Sortable key placing a marker in exactly one tile.
pub type SpatialKey = u64;

/// Grid position of a tile.
///
/// # Examples
/// ```
/// use seamark_core::TileCoord;
///
/// # fn main() -> Result<(), seamark_core::TileCoordError> {
/// let coord = TileCoord::new(4, 6)?;
/// assert_eq!(coord.id(), 100);
/// assert_eq!(TileCoord::from_id(100)?, coord);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileCoord {
    x: u16,
    y: u16,
}

/// Errors returned by [`TileCoord::new`] and [`TileCoord::from_id`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TileCoordError {
    /// The column index does not fit the sixteen-column grid.
    #[error("tile column {x} is outside the grid (0..{GRID_COLUMNS})")]
    ColumnOutOfRange {
        /// Rejected column.
        x: u16,
    },
    /// The identifier names a row beyond `u16::MAX`.
    #[error("tile id {id} has no grid position")]
    IdOutOfRange {
        /// Rejected identifier.
        id: u32,
    },
}

impl TileCoord {
    /// Validates and constructs a [`TileCoord`].
    pub const fn new(x: u16, y: u16) -> Result<Self, TileCoordError> {
        if x >= GRID_COLUMNS {
            return Err(TileCoordError::ColumnOutOfRange { x });
        }
        Ok(Self { x, y })
    }

    /// Recover the grid position from a tile identifier.
    pub fn from_id(id: u32) -> Result<Self, TileCoordError> {
        // GRID_COLUMNS is a power of two, so the split is a mask and a shift.
        let out_of_range = |_| TileCoordError::IdOutOfRange { id };
        Ok(Self {
            x: u16::try_from(id & 0xF).map_err(out_of_range)?,
            y: u16::try_from(id >> 4).map_err(out_of_range)?,
        })
    }

    /// Column index.
    #[must_use]
    pub const fn x(self) -> u16 {
        self.x
    }

    /// Row index.
    #[must_use]
    pub const fn y(self) -> u16 {
        self.y
    }

    /// Tile identifier, `y * 16 + x`.
    #[must_use]
    pub const fn id(self) -> u32 {
        (self.y as u32) * (GRID_COLUMNS as u32) + self.x as u32
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Half-open range of spatial keys, `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyRange {
    start: SpatialKey,
    end: SpatialKey,
}

/// Errors returned by [`KeyRange::new`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyRangeError {
    /// The range would contain no keys.
    #[error("key range {start}..{end} is empty")]
    Empty {
        /// Inclusive lower bound.
        start: SpatialKey,
        /// Exclusive upper bound.
        end: SpatialKey,
    },
}

impl KeyRange {
    /// Validates and constructs a non-empty [`KeyRange`].
    pub const fn new(start: SpatialKey, end: SpatialKey) -> Result<Self, KeyRangeError> {
        if start >= end {
            return Err(KeyRangeError::Empty { start, end });
        }
        Ok(Self { start, end })
    }

    /// Inclusive lower bound.
    #[must_use]
    pub const fn start(self) -> SpatialKey {
        self.start
    }

    /// Exclusive upper bound.
    #[must_use]
    pub const fn end(self) -> SpatialKey {
        self.end
    }

    /// Whether `key` falls inside the range.
    #[must_use]
    pub const fn contains(self, key: SpatialKey) -> bool {
        self.start <= key && key < self.end
    }

    /// Whether the two ranges share at least one key.
    #[must_use]
    pub const fn overlaps(self, other: Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for KeyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// A fixed map region owning a contiguous key range.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tile {
    /// Grid position.
    pub coord: TileCoord,
    /// Keys owned by the tile.
    pub keys: KeyRange,
    /// Geographic extent in WGS84 (`x = longitude`, `y = latitude`).
    pub bounds: Rect<f64>,
}

impl Tile {
    /// Whether the position lies inside the tile's bounds, edges included.
    #[must_use]
    pub fn covers(&self, position: Coord<f64>) -> bool {
        self.bounds.intersects(&position)
    }

    /// Whether the tile's area overlaps `bbox`.
    ///
    /// Sharing only an edge with `bbox` does not count, so a box aligned to
    /// tile bounds selects exactly the tiles inside it. Along an axis where
    /// `bbox` has no extent the edges are included.
    #[must_use]
    pub fn overlaps(&self, bbox: &Rect<f64>) -> bool {
        let (min, max) = (self.bounds.min(), self.bounds.max());
        let (from, to) = (bbox.min(), bbox.max());
        spans_overlap(min.x, max.x, from.x, to.x) && spans_overlap(min.y, max.y, from.y, to.y)
    }
}

const fn spans_overlap(lo: f64, hi: f64, from: f64, to: f64) -> bool {
    if from >= to {
        lo <= from && from <= hi
    } else {
        lo < to && hi > from
    }
}

/// Errors returned by [`TilePartition::new`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TilePartitionError {
    /// Two tiles share a grid position.
    #[error("tile {coord} appears more than once")]
    DuplicateCoord {
        /// Repeated position.
        coord: TileCoord,
    },
    /// Two tiles claim overlapping key ranges.
    #[error("tiles {first} and {second} have overlapping key ranges")]
    OverlappingRanges {
        /// Tile with the lower range start.
        first: TileCoord,
        /// Tile whose range starts inside `first`.
        second: TileCoord,
    },
}

/// A validated set of tiles whose key ranges are pairwise disjoint.
///
/// # Examples
/// ```
/// use geo::{Coord, Rect};
/// use seamark_core::{KeyRange, Tile, TileCoord, TilePartition};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let tile = Tile {
///     coord: TileCoord::new(4, 6)?,
///     keys: KeyRange::new(6000, 6999)?,
///     bounds: Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 }),
/// };
/// let partition = TilePartition::new(vec![tile])?;
/// assert_eq!(partition.tile_for_key(6500).map(|t| t.coord.id()), Some(100));
/// assert!(partition.tile_for_key(6999).is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TilePartition {
    tiles: Vec<Tile>,
}

impl TilePartition {
    /// Validate and index the supplied tiles.
    pub fn new(mut tiles: Vec<Tile>) -> Result<Self, TilePartitionError> {
        let mut coords: Vec<TileCoord> = tiles.iter().map(|tile| tile.coord).collect();
        coords.sort_unstable();
        if let Some(pair) = coords.windows(2).find(|pair| pair.first() == pair.last()) {
            if let Some(&coord) = pair.first() {
                return Err(TilePartitionError::DuplicateCoord { coord });
            }
        }

        tiles.sort_by_key(|tile| tile.keys.start());
        for pair in tiles.windows(2) {
            if let [first, second] = pair {
                if first.keys.overlaps(second.keys) {
                    return Err(TilePartitionError::OverlappingRanges {
                        first: first.coord,
                        second: second.coord,
                    });
                }
            }
        }
        Ok(Self { tiles })
    }

    /// The tile owning `key`, if any tile does.
    #[must_use]
    pub fn tile_for_key(&self, key: SpatialKey) -> Option<&Tile> {
        let candidate = self
            .tiles
            .partition_point(|tile| tile.keys.start() <= key)
            .checked_sub(1)?;
        self.tiles
            .get(candidate)
            .filter(|tile| tile.keys.contains(key))
    }

    /// Tiles overlapping `bbox`, in key order. See [`Tile::overlaps`].
    pub fn intersecting<'a>(&'a self, bbox: &'a Rect<f64>) -> impl Iterator<Item = &'a Tile> + 'a {
        self.tiles.iter().filter(move |tile| tile.overlaps(bbox))
    }

    /// Look up a tile by grid position.
    #[must_use]
    pub fn get(&self, coord: TileCoord) -> Option<&Tile> {
        self.tiles.iter().find(|tile| tile.coord == coord)
    }

    /// Tiles in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// Number of tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether the partition holds no tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}
