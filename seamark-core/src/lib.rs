//! Core domain types for the Seamark sync engine.
//!
//! The crate models markers, reviews and their satellite rows, the fixed
//! tile partition of the spatial key space, per-tile watermarks, and the
//! access guard that serialises work against a single store connection.
//! Nothing here performs I/O; persistence lives in `seamark-store`.

#![forbid(unsafe_code)]

mod lock;
mod marker;
mod review;
mod satellite;
mod support;
mod tile;
mod watermark;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use lock::{AccessLock, AccessMode, AccessScope, LockStatus};
pub use marker::{
    Marker, MarkerId, MarkerMeta, MarkerRecord, MarkerType, MarkerTypeError, MarkerUpdate,
    TypeMask,
};
pub use review::{Rating, RatingError, Review, ReviewId, ReviewPhoto, ReviewRecord, ReviewUpdate};
pub use satellite::{
    Address, Amenities, Business, Contact, Dockage, Fuel, Moorings, Navigation, Photo, PhotoId,
    Retail, Services, SponsorshipProgram,
};
pub use support::{Language, SupportTables, Template, Translation};
pub use tile::{
    GRID_COLUMNS, KeyRange, KeyRangeError, SpatialKey, Tile, TileCoord, TileCoordError,
    TilePartition, TilePartitionError,
};
pub use watermark::{Watermark, WatermarkMap};
