//! Markers: the primary points of interest and their synchronised graph.
//!
//! A marker owns at most one row in each singular satellite relation and any
//! number of photos and competitor edges. Ownership is purely id-keyed; no
//! satellite holds a reference back to its marker.

use geo::Coord;
use thiserror::Error;

use crate::SpatialKey;
use crate::satellite::{
    Address, Amenities, Business, Contact, Dockage, Fuel, Moorings, Navigation, Photo, Retail,
    Services, SponsorshipProgram,
};

/// Externally assigned, stable marker identifier.
pub type MarkerId = u64;

/// Kind of marker. Each variant sets exactly one bit so kinds double as
/// filter flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum MarkerType {
    /// Full-service marina.
    Marina = 1,
    /// Anchorage.
    Anchorage = 1 << 1,
    /// Bridge with clearance data.
    Bridge = 1 << 2,
    /// Navigation lock.
    Lock = 1 << 3,
    /// Dam.
    Dam = 1 << 4,
    /// Ferry crossing.
    Ferry = 1 << 5,
    /// Inlet.
    Inlet = 1 << 6,
    /// Navigational hazard.
    Hazard = 1 << 7,
    /// Local-knowledge note.
    LocalKnowledge = 1 << 8,
    /// Waterfront business.
    Business = 1 << 9,
    /// Boat ramp.
    Ramp = 1 << 10,
}

/// Errors returned by [`MarkerType::from_bits`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarkerTypeError {
    /// The value does not name exactly one known kind.
    #[error("{bits:#x} is not a single known marker type bit")]
    Unknown {
        /// Rejected bit pattern.
        bits: u32,
    },
}

impl MarkerType {
    /// Every kind, in bit order.
    pub const ALL: [Self; 11] = [
        Self::Marina,
        Self::Anchorage,
        Self::Bridge,
        Self::Lock,
        Self::Dam,
        Self::Ferry,
        Self::Inlet,
        Self::Hazard,
        Self::LocalKnowledge,
        Self::Business,
        Self::Ramp,
    ];

    /// The single bit identifying this kind.
    #[must_use]
    pub const fn bit(self) -> u32 {
        self as u32
    }

    /// Parse a stored single-bit value.
    ///
    /// # Examples
    /// ```
    /// use seamark_core::MarkerType;
    ///
    /// assert_eq!(MarkerType::from_bits(2), Ok(MarkerType::Anchorage));
    /// assert!(MarkerType::from_bits(3).is_err());
    /// ```
    pub fn from_bits(bits: u32) -> Result<Self, MarkerTypeError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.bit() == bits)
            .ok_or(MarkerTypeError::Unknown { bits })
    }
}

/// Set of marker kinds used for filtering.
///
/// # Examples
/// ```
/// use seamark_core::{MarkerType, TypeMask};
///
/// let mask = TypeMask::from_types([MarkerType::Marina, MarkerType::Hazard]);
/// assert!(mask.contains(MarkerType::Hazard));
/// assert!(!mask.contains(MarkerType::Bridge));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeMask(u32);

impl TypeMask {
    /// Mask accepting every kind.
    pub const ALL: Self = Self((1 << 11) - 1);

    /// Wrap a raw bitmask.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Build a mask from a set of kinds.
    #[must_use]
    pub fn from_types<I>(kinds: I) -> Self
    where
        I: IntoIterator<Item = MarkerType>,
    {
        Self(kinds.into_iter().fold(0, |bits, kind| bits | kind.bit()))
    }

    /// Raw bitmask.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether `kind` is part of the mask.
    #[must_use]
    pub const fn contains(self, kind: MarkerType) -> bool {
        self.0 & kind.bit() != 0
    }
}

/// Primary marker row.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Marker {
    /// Stable identifier.
    pub id: MarkerId,
    /// Kind of marker.
    pub kind: MarkerType,
    /// WGS84 position with `x = longitude` and `y = latitude`.
    pub position: Coord<f64>,
    /// Precomputed key placing the marker in one tile.
    pub spatial_key: SpatialKey,
    /// Server timestamp of the last change to this marker.
    pub last_updated: u64,
    /// Search-filter flags maintained by the server.
    pub search_filter: u32,
    /// Sponsorship tier, `None` when unsponsored.
    pub sponsorship_tier: Option<u32>,
}

/// Title and summary note shown for a marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarkerMeta {
    /// Display title.
    pub title: String,
    /// Short summary note.
    pub note: Option<String>,
}

/// A marker together with every satellite row it owns.
///
/// The same shape flows in both directions: inbound upserts carry it to the
/// update side and the merge side assembles it when reading back. A `None`
/// satellite is absent, which is distinct from a present row whose fields are
/// all empty.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarkerRecord {
    /// Primary row.
    pub marker: Marker,
    /// Title and note; required for the record to exist.
    pub meta: MarkerMeta,
    /// Postal address.
    pub address: Option<Address>,
    /// Shore-side amenities.
    pub amenities: Option<Amenities>,
    /// Business details.
    pub business: Option<Business>,
    /// Contact channels.
    pub contact: Option<Contact>,
    /// Transient dockage.
    pub dockage: Option<Dockage>,
    /// Fuel availability and pricing.
    pub fuel: Option<Fuel>,
    /// Mooring field.
    pub moorings: Option<Moorings>,
    /// Approach and depth notes.
    pub navigation: Option<Navigation>,
    /// Retail offering.
    pub retail: Option<Retail>,
    /// Repair and yard services.
    pub services: Option<Services>,
    /// Active sponsorship program.
    pub sponsorship: Option<SponsorshipProgram>,
    /// Photos in display order. Always the complete set.
    pub photos: Vec<Photo>,
    /// Competitor marker ids in rank order. Always the complete set.
    pub competitors: Vec<MarkerId>,
}

impl MarkerRecord {
    /// A record with only the required rows present.
    #[must_use]
    pub const fn new(marker: Marker, meta: MarkerMeta) -> Self {
        Self {
            marker,
            meta,
            address: None,
            amenities: None,
            business: None,
            contact: None,
            dockage: None,
            fuel: None,
            moorings: None,
            navigation: None,
            retail: None,
            services: None,
            sponsorship: None,
            photos: Vec::new(),
            competitors: Vec::new(),
        }
    }

    /// Identifier of the owning marker.
    #[must_use]
    pub const fn id(&self) -> MarkerId {
        self.marker.id
    }
}

/// One instruction in an inbound marker batch.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerUpdate {
    /// Create or replace the marker and every relation the record includes.
    Upsert(Box<MarkerRecord>),
    /// Remove the marker and everything it owns.
    Tombstone {
        /// Marker to remove.
        id: MarkerId,
        /// Server timestamp of the deletion, zero when not supplied.
        last_updated: u64,
    },
}

impl MarkerUpdate {
    /// Wrap a record as an upsert.
    #[must_use]
    pub fn upsert(record: MarkerRecord) -> Self {
        Self::Upsert(Box::new(record))
    }

    /// A tombstone without a deletion timestamp.
    #[must_use]
    pub const fn tombstone(id: MarkerId) -> Self {
        Self::Tombstone {
            id,
            last_updated: 0,
        }
    }

    /// Identifier the instruction targets.
    #[must_use]
    pub fn id(&self) -> MarkerId {
        match self {
            Self::Upsert(record) => record.id(),
            Self::Tombstone { id, .. } => *id,
        }
    }

    /// Timestamp contributing to the batch watermark.
    #[must_use]
    pub fn last_updated(&self) -> u64 {
        match self {
            Self::Upsert(record) => record.marker.last_updated,
            Self::Tombstone { last_updated, .. } => *last_updated,
        }
    }
}
