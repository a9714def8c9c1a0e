//! Satellite rows owned by a marker.
//!
//! Rows carry no identifier of their own: the owning marker's id is the key
//! in every satellite relation. Monetary values are in the marina's local
//! currency and lengths in metres.

/// Photo identifier assigned by the server.
pub type PhotoId = u64;

/// Postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Address {
    /// Street and number.
    pub street: Option<String>,
    /// City or town.
    pub city: Option<String>,
    /// State, province or region.
    pub region: Option<String>,
    /// Postal code.
    pub postal_code: Option<String>,
    /// ISO country code.
    pub country: Option<String>,
}

/// Shore-side amenities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Amenities {
    /// Restrooms available.
    pub restrooms: bool,
    /// Showers available.
    pub showers: bool,
    /// Laundry available.
    pub laundry: bool,
    /// Pump-out station.
    pub pump_out: bool,
    /// Wireless internet.
    pub wifi: bool,
    /// Swimming pool.
    pub pool: bool,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Business details.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Business {
    /// Opening hours.
    pub hours: Option<String>,
    /// Operating season.
    pub season: Option<String>,
    /// Accepted payment methods.
    pub payment_methods: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Contact channels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Contact {
    /// Telephone number.
    pub phone: Option<String>,
    /// Monitored VHF channel.
    pub vhf_channel: Option<String>,
    /// E-mail address.
    pub email: Option<String>,
    /// Website.
    pub website: Option<String>,
}

/// Transient dockage.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dockage {
    /// Slips reserved for transients.
    pub transient_slips: Option<u32>,
    /// Longest vessel accepted.
    pub max_length: Option<f64>,
    /// Shallowest depth at the docks.
    pub min_depth: Option<f64>,
    /// Nightly rate per metre of length.
    pub rate_per_metre: Option<f64>,
    /// Shore power description.
    pub power: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Fuel availability and pricing.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fuel {
    /// Diesel sold.
    pub diesel: bool,
    /// Gasoline sold.
    pub gasoline: bool,
    /// Diesel price per litre.
    pub diesel_price: Option<f64>,
    /// Gasoline price per litre.
    pub gasoline_price: Option<f64>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Mooring field.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Moorings {
    /// Number of moorings.
    pub count: Option<u32>,
    /// Nightly rate.
    pub rate: Option<f64>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Approach and depth information.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Navigation {
    /// Controlling depth in the approach channel.
    pub approach_depth: Option<f64>,
    /// Depth alongside the docks.
    pub dock_depth: Option<f64>,
    /// Mean tidal range.
    pub tide_range: Option<f64>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Retail offering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Retail {
    /// Groceries and provisions.
    pub provisions: bool,
    /// Marine chandlery.
    pub chandlery: bool,
    /// Ice.
    pub ice: bool,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Repair and yard services.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Services {
    /// Engine and hull repairs.
    pub repairs: bool,
    /// Haul-out facility.
    pub haul_out: bool,
    /// Dry storage.
    pub storage: bool,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Sponsorship program a marker participates in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SponsorshipProgram {
    /// Program name.
    pub name: String,
    /// Tier within the program.
    pub tier: u32,
    /// Start of the sponsorship period, seconds since the epoch.
    pub starts_at: u64,
    /// End of the sponsorship period, seconds since the epoch.
    pub ends_at: u64,
}

/// A marker photo.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Photo {
    /// Server identifier.
    pub id: PhotoId,
    /// Download location.
    pub url: String,
    /// Optional caption.
    pub caption: Option<String>,
}
