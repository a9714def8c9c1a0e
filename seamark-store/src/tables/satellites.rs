//! Column mappings for the singular satellite relations.

use rusqlite::{Row, ToSql};
use seamark_core::{
    Address, Amenities, Business, Contact, Dockage, Fuel, MarkerMeta, Moorings, Navigation,
    Retail, Services, SponsorshipProgram,
};

use super::SingularRow;

impl SingularRow for MarkerMeta {
    const TABLE: &'static str = "marker_meta";
    const COLUMNS: &'static [&'static str] = &["title", "note"];

    fn bind(&self) -> Vec<&dyn ToSql> {
        vec![&self.title as &dyn ToSql, &self.note]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            title: row.get(0)?,
            note: row.get(1)?,
        })
    }
}

impl SingularRow for Address {
    const TABLE: &'static str = "addresses";
    const COLUMNS: &'static [&'static str] =
        &["street", "city", "region", "postal_code", "country"];

    fn bind(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.street as &dyn ToSql,
            &self.city,
            &self.region,
            &self.postal_code,
            &self.country,
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            street: row.get(0)?,
            city: row.get(1)?,
            region: row.get(2)?,
            postal_code: row.get(3)?,
            country: row.get(4)?,
        })
    }
}

impl SingularRow for Amenities {
    const TABLE: &'static str = "amenities";
    const COLUMNS: &'static [&'static str] = &[
        "restrooms",
        "showers",
        "laundry",
        "pump_out",
        "wifi",
        "pool",
        "notes",
    ];

    fn bind(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.restrooms as &dyn ToSql,
            &self.showers,
            &self.laundry,
            &self.pump_out,
            &self.wifi,
            &self.pool,
            &self.notes,
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            restrooms: row.get(0)?,
            showers: row.get(1)?,
            laundry: row.get(2)?,
            pump_out: row.get(3)?,
            wifi: row.get(4)?,
            pool: row.get(5)?,
            notes: row.get(6)?,
        })
    }
}

impl SingularRow for Business {
    const TABLE: &'static str = "businesses";
    const COLUMNS: &'static [&'static str] = &["hours", "season", "payment_methods", "notes"];

    fn bind(&self) -> Vec<&dyn ToSql> {
        vec![&self.hours as &dyn ToSql, &self.season, &self.payment_methods, &self.notes]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            hours: row.get(0)?,
            season: row.get(1)?,
            payment_methods: row.get(2)?,
            notes: row.get(3)?,
        })
    }
}

impl SingularRow for Contact {
    const TABLE: &'static str = "contacts";
    const COLUMNS: &'static [&'static str] = &["phone", "vhf_channel", "email", "website"];

    fn bind(&self) -> Vec<&dyn ToSql> {
        vec![&self.phone as &dyn ToSql, &self.vhf_channel, &self.email, &self.website]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            phone: row.get(0)?,
            vhf_channel: row.get(1)?,
            email: row.get(2)?,
            website: row.get(3)?,
        })
    }
}

impl SingularRow for Dockage {
    const TABLE: &'static str = "dockage";
    const COLUMNS: &'static [&'static str] = &[
        "transient_slips",
        "max_length",
        "min_depth",
        "rate_per_metre",
        "power",
        "notes",
    ];

    fn bind(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.transient_slips as &dyn ToSql,
            &self.max_length,
            &self.min_depth,
            &self.rate_per_metre,
            &self.power,
            &self.notes,
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            transient_slips: row.get(0)?,
            max_length: row.get(1)?,
            min_depth: row.get(2)?,
            rate_per_metre: row.get(3)?,
            power: row.get(4)?,
            notes: row.get(5)?,
        })
    }
}

impl SingularRow for Fuel {
    const TABLE: &'static str = "fuel";
    const COLUMNS: &'static [&'static str] =
        &["diesel", "gasoline", "diesel_price", "gasoline_price", "notes"];

    fn bind(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.diesel as &dyn ToSql,
            &self.gasoline,
            &self.diesel_price,
            &self.gasoline_price,
            &self.notes,
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            diesel: row.get(0)?,
            gasoline: row.get(1)?,
            diesel_price: row.get(2)?,
            gasoline_price: row.get(3)?,
            notes: row.get(4)?,
        })
    }
}

impl SingularRow for Moorings {
    const TABLE: &'static str = "moorings";
    const COLUMNS: &'static [&'static str] = &["count", "rate", "notes"];

    fn bind(&self) -> Vec<&dyn ToSql> {
        vec![&self.count as &dyn ToSql, &self.rate, &self.notes]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            count: row.get(0)?,
            rate: row.get(1)?,
            notes: row.get(2)?,
        })
    }
}

impl SingularRow for Navigation {
    const TABLE: &'static str = "navigation";
    const COLUMNS: &'static [&'static str] =
        &["approach_depth", "dock_depth", "tide_range", "notes"];

    fn bind(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.approach_depth as &dyn ToSql,
            &self.dock_depth,
            &self.tide_range,
            &self.notes,
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            approach_depth: row.get(0)?,
            dock_depth: row.get(1)?,
            tide_range: row.get(2)?,
            notes: row.get(3)?,
        })
    }
}

impl SingularRow for Retail {
    const TABLE: &'static str = "retail";
    const COLUMNS: &'static [&'static str] = &["provisions", "chandlery", "ice", "notes"];

    fn bind(&self) -> Vec<&dyn ToSql> {
        vec![&self.provisions as &dyn ToSql, &self.chandlery, &self.ice, &self.notes]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            provisions: row.get(0)?,
            chandlery: row.get(1)?,
            ice: row.get(2)?,
            notes: row.get(3)?,
        })
    }
}

impl SingularRow for Services {
    const TABLE: &'static str = "services";
    const COLUMNS: &'static [&'static str] = &["repairs", "haul_out", "storage", "notes"];

    fn bind(&self) -> Vec<&dyn ToSql> {
        vec![&self.repairs as &dyn ToSql, &self.haul_out, &self.storage, &self.notes]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            repairs: row.get(0)?,
            haul_out: row.get(1)?,
            storage: row.get(2)?,
            notes: row.get(3)?,
        })
    }
}

impl SingularRow for SponsorshipProgram {
    const TABLE: &'static str = "sponsorship_programs";
    const COLUMNS: &'static [&'static str] = &["name", "tier", "starts_at", "ends_at"];

    fn bind(&self) -> Vec<&dyn ToSql> {
        vec![&self.name as &dyn ToSql, &self.tier, &self.starts_at, &self.ends_at]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get(0)?,
            tier: row.get(1)?,
            starts_at: row.get(2)?,
            ends_at: row.get(3)?,
        })
    }
}
