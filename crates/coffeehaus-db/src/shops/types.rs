//! Row types for the `shops` table.

use chrono::{DateTime, Utc};
use coffeehaus_core::{Curation, ExistingShopSnapshot, LatLng, OpeningHours, Shop, ShopListing};
use uuid::Uuid;

/// Column list matching [`ShopRow`]; `location` is split into `lat`/`lng`.
pub(super) const SHOP_COLUMNS: &str = "id, google_place_id, name, formatted_address, vicinity, \
     ST_Y(location::geometry) AS lat, ST_X(location::geometry) AS lng, \
     google_rating, ratings_total, price_level, types, photo_refs, hours, \
     website, formatted_phone, business_status, last_sync, coffeehaus_rating, verified";

/// A full row from the `shops` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShopRow {
    pub id: Uuid,
    pub google_place_id: String,
    pub name: String,
    pub formatted_address: String,
    pub vicinity: String,
    pub lat: f64,
    pub lng: f64,
    pub google_rating: f32,
    pub ratings_total: i32,
    pub price_level: i16,
    pub types: Vec<String>,
    pub photo_refs: Vec<String>,
    pub hours: Option<serde_json::Value>,
    pub website: String,
    pub formatted_phone: String,
    pub business_status: String,
    pub last_sync: DateTime<Utc>,
    pub coffeehaus_rating: Option<f32>,
    pub verified: bool,
}

impl From<ShopRow> for Shop {
    fn from(row: ShopRow) -> Self {
        // A malformed hours document reads back as "no hours" rather than failing the row.
        let opening_hours = row
            .hours
            .and_then(|v| serde_json::from_value::<OpeningHours>(v).ok());

        Shop {
            id: row.id,
            external_id: row.google_place_id,
            listing: ShopListing {
                name: row.name,
                formatted_address: row.formatted_address,
                vicinity: row.vicinity,
                location: LatLng::new(row.lat, row.lng),
                rating: row.google_rating,
                ratings_total: row.ratings_total,
                price_level: row.price_level,
                types: row.types,
                photo_refs: row.photo_refs,
                opening_hours,
                website: row.website,
                formatted_phone: row.formatted_phone,
                business_status: row.business_status,
            },
            curation: Curation {
                curated_rating: row.coffeehaus_rating,
                verified: row.verified,
            },
            last_synced_at: row.last_sync,
        }
    }
}

/// Projection of the comparable columns used when diffing directory data.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SnapshotRow {
    pub id: Uuid,
    pub google_place_id: String,
    pub name: String,
    pub formatted_address: String,
    pub vicinity: String,
    pub google_rating: f32,
    pub ratings_total: i32,
    pub price_level: i16,
    pub website: String,
    pub formatted_phone: String,
    pub business_status: String,
}

impl From<SnapshotRow> for ExistingShopSnapshot {
    fn from(row: SnapshotRow) -> Self {
        ExistingShopSnapshot {
            id: row.id,
            external_id: row.google_place_id,
            name: row.name,
            formatted_address: row.formatted_address,
            vicinity: row.vicinity,
            rating: row.google_rating,
            ratings_total: row.ratings_total,
            price_level: row.price_level,
            website: row.website,
            formatted_phone: row.formatted_phone,
            business_status: row.business_status,
        }
    }
}
