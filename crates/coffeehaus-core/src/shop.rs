//! Shop entity and its directory-sourced / local-only halves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sync::SyncInput;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when both coordinates carry information.
    ///
    /// A zero latitude or longitude is treated as "not supplied", matching how
    /// clients omit the query parameters.
    #[must_use]
    pub fn is_known(&self) -> bool {
        self.lat != 0.0 && self.lng != 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOfDay {
    /// 0 = Sunday.
    pub day: u8,
    /// `HHMM`, e.g. `"0900"`.
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub open: TimeOfDay,
    /// Absent for places open around the clock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close: Option<TimeOfDay>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningHours {
    #[serde(default)]
    pub weekday_text: Vec<String>,
    #[serde(default)]
    pub periods: Vec<Period>,
}

/// Every attribute of a shop that originates from the places directory.
///
/// Zero and empty values mean "unknown" rather than "cleared".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopListing {
    pub name: String,
    pub formatted_address: String,
    pub vicinity: String,
    pub location: LatLng,
    pub rating: f32,
    pub ratings_total: i32,
    pub price_level: i16,
    pub types: Vec<String>,
    pub photo_refs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<OpeningHours>,
    pub website: String,
    pub formatted_phone: String,
    pub business_status: String,
}

impl ShopListing {
    /// Drops repeated category tags while keeping first-seen order.
    #[must_use]
    pub fn with_unique_types(mut self) -> Self {
        let mut seen = std::collections::HashSet::with_capacity(self.types.len());
        self.types.retain(|t| seen.insert(t.clone()));
        self
    }
}

/// Attributes curated locally. Reconciliation has no path to write these.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Curation {
    pub curated_rating: Option<f32>,
    pub verified: bool,
}

/// A shop row as persisted in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    pub id: Uuid,
    pub external_id: String,
    pub listing: ShopListing,
    pub curation: Curation,
    pub last_synced_at: DateTime<Utc>,
}

/// One place as returned by the directory, already expanded with details.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceDetails {
    pub place_id: String,
    pub listing: ShopListing,
}

impl PlaceDetails {
    #[must_use]
    pub fn to_sync_input(&self) -> SyncInput {
        SyncInput::new(self.place_id.clone(), self.listing.clone())
    }

    #[must_use]
    pub fn to_search_hit(&self) -> SearchHit {
        SearchHit::from_listing(self.place_id.clone(), self.listing.clone())
    }
}

/// One entry of a search response.
///
/// Store and cache hits carry the internal id and curation; fresh directory
/// hits have neither until reconciliation has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub place_id: String,
    #[serde(flatten)]
    pub listing: ShopListing,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curation: Option<Curation>,
}

impl SearchHit {
    /// A hit fetched straight from the directory.
    #[must_use]
    pub fn from_listing(place_id: impl Into<String>, listing: ShopListing) -> Self {
        Self {
            id: None,
            place_id: place_id.into(),
            listing,
            curation: None,
        }
    }
}

impl From<&Shop> for SearchHit {
    fn from(shop: &Shop) -> Self {
        Self {
            id: Some(shop.id),
            place_id: shop.external_id.clone(),
            listing: shop.listing.clone(),
            curation: Some(shop.curation),
        }
    }
}
