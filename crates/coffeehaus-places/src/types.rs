//! Google Places / Geocoding response types.
//!
//! Every endpoint answers with `{"status": "...", ...}`; the payload field
//! differs per endpoint (`results`, `result`, `predictions`).

use coffeehaus_core::{LatLng, OpeningHours, Period, PlaceDetails, ShopListing, TimeOfDay};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Search endpoints (nearbysearch, textsearch)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<PlaceSummary>,
}

/// The subset of a search hit needed to request its details.
#[derive(Debug, Deserialize)]
pub struct PlaceSummary {
    pub place_id: String,
    #[serde(default)]
    pub name: String,
}

// ---------------------------------------------------------------------------
// place/autocomplete
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AutocompleteResponse {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub description: String,
    pub structured_formatting: Option<StructuredFormatting>,
}

#[derive(Debug, Deserialize)]
pub struct StructuredFormatting {
    pub main_text: String,
}

// ---------------------------------------------------------------------------
// place/details
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct DetailsResponse {
    pub result: PlaceResult,
}

#[derive(Debug, Deserialize)]
pub struct PlaceResult {
    pub place_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub formatted_address: String,
    #[serde(default)]
    pub vicinity: String,
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub user_ratings_total: Option<i32>,
    #[serde(default)]
    pub price_level: Option<i16>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub photos: Vec<Photo>,
    pub opening_hours: Option<WireOpeningHours>,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub formatted_phone_number: String,
    #[serde(default)]
    pub international_phone_number: String,
    #[serde(default)]
    pub business_status: String,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    pub location: WireLatLng,
}

#[derive(Debug, Deserialize)]
pub struct WireLatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub struct Photo {
    pub photo_reference: String,
}

#[derive(Debug, Deserialize)]
pub struct WireOpeningHours {
    #[serde(default)]
    pub weekday_text: Vec<String>,
    #[serde(default)]
    pub periods: Vec<WirePeriod>,
}

#[derive(Debug, Deserialize)]
pub struct WirePeriod {
    pub open: WireTimeOfDay,
    pub close: Option<WireTimeOfDay>,
}

#[derive(Debug, Deserialize)]
pub struct WireTimeOfDay {
    pub day: u8,
    pub time: String,
}

impl From<WireTimeOfDay> for TimeOfDay {
    fn from(t: WireTimeOfDay) -> Self {
        TimeOfDay {
            day: t.day,
            time: t.time,
        }
    }
}

impl From<PlaceResult> for PlaceDetails {
    fn from(p: PlaceResult) -> Self {
        let formatted_phone = if p.formatted_phone_number.is_empty() {
            p.international_phone_number
        } else {
            p.formatted_phone_number
        };

        let listing = ShopListing {
            name: p.name,
            formatted_address: p.formatted_address,
            vicinity: p.vicinity,
            location: p
                .geometry
                .map(|g| LatLng::new(g.location.lat, g.location.lng))
                .unwrap_or_default(),
            rating: p.rating.unwrap_or(0.0),
            ratings_total: p.user_ratings_total.unwrap_or(0),
            price_level: p.price_level.unwrap_or(0),
            types: p.types,
            photo_refs: p.photos.into_iter().map(|ph| ph.photo_reference).collect(),
            opening_hours: p.opening_hours.map(|h| OpeningHours {
                weekday_text: h.weekday_text,
                periods: h
                    .periods
                    .into_iter()
                    .map(|period| Period {
                        open: period.open.into(),
                        close: period.close.map(Into::into),
                    })
                    .collect(),
            }),
            website: p.website,
            formatted_phone,
            business_status: p.business_status,
        }
        .with_unique_types();

        PlaceDetails {
            place_id: p.place_id,
            listing,
        }
    }
}

// ---------------------------------------------------------------------------
// geocode (reverse)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeResult {
    #[serde(default)]
    pub formatted_address: String,
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    pub short_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

impl GeocodeResult {
    /// `"{locality}, {state}"` when both components are present, otherwise
    /// the formatted address.
    #[must_use]
    pub fn area_label(&self) -> String {
        let find = |kind: &str| {
            self.address_components
                .iter()
                .find(|c| c.types.iter().any(|t| t == kind))
        };

        match (find("locality"), find("administrative_area_level_1")) {
            (Some(city), Some(state)) => format!("{}, {}", city.long_name, state.short_name),
            _ => self.formatted_address.clone(),
        }
    }
}
