//! Write model for reconciliation and the snapshot it is diffed against.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shop::{Shop, ShopListing};

/// Directory data for one shop, keyed only by its external id.
///
/// Carries no curation field, so reconciliation cannot
/// express a write to `coffeehaus_rating` or `verified`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncInput {
    pub external_id: String,
    pub listing: ShopListing,
}

impl SyncInput {
    #[must_use]
    pub fn new(external_id: impl Into<String>, listing: ShopListing) -> Self {
        Self {
            external_id: external_id.into(),
            listing,
        }
    }
}

/// Comparable columns of a stored shop, read in bulk before diffing.
#[derive(Debug, Clone, PartialEq)]
pub struct ExistingShopSnapshot {
    pub id: Uuid,
    pub external_id: String,
    pub name: String,
    pub formatted_address: String,
    pub vicinity: String,
    pub rating: f32,
    pub ratings_total: i32,
    pub price_level: i16,
    pub website: String,
    pub formatted_phone: String,
    pub business_status: String,
}

impl From<&Shop> for ExistingShopSnapshot {
    fn from(shop: &Shop) -> Self {
        let l = &shop.listing;
        Self {
            id: shop.id,
            external_id: shop.external_id.clone(),
            name: l.name.clone(),
            formatted_address: l.formatted_address.clone(),
            vicinity: l.vicinity.clone(),
            rating: l.rating,
            ratings_total: l.ratings_total,
            price_level: l.price_level,
            website: l.website.clone(),
            formatted_phone: l.formatted_phone.clone(),
            business_status: l.business_status.clone(),
        }
    }
}

/// Returns `true` when any informative field of `input` differs from the
/// stored snapshot.
///
/// Empty strings and zero numbers on the input side carry no information and
/// never trigger an update.
#[must_use]
pub fn needs_update(snapshot: &ExistingShopSnapshot, input: &SyncInput) -> bool {
    let l = &input.listing;

    let text_differs = |new: &str, old: &str| !new.is_empty() && new != old;

    text_differs(&l.name, &snapshot.name)
        || text_differs(&l.formatted_address, &snapshot.formatted_address)
        || text_differs(&l.vicinity, &snapshot.vicinity)
        || (l.rating > 0.0 && l.rating.to_bits() != snapshot.rating.to_bits())
        || (l.ratings_total > 0 && l.ratings_total != snapshot.ratings_total)
        || (l.price_level > 0 && l.price_level != snapshot.price_level)
        || text_differs(&l.website, &snapshot.website)
        || text_differs(&l.formatted_phone, &snapshot.formatted_phone)
        || text_differs(&l.business_status, &snapshot.business_status)
}
