//! Collaborator interfaces the search core depends on.
//!
//! Production implementations live in [`crate::adapters`]; tests supply
//! in-memory fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coffeehaus_core::{ExistingShopSnapshot, LatLng, PlaceDetails, SearchIntent, Shop, SyncInput};

/// Error type crossing a port boundary. Adapters box their own error enums.
pub type AdapterError = Box<dyn std::error::Error + Send + Sync>;

/// Turns a free-text query into a structured intent.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// `location_token` is `"lat,lng"` or `"unknown"`.
    async fn classify(&self, query: &str, location_token: &str)
        -> Result<SearchIntent, AdapterError>;
}

/// Result of a batched create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertOutcome {
    /// External ids of rows this call created.
    pub inserted: Vec<String>,
    /// External ids that already existed when the write landed.
    pub conflicted: Vec<String>,
}

/// The persistent shop store.
#[async_trait]
pub trait ShopStore: Send + Sync {
    /// Case-insensitive substring match on the shop name.
    async fn find_by_name(&self, name: &str) -> Result<Vec<Shop>, AdapterError>;

    /// Shops within `radius_m` of `center`, nearest first.
    async fn find_within_radius(
        &self,
        center: LatLng,
        radius_m: u32,
    ) -> Result<Vec<Shop>, AdapterError>;

    async fn find_by_external_ids(&self, ids: &[String]) -> Result<Vec<Shop>, AdapterError>;

    /// Comparable projections of the stored rows for `ids`, in one round trip.
    async fn snapshots(&self, ids: &[String]) -> Result<Vec<ExistingShopSnapshot>, AdapterError>;

    /// Creates every input in one batched write. Uniqueness conflicts on the
    /// external id are reported in the outcome, not raised.
    async fn insert_shops(
        &self,
        inputs: &[SyncInput],
        synced_at: DateTime<Utc>,
    ) -> Result<InsertOutcome, AdapterError>;

    /// Applies directory-sourced fields and `last_sync` to existing rows.
    /// Returns the number of rows written.
    async fn update_shops(
        &self,
        inputs: &[SyncInput],
        synced_at: DateTime<Utc>,
    ) -> Result<usize, AdapterError>;
}

/// The external places directory.
#[async_trait]
pub trait PlacesDirectory: Send + Sync {
    async fn nearby_search(
        &self,
        location: LatLng,
        radius_m: u32,
    ) -> Result<Vec<PlaceDetails>, AdapterError>;

    async fn name_search(
        &self,
        name: &str,
        location_context: &str,
    ) -> Result<Vec<PlaceDetails>, AdapterError>;

    async fn area_search(&self, query: &str) -> Result<Vec<PlaceDetails>, AdapterError>;

    /// Human-readable area label for `location`, e.g. `"Long Beach, CA"`.
    async fn reverse_geocode(&self, location: LatLng) -> Result<String, AdapterError>;
}
