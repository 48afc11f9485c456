//! Port implementations over the Postgres store and the HTTP clients.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coffeehaus_classifier::ClassifierClient;
use coffeehaus_core::{ExistingShopSnapshot, LatLng, PlaceDetails, SearchIntent, Shop, SyncInput};
use coffeehaus_places::PlacesClient;
use sqlx::PgPool;

use crate::ports::{AdapterError, InsertOutcome, IntentClassifier, PlacesDirectory, ShopStore};

/// [`ShopStore`] backed by the `shops` table.
#[derive(Debug, Clone)]
pub struct PgShopStore {
    pool: PgPool,
}

impl PgShopStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShopStore for PgShopStore {
    async fn find_by_name(&self, name: &str) -> Result<Vec<Shop>, AdapterError> {
        let rows = coffeehaus_db::find_shops_by_name(&self.pool, name).await?;
        Ok(rows.into_iter().map(Shop::from).collect())
    }

    async fn find_within_radius(
        &self,
        center: LatLng,
        radius_m: u32,
    ) -> Result<Vec<Shop>, AdapterError> {
        let rows = coffeehaus_db::find_shops_within_radius(&self.pool, center, radius_m).await?;
        Ok(rows.into_iter().map(Shop::from).collect())
    }

    async fn find_by_external_ids(&self, ids: &[String]) -> Result<Vec<Shop>, AdapterError> {
        let rows = coffeehaus_db::find_shops_by_place_ids(&self.pool, ids).await?;
        Ok(rows.into_iter().map(Shop::from).collect())
    }

    async fn snapshots(&self, ids: &[String]) -> Result<Vec<ExistingShopSnapshot>, AdapterError> {
        let rows = coffeehaus_db::get_existing_snapshots(&self.pool, ids).await?;
        Ok(rows.into_iter().map(ExistingShopSnapshot::from).collect())
    }

    async fn insert_shops(
        &self,
        inputs: &[SyncInput],
        synced_at: DateTime<Utc>,
    ) -> Result<InsertOutcome, AdapterError> {
        let inserted = coffeehaus_db::insert_shops(&self.pool, inputs, synced_at).await?;
        Ok(split_conflicts(inputs, inserted))
    }

    async fn update_shops(
        &self,
        inputs: &[SyncInput],
        synced_at: DateTime<Utc>,
    ) -> Result<usize, AdapterError> {
        let written = coffeehaus_db::update_shops(&self.pool, inputs, synced_at).await?;
        Ok(usize::try_from(written)?)
    }
}

/// Every input id missing from `inserted` hit the uniqueness constraint.
fn split_conflicts(inputs: &[SyncInput], inserted: Vec<String>) -> InsertOutcome {
    let created: HashSet<&str> = inserted.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    let conflicted = inputs
        .iter()
        .map(|input| input.external_id.as_str())
        .filter(|id| !created.contains(id) && seen.insert(*id))
        .map(str::to_owned)
        .collect();

    InsertOutcome {
        inserted,
        conflicted,
    }
}

#[async_trait]
impl PlacesDirectory for PlacesClient {
    async fn nearby_search(
        &self,
        location: LatLng,
        radius_m: u32,
    ) -> Result<Vec<PlaceDetails>, AdapterError> {
        Ok(PlacesClient::nearby_search(self, location, radius_m).await?)
    }

    async fn name_search(
        &self,
        name: &str,
        location_context: &str,
    ) -> Result<Vec<PlaceDetails>, AdapterError> {
        Ok(PlacesClient::name_search(self, name, location_context).await?)
    }

    async fn area_search(&self, query: &str) -> Result<Vec<PlaceDetails>, AdapterError> {
        Ok(PlacesClient::area_search(self, query).await?)
    }

    async fn reverse_geocode(&self, location: LatLng) -> Result<String, AdapterError> {
        Ok(PlacesClient::reverse_geocode(self, location).await?)
    }
}

#[async_trait]
impl IntentClassifier for ClassifierClient {
    async fn classify(
        &self,
        query: &str,
        location_token: &str,
    ) -> Result<SearchIntent, AdapterError> {
        Ok(ClassifierClient::classify(self, query, location_token).await?)
    }
}
