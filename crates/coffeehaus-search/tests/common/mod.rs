//! In-memory fakes of the search ports with call recording and injectable
//! failures.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coffeehaus_core::{
    Curation, ExistingShopSnapshot, IntentKind, IntentLocation, LatLng, PlaceDetails,
    SearchIntent, SearchTerms, Shop, ShopListing, SyncInput,
};
use coffeehaus_search::{
    AdapterError, InsertOutcome, IntentClassifier, PlacesDirectory, RecordCache, Reconciler,
    SearchService, ShopStore, SyncScheduler,
};
use uuid::Uuid;

pub fn listing(name: &str, rating: f32) -> ShopListing {
    ShopListing {
        name: name.to_string(),
        formatted_address: format!("{name}, Long Beach, CA"),
        vicinity: "Long Beach".to_string(),
        location: LatLng::new(33.77, -118.19),
        rating,
        ratings_total: 120,
        price_level: 2,
        types: vec!["cafe".to_string()],
        business_status: "OPERATIONAL".to_string(),
        ..ShopListing::default()
    }
}

pub fn input(place_id: &str, name: &str, rating: f32) -> SyncInput {
    SyncInput::new(place_id, listing(name, rating))
}

pub fn place(place_id: &str, name: &str) -> PlaceDetails {
    PlaceDetails {
        place_id: place_id.to_string(),
        listing: listing(name, 4.5),
    }
}

pub fn shop(place_id: &str, name: &str, rating: f32) -> Shop {
    Shop {
        id: Uuid::new_v4(),
        external_id: place_id.to_string(),
        listing: listing(name, rating),
        curation: Curation::default(),
        last_synced_at: Utc::now(),
    }
}

pub fn intent(kind: IntentKind, normalized: &str) -> SearchIntent {
    SearchIntent {
        kind,
        normalized_query: normalized.to_string(),
        location: None,
        terms: SearchTerms::default(),
    }
}

pub fn specific_intent(shop_name: &str) -> SearchIntent {
    SearchIntent {
        kind: IntentKind::Specific,
        normalized_query: shop_name.to_lowercase(),
        location: None,
        terms: SearchTerms {
            shop: Some(shop_name.to_string()),
            filters: Vec::new(),
        },
    }
}

pub fn with_location(mut intent: SearchIntent, name: &str) -> SearchIntent {
    intent.location = Some(IntentLocation {
        name: name.to_string(),
        radius: 5000.0,
    });
    intent
}

fn injected(what: &str) -> AdapterError {
    format!("injected {what} failure").into()
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeClassifier {
    intent: Mutex<Option<SearchIntent>>,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl FakeClassifier {
    pub fn returning(intent: SearchIntent) -> Self {
        Self {
            intent: Mutex::new(Some(intent)),
            calls: Mutex::default(),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().expect("lock").clone()
    }
}

#[async_trait]
impl IntentClassifier for FakeClassifier {
    async fn classify(
        &self,
        query: &str,
        location_token: &str,
    ) -> Result<SearchIntent, AdapterError> {
        self.calls
            .lock()
            .expect("lock")
            .push((query.to_string(), location_token.to_string()));
        self.intent
            .lock()
            .expect("lock")
            .clone()
            .ok_or_else(|| injected("classifier"))
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeStore {
    shops: Mutex<HashMap<String, Shop>>,
    /// Returned by `find_within_radius` regardless of position.
    nearby: Mutex<Vec<Shop>>,
    /// Rows "another writer" creates just before our insert lands.
    racing: Mutex<Vec<SyncInput>>,

    pub fail_lookups: std::sync::atomic::AtomicBool,
    pub fail_snapshots: std::sync::atomic::AtomicBool,
    /// 1-based update call that fails.
    pub fail_update_call: Mutex<Option<usize>>,

    pub name_lookups: AtomicUsize,
    pub radius_lookups: AtomicUsize,
    pub snapshot_calls: AtomicUsize,
    pub insert_calls: Mutex<Vec<Vec<String>>>,
    pub update_calls: Mutex<Vec<Vec<String>>>,
    pub last_synced: Mutex<Option<DateTime<Utc>>>,
}

impl FakeStore {
    pub fn with_shops(shops: impl IntoIterator<Item = Shop>) -> Self {
        let store = Self::default();
        {
            let mut map = store.shops.lock().expect("lock");
            for shop in shops {
                map.insert(shop.external_id.clone(), shop);
            }
        }
        store
    }

    pub fn set_nearby(&self, shops: Vec<Shop>) {
        *self.nearby.lock().expect("lock") = shops;
    }

    pub fn race_insert(&self, input: SyncInput) {
        self.racing.lock().expect("lock").push(input);
    }

    pub fn fail_lookups(&self) {
        self.fail_lookups.store(true, Ordering::SeqCst);
    }

    pub fn fail_snapshots(&self) {
        self.fail_snapshots.store(true, Ordering::SeqCst);
    }

    pub fn fail_on_update_call(&self, call: usize) {
        *self.fail_update_call.lock().expect("lock") = Some(call);
    }

    pub fn get(&self, place_id: &str) -> Option<Shop> {
        self.shops.lock().expect("lock").get(place_id).cloned()
    }

    pub fn set_curation(&self, place_id: &str, curation: Curation) {
        if let Some(shop) = self.shops.lock().expect("lock").get_mut(place_id) {
            shop.curation = curation;
        }
    }

    pub fn row_count(&self) -> usize {
        self.shops.lock().expect("lock").len()
    }

    pub fn insert_calls(&self) -> Vec<Vec<String>> {
        self.insert_calls.lock().expect("lock").clone()
    }

    pub fn update_calls(&self) -> Vec<Vec<String>> {
        self.update_calls.lock().expect("lock").clone()
    }

    pub fn write_calls(&self) -> usize {
        self.insert_calls().len() + self.update_calls().len()
    }

    fn check(&self, flag: &std::sync::atomic::AtomicBool, what: &str) -> Result<(), AdapterError> {
        if flag.load(Ordering::SeqCst) {
            Err(injected(what))
        } else {
            Ok(())
        }
    }
}

fn create_row(input: &SyncInput, synced_at: DateTime<Utc>) -> Shop {
    Shop {
        id: Uuid::new_v4(),
        external_id: input.external_id.clone(),
        listing: input.listing.clone(),
        curation: Curation::default(),
        last_synced_at: synced_at,
    }
}

/// Mirrors the SQL update: empty or zero input keeps the stored value.
fn merge_listing(stored: &mut ShopListing, input: &ShopListing) {
    let keep_text = |old: &mut String, new: &str| {
        if !new.is_empty() {
            *old = new.to_string();
        }
    };
    keep_text(&mut stored.name, &input.name);
    keep_text(&mut stored.formatted_address, &input.formatted_address);
    keep_text(&mut stored.vicinity, &input.vicinity);
    keep_text(&mut stored.website, &input.website);
    keep_text(&mut stored.formatted_phone, &input.formatted_phone);
    keep_text(&mut stored.business_status, &input.business_status);
    if input.rating > 0.0 {
        stored.rating = input.rating;
    }
    if input.ratings_total > 0 {
        stored.ratings_total = input.ratings_total;
    }
    if input.price_level > 0 {
        stored.price_level = input.price_level;
    }
}

#[async_trait]
impl ShopStore for FakeStore {
    async fn find_by_name(&self, name: &str) -> Result<Vec<Shop>, AdapterError> {
        self.name_lookups.fetch_add(1, Ordering::SeqCst);
        self.check(&self.fail_lookups, "name lookup")?;
        let needle = name.to_lowercase();
        Ok(self
            .shops
            .lock()
            .expect("lock")
            .values()
            .filter(|s| s.listing.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn find_within_radius(
        &self,
        _center: LatLng,
        _radius_m: u32,
    ) -> Result<Vec<Shop>, AdapterError> {
        self.radius_lookups.fetch_add(1, Ordering::SeqCst);
        self.check(&self.fail_lookups, "radius lookup")?;
        Ok(self.nearby.lock().expect("lock").clone())
    }

    async fn find_by_external_ids(&self, ids: &[String]) -> Result<Vec<Shop>, AdapterError> {
        let shops = self.shops.lock().expect("lock");
        Ok(ids.iter().filter_map(|id| shops.get(id).cloned()).collect())
    }

    async fn snapshots(&self, ids: &[String]) -> Result<Vec<ExistingShopSnapshot>, AdapterError> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        self.check(&self.fail_snapshots, "snapshot")?;
        let shops = self.shops.lock().expect("lock");
        Ok(ids
            .iter()
            .filter_map(|id| shops.get(id))
            .map(ExistingShopSnapshot::from)
            .collect())
    }

    async fn insert_shops(
        &self,
        inputs: &[SyncInput],
        synced_at: DateTime<Utc>,
    ) -> Result<InsertOutcome, AdapterError> {
        self.insert_calls
            .lock()
            .expect("lock")
            .push(inputs.iter().map(|i| i.external_id.clone()).collect());
        *self.last_synced.lock().expect("lock") = Some(synced_at);

        let mut shops = self.shops.lock().expect("lock");
        for racer in self.racing.lock().expect("lock").drain(..) {
            shops.insert(racer.external_id.clone(), create_row(&racer, Utc::now()));
        }

        let mut outcome = InsertOutcome::default();
        for input in inputs {
            if shops.contains_key(&input.external_id) {
                outcome.conflicted.push(input.external_id.clone());
            } else {
                shops.insert(input.external_id.clone(), create_row(input, synced_at));
                outcome.inserted.push(input.external_id.clone());
            }
        }
        Ok(outcome)
    }

    async fn update_shops(
        &self,
        inputs: &[SyncInput],
        synced_at: DateTime<Utc>,
    ) -> Result<usize, AdapterError> {
        let call = {
            let mut calls = self.update_calls.lock().expect("lock");
            calls.push(inputs.iter().map(|i| i.external_id.clone()).collect());
            calls.len()
        };
        if *self.fail_update_call.lock().expect("lock") == Some(call) {
            return Err(injected("update"));
        }
        *self.last_synced.lock().expect("lock") = Some(synced_at);

        let mut shops = self.shops.lock().expect("lock");
        let mut written = 0;
        for input in inputs {
            if let Some(shop) = shops.get_mut(&input.external_id) {
                merge_listing(&mut shop.listing, &input.listing);
                shop.last_synced_at = synced_at;
                written += 1;
            }
        }
        Ok(written)
    }
}

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum DirectoryCall {
    Nearby { location: LatLng, radius_m: u32 },
    Name { name: String, context: String },
    Area { query: String },
    Geocode { location: LatLng },
}

#[derive(Default)]
pub struct FakeDirectory {
    places: Mutex<Vec<PlaceDetails>>,
    geocoded: Mutex<Option<String>>,
    pub fail_searches: std::sync::atomic::AtomicBool,
    delay: Mutex<Option<Duration>>,
    pub calls: Mutex<Vec<DirectoryCall>>,
}

impl FakeDirectory {
    pub fn returning(places: Vec<PlaceDetails>) -> Self {
        Self {
            places: Mutex::new(places),
            ..Self::default()
        }
    }

    pub fn geocoding_to(self, area: &str) -> Self {
        *self.geocoded.lock().expect("lock") = Some(area.to_string());
        self
    }

    pub fn failing() -> Self {
        let directory = Self::default();
        directory.fail_searches.store(true, Ordering::SeqCst);
        directory
    }

    pub fn delayed(self, delay: Duration) -> Self {
        *self.delay.lock().expect("lock") = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<DirectoryCall> {
        self.calls.lock().expect("lock").clone()
    }

    async fn search(&self, call: DirectoryCall) -> Result<Vec<PlaceDetails>, AdapterError> {
        self.calls.lock().expect("lock").push(call);
        let delay = *self.delay.lock().expect("lock");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_searches.load(Ordering::SeqCst) {
            return Err(injected("directory"));
        }
        Ok(self.places.lock().expect("lock").clone())
    }
}

#[async_trait]
impl PlacesDirectory for FakeDirectory {
    async fn nearby_search(
        &self,
        location: LatLng,
        radius_m: u32,
    ) -> Result<Vec<PlaceDetails>, AdapterError> {
        self.search(DirectoryCall::Nearby { location, radius_m }).await
    }

    async fn name_search(
        &self,
        name: &str,
        location_context: &str,
    ) -> Result<Vec<PlaceDetails>, AdapterError> {
        self.search(DirectoryCall::Name {
            name: name.to_string(),
            context: location_context.to_string(),
        })
        .await
    }

    async fn area_search(&self, query: &str) -> Result<Vec<PlaceDetails>, AdapterError> {
        self.search(DirectoryCall::Area {
            query: query.to_string(),
        })
        .await
    }

    async fn reverse_geocode(&self, location: LatLng) -> Result<String, AdapterError> {
        self.calls
            .lock()
            .expect("lock")
            .push(DirectoryCall::Geocode { location });
        self.geocoded
            .lock()
            .expect("lock")
            .clone()
            .ok_or_else(|| injected("geocode"))
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Records scheduled batches instead of running them.
#[derive(Default)]
pub struct RecordingScheduler {
    pub batches: Mutex<Vec<Vec<SyncInput>>>,
}

impl RecordingScheduler {
    pub fn batches(&self) -> Vec<Vec<SyncInput>> {
        self.batches.lock().expect("lock").clone()
    }
}

impl SyncScheduler for RecordingScheduler {
    fn schedule(&self, inputs: Vec<SyncInput>) {
        self.batches.lock().expect("lock").push(inputs);
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

pub struct Harness {
    pub classifier: Arc<FakeClassifier>,
    pub store: Arc<FakeStore>,
    pub directory: Arc<FakeDirectory>,
    pub cache: Arc<RecordCache>,
    pub scheduler: Arc<RecordingScheduler>,
    pub service: SearchService,
}

impl Harness {
    pub fn new(classifier: FakeClassifier, store: FakeStore, directory: FakeDirectory) -> Self {
        let classifier = Arc::new(classifier);
        let store = Arc::new(store);
        let directory = Arc::new(directory);
        let cache = Arc::new(RecordCache::default());
        let scheduler = Arc::new(RecordingScheduler::default());
        let service = SearchService::new(
            classifier.clone(),
            store.clone(),
            directory.clone(),
            cache.clone(),
            scheduler.clone(),
        );
        Self {
            classifier,
            store,
            directory,
            cache,
            scheduler,
            service,
        }
    }
}

pub fn reconciler(store: &Arc<FakeStore>, chunk_size: usize) -> (Reconciler, Arc<RecordCache>) {
    let cache = Arc::new(RecordCache::default());
    let reconciler = Reconciler::new(store.clone(), cache.clone(), chunk_size);
    (reconciler, cache)
}
