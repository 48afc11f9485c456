//! Top-level search entry point.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use coffeehaus_core::{
    normalize_query, IntentKind, LatLng, PlaceDetails, SearchHit, SearchIntent, Shop, SyncInput,
};
use serde::Serialize;

use crate::cache::{CachedSearchResult, RecordCache};
use crate::error::SearchError;
use crate::ports::{AdapterError, IntentClassifier, PlacesDirectory, ShopStore};
use crate::scheduler::SyncScheduler;

pub const DEFAULT_LIMIT: usize = 10;
pub const DEFAULT_RADIUS_M: u32 = 10_000;
pub const DEFAULT_DIRECTORY_TIMEOUT: Duration = Duration::from_secs(30);

const UNKNOWN_LOCATION: &str = "unknown";

/// One search call. Zero coordinates mean "no location".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub location: LatLng,
    pub radius_m: Option<u32>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl SearchRequest {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub shops: Vec<SearchHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Where a result list came from.
enum Found {
    Cached(Vec<Shop>),
    Stored(Vec<Shop>),
    Fetched(Vec<PlaceDetails>),
}

/// Answers queries from the record cache, the store or the directory.
///
/// The store is always consulted before the directory for specific and
/// proximity intents. Directory results are returned at once and handed to
/// the [`SyncScheduler`]; `search` never waits for reconciliation.
pub struct SearchService {
    classifier: Arc<dyn IntentClassifier>,
    store: Arc<dyn ShopStore>,
    directory: Arc<dyn PlacesDirectory>,
    cache: Arc<RecordCache>,
    scheduler: Arc<dyn SyncScheduler>,
    directory_timeout: Duration,
}

impl SearchService {
    #[must_use]
    pub fn new(
        classifier: Arc<dyn IntentClassifier>,
        store: Arc<dyn ShopStore>,
        directory: Arc<dyn PlacesDirectory>,
        cache: Arc<RecordCache>,
        scheduler: Arc<dyn SyncScheduler>,
    ) -> Self {
        Self {
            classifier,
            store,
            directory,
            cache,
            scheduler,
            directory_timeout: DEFAULT_DIRECTORY_TIMEOUT,
        }
    }

    /// Bounds every directory call, including reverse geocoding.
    #[must_use]
    pub fn with_directory_timeout(mut self, timeout: Duration) -> Self {
        self.directory_timeout = timeout;
        self
    }

    /// Runs one search.
    ///
    /// # Errors
    ///
    /// - [`SearchError::Classification`] if the classifier fails.
    /// - [`SearchError::Lookup`] if the directory call fails or times out.
    ///   Store failures are logged and never returned.
    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse, SearchError> {
        let limit = request.limit.filter(|&l| l > 0).unwrap_or(DEFAULT_LIMIT);
        let radius_m = request.radius_m.filter(|&r| r > 0).unwrap_or(DEFAULT_RADIUS_M);

        let token = location_token(request.location);
        let intent = self
            .classifier
            .classify(&request.query, &token)
            .await
            .map_err(SearchError::Classification)?;

        let key = cache_key(&intent, &request.query, request.location, radius_m);
        if let Some(cached) = self.cache.get_search_result(&key).await {
            tracing::debug!(key = %key, hits = cached.hits.len(), "search cache hit");
            return Ok(paginate(cached.hits, request.offset, limit));
        }

        let found = match intent.kind {
            IntentKind::Specific => self.specific(&request, &intent).await?,
            IntentKind::Area => self.area(&request, &intent).await?,
            IntentKind::Proximity => self.proximity(&request, radius_m).await?,
        };

        let hits = match found {
            Found::Cached(shops) => shops.iter().map(SearchHit::from).collect(),
            Found::Stored(shops) => {
                let hits: Vec<SearchHit> = shops.iter().map(SearchHit::from).collect();
                for shop in shops {
                    self.cache.put_shop(shop).await;
                }
                hits
            }
            Found::Fetched(places) => {
                let hits: Vec<SearchHit> = places.iter().map(PlaceDetails::to_search_hit).collect();
                if !places.is_empty() {
                    let inputs: Vec<SyncInput> =
                        places.iter().map(PlaceDetails::to_sync_input).collect();
                    self.scheduler.schedule(inputs);
                }
                hits
            }
        };

        tracing::info!(
            kind = %intent.kind,
            key = %key,
            hits = hits.len(),
            "search answered"
        );

        if !hits.is_empty() {
            let result = CachedSearchResult {
                intent: intent.kind,
                normalized_query: key.clone(),
                hits: hits.clone(),
                cached_at: Utc::now(),
            };
            self.cache.put_search_result(&key, result).await;
        }

        Ok(paginate(hits, request.offset, limit))
    }

    async fn specific(
        &self,
        request: &SearchRequest,
        intent: &SearchIntent,
    ) -> Result<Found, SearchError> {
        let name = intent.shop_name(&request.query);

        // The name index only holds shops seen by this process, so it is
        // consulted only when the store cannot answer.
        match self.store.find_by_name(name).await {
            Ok(stored) if !stored.is_empty() => return Ok(Found::Stored(stored)),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    operation = "find_by_name",
                    error = %e,
                    "store lookup failed; trying record cache"
                );
                let cached = self.cache.find_by_name_prefix(name).await;
                if !cached.is_empty() {
                    return Ok(Found::Cached(cached));
                }
            }
        }

        let context = self.location_context(request.location, intent).await;
        let places = self
            .directory_call(
                "name_search",
                format!("name={:?}, context={context:?}", request.query),
                self.directory.name_search(&request.query, &context),
            )
            .await?;
        Ok(Found::Fetched(places))
    }

    async fn area(&self, request: &SearchRequest, intent: &SearchIntent) -> Result<Found, SearchError> {
        let query = Some(intent.normalized_query.trim())
            .filter(|q| !q.is_empty())
            .unwrap_or(request.query.as_str());

        let places = self
            .directory_call(
                "area_search",
                format!("query={query:?}"),
                self.directory.area_search(query),
            )
            .await?;
        Ok(Found::Fetched(places))
    }

    async fn proximity(&self, request: &SearchRequest, radius_m: u32) -> Result<Found, SearchError> {
        let location = request.location;

        let stored = self
            .store_lookup(
                "find_within_radius",
                self.store.find_within_radius(location, radius_m),
            )
            .await;
        if !stored.is_empty() {
            return Ok(Found::Stored(stored));
        }

        let places = self
            .directory_call(
                "nearby_search",
                format!("location={},{}, radius={radius_m}", location.lat, location.lng),
                self.directory.nearby_search(location, radius_m),
            )
            .await?;
        Ok(Found::Fetched(places))
    }

    /// Reverse-geocoded caller position, else the classifier's location name,
    /// else empty.
    async fn location_context(&self, location: LatLng, intent: &SearchIntent) -> String {
        if location.is_known() {
            let geocoded = self
                .directory_call(
                    "reverse_geocode",
                    format!("location={},{}", location.lat, location.lng),
                    self.directory.reverse_geocode(location),
                )
                .await;
            match geocoded {
                Ok(area) if !area.trim().is_empty() => return area,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "reverse geocode failed; using classifier location");
                }
            }
        }
        intent.location_name().unwrap_or_default().to_owned()
    }

    /// A failed store lookup reads as "no rows" so the directory can answer.
    async fn store_lookup(
        &self,
        operation: &'static str,
        lookup: impl Future<Output = Result<Vec<Shop>, AdapterError>>,
    ) -> Vec<Shop> {
        match lookup.await {
            Ok(shops) => shops,
            Err(e) => {
                tracing::warn!(operation, error = %e, "store lookup failed; falling back to directory");
                Vec::new()
            }
        }
    }

    async fn directory_call<T>(
        &self,
        operation: &'static str,
        key: String,
        call: impl Future<Output = Result<T, AdapterError>>,
    ) -> Result<T, SearchError> {
        match tokio::time::timeout(self.directory_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(SearchError::Lookup {
                operation,
                key,
                source,
            }),
            Err(elapsed) => Err(SearchError::Lookup {
                operation,
                key,
                source: Box::new(elapsed),
            }),
        }
    }
}

/// `"lat,lng"` with six decimals, or `"unknown"` unless both are non-zero.
fn location_token(location: LatLng) -> String {
    if location.is_known() {
        format!("{:.6},{:.6}", location.lat, location.lng)
    } else {
        UNKNOWN_LOCATION.to_string()
    }
}

/// Normalized query, plus the rounded position and radius when the caller
/// supplied coordinates.
fn cache_key(intent: &SearchIntent, raw_query: &str, location: LatLng, radius_m: u32) -> String {
    let mut normalized = normalize_query(&intent.normalized_query);
    if normalized.is_empty() {
        normalized = normalize_query(raw_query);
    }
    if location.is_known() {
        format!(
            "{normalized}@{:.3},{:.3}/{radius_m}",
            location.lat, location.lng
        )
    } else {
        normalized
    }
}

fn paginate(hits: Vec<SearchHit>, offset: usize, limit: usize) -> SearchResponse {
    let total = hits.len();
    let end = offset.saturating_add(limit);
    let next_page_token = (end < total).then(|| end.to_string());
    let shops = hits.into_iter().skip(offset).take(limit).collect();

    SearchResponse {
        shops,
        next_page_token,
    }
}
