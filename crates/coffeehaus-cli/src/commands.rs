//! Command handlers for the CLI.
//!
//! Each handler builds the same component graph the server runs, against
//! the configured database and upstream services.

use std::{sync::Arc, time::Duration};

use coffeehaus_classifier::ClassifierClient;
use coffeehaus_core::{AppConfig, LatLng};
use coffeehaus_places::PlacesClient;
use coffeehaus_search::{
    DetachedSync, PgShopStore, RecordCache, Reconciler, SearchRequest, SearchService,
};

fn places_client(config: &AppConfig) -> anyhow::Result<PlacesClient> {
    PlacesClient::new(
        &config.google_maps_api_key,
        config.places_timeout_secs,
        config.places_max_results,
        config.places_max_retries,
    )
    .map_err(|e| anyhow::anyhow!("failed to build places client: {e}"))
}

fn reconciler(pool: &sqlx::PgPool, config: &AppConfig, cache: Arc<RecordCache>) -> Reconciler {
    Reconciler::new(
        Arc::new(PgShopStore::new(pool.clone())),
        cache,
        config.sync_update_chunk_size,
    )
}

/// Missing coordinates become zero, which the pipeline reads as "no location".
pub(crate) fn search_request(
    query: String,
    lat: Option<f64>,
    lng: Option<f64>,
    radius_m: Option<u32>,
    limit: Option<usize>,
    offset: usize,
) -> SearchRequest {
    SearchRequest {
        query,
        location: LatLng::new(lat.unwrap_or(0.0), lng.unwrap_or(0.0)),
        radius_m,
        limit,
        offset,
    }
}

/// Run one search and print the response. Any background sync the search
/// schedules is awaited before returning so the process does not exit
/// mid-write.
///
/// # Errors
///
/// Returns an error if a client cannot be constructed or the search fails.
pub(crate) async fn run_search(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    request: SearchRequest,
) -> anyhow::Result<()> {
    let cache = Arc::new(RecordCache::new(Duration::from_secs(
        config.search_cache_ttl_secs,
    )));
    let classifier = ClassifierClient::new(
        &config.claude_api_key,
        &config.classifier_model,
        config.classifier_timeout_secs,
    )
    .map_err(|e| anyhow::anyhow!("failed to build classifier client: {e}"))?;

    let sync = Arc::new(DetachedSync::new(Arc::new(reconciler(
        pool,
        config,
        Arc::clone(&cache),
    ))));
    let service = SearchService::new(
        Arc::new(classifier),
        Arc::new(PgShopStore::new(pool.clone())),
        Arc::new(places_client(config)?),
        cache,
        sync.clone(),
    )
    .with_directory_timeout(Duration::from_secs(config.directory_timeout_secs));

    let response = service.search(request).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    if sync.in_flight() > 0 {
        tracing::info!(in_flight = sync.in_flight(), "waiting for background sync");
    }
    sync.drain().await;
    Ok(())
}

/// Fetch full details for one place and reconcile them into the store.
///
/// # Errors
///
/// Returns an error if the details lookup or the reconciliation fails.
pub(crate) async fn run_sync_place(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    place_id: &str,
) -> anyhow::Result<()> {
    let client = places_client(config)?;
    let details = client.place_details(place_id).await?;

    let reconciler = reconciler(pool, config, Arc::new(RecordCache::default()));
    let outcome = reconciler.sync_one(details.to_sync_input()).await?;

    println!("{place_id} ({}): {outcome}", details.listing.name);
    Ok(())
}
