mod api;
mod middleware;
mod scheduler;

use std::{sync::Arc, time::Duration};

use coffeehaus_classifier::ClassifierClient;
use coffeehaus_places::PlacesClient;
use coffeehaus_search::{DetachedSync, PgShopStore, RecordCache, Reconciler, SearchService};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(coffeehaus_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = coffeehaus_db::PoolConfig::from_app_config(&config);
    let pool = coffeehaus_db::connect_pool(&config.database_url, pool_config).await?;
    coffeehaus_db::run_migrations(&pool).await?;

    let cache = Arc::new(RecordCache::new(Duration::from_secs(
        config.search_cache_ttl_secs,
    )));
    let store = Arc::new(PgShopStore::new(pool.clone()));
    let places = Arc::new(PlacesClient::new(
        &config.google_maps_api_key,
        config.places_timeout_secs,
        config.places_max_results,
        config.places_max_retries,
    )?);
    let classifier = Arc::new(ClassifierClient::new(
        &config.claude_api_key,
        &config.classifier_model,
        config.classifier_timeout_secs,
    )?);

    let reconciler = Arc::new(Reconciler::new(
        store.clone(),
        Arc::clone(&cache),
        config.sync_update_chunk_size,
    ));
    let sync = Arc::new(DetachedSync::new(reconciler));
    let search = SearchService::new(classifier, store, places, Arc::clone(&cache), sync.clone())
        .with_directory_timeout(Duration::from_secs(config.directory_timeout_secs));

    let _scheduler = scheduler::build_scheduler(Arc::clone(&cache)).await?;

    let auth = AuthState::from_env(matches!(
        config.env,
        coffeehaus_core::Environment::Development
    ))?;
    let state = AppState {
        pool,
        search: Arc::new(search),
    };
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(in_flight = sync.in_flight(), "waiting for background syncs");
    sync.drain().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
