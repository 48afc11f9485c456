//! Search orchestration, reconciliation and the in-process record cache.
//!
//! [`SearchService`] answers a query from the cache, the local store or the
//! places directory, in that order of preference. Directory results are
//! handed to a [`SyncScheduler`] which reconciles them into the store on a
//! detached task, so later searches are served locally.

pub mod adapters;
pub mod cache;
pub mod error;
pub mod orchestrator;
pub mod ports;
pub mod reconcile;
pub mod scheduler;

pub use adapters::PgShopStore;
pub use cache::{
    CachedSearchResult, RecordCache, DEFAULT_MAX_SEARCH_ENTRIES, DEFAULT_SEARCH_RETENTION,
};
pub use error::{ReconcileError, SearchError, WriteStage};
pub use orchestrator::{SearchRequest, SearchResponse, SearchService};
pub use ports::{AdapterError, InsertOutcome, IntentClassifier, PlacesDirectory, ShopStore};
pub use reconcile::{ReconcileReport, Reconciler, SyncOutcome, DEFAULT_UPDATE_CHUNK_SIZE};
pub use scheduler::{DetachedSync, SyncScheduler};
