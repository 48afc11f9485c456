//! In-process record cache.
//!
//! Two kinds of entries share one keyspace:
//!
//! - `shop:{internal id}` holds a [`Shop`] with no expiry. Every shop also has
//!   a name-index entry so name lookups do not scan full documents.
//! - `search:{normalized query}` holds a [`CachedSearchResult`] that reads as
//!   absent once its retention window has passed.
//!
//! One `RwLock` guards documents, index and search entries together, so a
//! shop document and its index entry are always written in the same critical
//! section.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use coffeehaus_core::{IntentKind, SearchHit, Shop};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

pub const SHOP_KEY_PREFIX: &str = "shop:";
pub const SEARCH_KEY_PREFIX: &str = "search:";

/// How long a search result stays readable.
pub const DEFAULT_SEARCH_RETENTION: Duration = Duration::from_secs(6 * 60 * 60);

/// Upper bound on live search results; the oldest is evicted past it.
pub const DEFAULT_MAX_SEARCH_ENTRIES: usize = 10_000;

#[must_use]
pub fn shop_key(id: Uuid) -> String {
    format!("{SHOP_KEY_PREFIX}{id}")
}

#[must_use]
pub fn search_key(normalized_query: &str) -> String {
    format!("{SEARCH_KEY_PREFIX}{normalized_query}")
}

/// A cached answer to one normalized query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedSearchResult {
    pub intent: IntentKind,
    pub normalized_query: String,
    /// The full ordered result list; pages are cut from it on read.
    pub hits: Vec<SearchHit>,
    pub cached_at: DateTime<Utc>,
}

/// Name-index entry. The rest of the listing is read from the shop document,
/// which is written under the same lock.
#[derive(Debug, Clone)]
struct IndexEntry {
    name_lower: String,
    rating: f32,
}

impl From<&Shop> for IndexEntry {
    fn from(shop: &Shop) -> Self {
        Self {
            name_lower: shop.listing.name.to_lowercase(),
            rating: shop.listing.rating,
        }
    }
}

#[derive(Debug)]
struct SearchEntry {
    result: CachedSearchResult,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct Entries {
    shops: HashMap<String, Shop>,
    name_index: HashMap<Uuid, IndexEntry>,
    searches: HashMap<String, SearchEntry>,
}

/// Shared, concurrency-safe cache of shops and search results.
#[derive(Debug)]
pub struct RecordCache {
    entries: RwLock<Entries>,
    search_retention: Duration,
    max_search_entries: usize,
}

impl Default for RecordCache {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_RETENTION)
    }
}

impl RecordCache {
    #[must_use]
    pub fn new(search_retention: Duration) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            search_retention,
            max_search_entries: DEFAULT_MAX_SEARCH_ENTRIES,
        }
    }

    /// Caps the number of stored search results. Zero is treated as one.
    #[must_use]
    pub fn with_max_search_entries(mut self, max_search_entries: usize) -> Self {
        self.max_search_entries = max_search_entries.max(1);
        self
    }

    pub async fn get_shop(&self, id: Uuid) -> Option<Shop> {
        self.entries.read().await.shops.get(&shop_key(id)).cloned()
    }

    /// Stores `shop` and refreshes its name-index entry.
    pub async fn put_shop(&self, shop: Shop) {
        let mut entries = self.entries.write().await;
        entries.name_index.insert(shop.id, IndexEntry::from(&shop));
        entries.shops.insert(shop_key(shop.id), shop);
    }

    /// Returns the cached result for `normalized_query` unless it has expired.
    pub async fn get_search_result(&self, normalized_query: &str) -> Option<CachedSearchResult> {
        let entries = self.entries.read().await;
        entries
            .searches
            .get(&search_key(normalized_query))
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.result.clone())
    }

    /// Stores `result` for the retention window. When the cache is full,
    /// expired entries are dropped first, then the oldest live one.
    pub async fn put_search_result(&self, normalized_query: &str, result: CachedSearchResult) {
        let now = Instant::now();
        let key = search_key(normalized_query);
        let entry = SearchEntry {
            result,
            expires_at: now + self.search_retention,
        };

        let mut entries = self.entries.write().await;
        if !entries.searches.contains_key(&key)
            && entries.searches.len() >= self.max_search_entries
        {
            entries.searches.retain(|_, e| now < e.expires_at);
            if entries.searches.len() >= self.max_search_entries {
                let oldest = entries
                    .searches
                    .iter()
                    .min_by_key(|(_, e)| e.expires_at)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    entries.searches.remove(&oldest);
                }
            }
        }
        entries.searches.insert(key, entry);
    }

    /// Shops whose name starts with or contains `text`, ignoring case.
    ///
    /// Prefix matches come first; within each group higher-rated shops come
    /// first, then name order.
    pub async fn find_by_name_prefix(&self, text: &str) -> Vec<Shop> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let entries = self.entries.read().await;
        let mut matches: Vec<(bool, &IndexEntry, Uuid)> = entries
            .name_index
            .iter()
            .filter(|(_, entry)| entry.name_lower.contains(&needle))
            .map(|(id, entry)| (entry.name_lower.starts_with(&needle), entry, *id))
            .collect();

        matches.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| b.1.rating.total_cmp(&a.1.rating))
                .then_with(|| a.1.name_lower.cmp(&b.1.name_lower))
        });

        matches
            .into_iter()
            .filter_map(|(_, _, id)| entries.shops.get(&shop_key(id)).cloned())
            .collect()
    }

    /// Drops expired search results. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.searches.len();
        entries.searches.retain(|_, entry| now < entry.expires_at);
        before - entries.searches.len()
    }
}
