use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub google_maps_api_key: String,
    pub claude_api_key: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub places_timeout_secs: u64,
    pub places_max_results: usize,
    pub places_max_retries: u32,
    pub classifier_model: String,
    pub classifier_timeout_secs: u64,
    /// Upper bound on a single directory lookup made by the search orchestrator.
    pub directory_timeout_secs: u64,
    /// Retention window for cached search results.
    pub search_cache_ttl_secs: u64,
    pub sync_update_chunk_size: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("google_maps_api_key", &"[redacted]")
            .field("claude_api_key", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("places_timeout_secs", &self.places_timeout_secs)
            .field("places_max_results", &self.places_max_results)
            .field("places_max_retries", &self.places_max_retries)
            .field("classifier_model", &self.classifier_model)
            .field("classifier_timeout_secs", &self.classifier_timeout_secs)
            .field("directory_timeout_secs", &self.directory_timeout_secs)
            .field("search_cache_ttl_secs", &self.search_cache_ttl_secs)
            .field("sync_update_chunk_size", &self.sync_update_chunk_size)
            .finish()
    }
}
