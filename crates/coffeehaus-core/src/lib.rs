//! Domain types and configuration shared by every Coffeehaus crate.

mod app_config;
mod config;
pub mod intent;
pub mod shop;
pub mod sync;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use intent::{normalize_query, IntentKind, IntentLocation, SearchIntent, SearchTerms};
pub use shop::{
    Curation, LatLng, OpeningHours, Period, PlaceDetails, SearchHit, Shop, ShopListing,
    TimeOfDay,
};
pub use sync::{needs_update, ExistingShopSnapshot, SyncInput};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
