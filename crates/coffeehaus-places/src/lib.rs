//! Client for the Google Places / Geocoding web services.
//!
//! Every search is expanded to full place details so callers receive
//! [`coffeehaus_core::PlaceDetails`] ready to be shown or reconciled.

mod client;
pub mod error;
mod retry;
pub mod types;

pub use client::PlacesClient;
pub use error::PlacesError;
