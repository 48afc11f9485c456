//! HTTP client for the places directory.
//!
//! Wraps `reqwest` with Google-style envelope handling: `OK` yields data,
//! `ZERO_RESULTS` yields an empty list, any other status surfaces as
//! [`PlacesError::Api`]. Transient failures are retried with back-off.

use std::time::Duration;

use coffeehaus_core::{LatLng, PlaceDetails};
use futures::stream::{self, StreamExt};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::PlacesError;
use crate::retry::retry_with_backoff;
use crate::types::{
    AutocompleteResponse, DetailsResponse, GeocodeResponse, PlaceSummary, SearchResponse,
};

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/";
const DEFAULT_BACKOFF_BASE_MS: u64 = 250;
/// Place Details requests kept in flight per search.
const DETAILS_CONCURRENCY: usize = 4;
const DETAILS_FIELDS: &str = "place_id,name,formatted_address,vicinity,geometry/location,\
     rating,user_ratings_total,price_level,type,photo,opening_hours,website,\
     formatted_phone_number,international_phone_number,business_status";

const NEARBY_PATH: &str = "maps/api/place/nearbysearch/json";
const TEXT_SEARCH_PATH: &str = "maps/api/place/textsearch/json";
const AUTOCOMPLETE_PATH: &str = "maps/api/place/autocomplete/json";
const DETAILS_PATH: &str = "maps/api/place/details/json";
const GEOCODE_PATH: &str = "maps/api/geocode/json";

/// Client for the Places and Geocoding web services.
///
/// Use [`PlacesClient::new`] for production or [`PlacesClient::with_base_url`]
/// to point at a mock server in tests.
pub struct PlacesClient {
    client: Client,
    api_key: String,
    base_url: Url,
    max_results: usize,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl PlacesClient {
    /// Creates a new client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        api_key: &str,
        timeout_secs: u64,
        max_results: usize,
        max_retries: u32,
    ) -> Result<Self, PlacesError> {
        Self::with_base_url(api_key, timeout_secs, max_results, max_retries, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`PlacesError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        max_results: usize,
        max_retries: u32,
        base_url: &str,
    ) -> Result<Self, PlacesError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("coffeehaus/0.1 (shop-search)")
            .build()?;

        // Exactly one trailing slash so `Url::join` appends endpoint paths
        // instead of replacing the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| PlacesError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url: parsed,
            max_results,
            max_retries,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    /// Overrides the retry back-off base delay. Tests use `0`.
    #[must_use]
    pub fn with_backoff_base_ms(mut self, backoff_base_ms: u64) -> Self {
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Coffee shops around `location` within `radius_m` meters.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError`] if the search request fails. Individual detail
    /// lookups that fail are logged and skipped.
    pub async fn nearby_search(
        &self,
        location: LatLng,
        radius_m: u32,
    ) -> Result<Vec<PlaceDetails>, PlacesError> {
        let location_param = format!("{},{}", location.lat, location.lng);
        let radius_param = radius_m.to_string();
        let url = self.build_url(
            NEARBY_PATH,
            &[
                ("location", location_param.as_str()),
                ("radius", radius_param.as_str()),
                ("type", "cafe"),
                ("keyword", "coffee shop"),
            ],
        )?;

        let found: Option<SearchResponse> = self
            .get_envelope(&url, &format!("nearbysearch({location_param})"))
            .await?;
        let summaries = found.map(|r| r.results).unwrap_or_default();
        Ok(self.expand_details(summaries).await)
    }

    /// Locations of the shop called `name`, searched within `location_context`.
    ///
    /// The name is first run through autocomplete to correct typos; only
    /// text-search hits whose name contains the corrected name
    /// (case-insensitive) are kept.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError`] if the autocomplete or text search request fails.
    pub async fn name_search(
        &self,
        name: &str,
        location_context: &str,
    ) -> Result<Vec<PlaceDetails>, PlacesError> {
        let corrected = self.correct_shop_name(name, location_context).await?;

        let query = if location_context.trim().is_empty() {
            corrected.clone()
        } else {
            format!("{corrected} in {}", location_context.trim())
        };
        let url = self.build_url(TEXT_SEARCH_PATH, &[("query", query.as_str())])?;

        let found: Option<SearchResponse> = self
            .get_envelope(&url, &format!("textsearch(query={query})"))
            .await?;

        let needle = corrected.to_lowercase();
        let summaries: Vec<PlaceSummary> = found
            .map(|r| r.results)
            .unwrap_or_default()
            .into_iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .collect();

        tracing::debug!(
            name,
            corrected = %corrected,
            matches = summaries.len(),
            "places name search"
        );
        Ok(self.expand_details(summaries).await)
    }

    /// Cafes matching a free-text area query such as `"coffee in silver lake"`.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError`] if the text search request fails.
    pub async fn area_search(&self, query: &str) -> Result<Vec<PlaceDetails>, PlacesError> {
        let url = self.build_url(TEXT_SEARCH_PATH, &[("query", query), ("type", "cafe")])?;
        let found: Option<SearchResponse> = self
            .get_envelope(&url, &format!("textsearch(query={query})"))
            .await?;
        let summaries = found.map(|r| r.results).unwrap_or_default();
        Ok(self.expand_details(summaries).await)
    }

    /// Human-readable area for a coordinate, e.g. `"Long Beach, CA"`.
    ///
    /// Returns an empty string when the geocoder knows nothing about the point.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError`] if the geocode request fails.
    pub async fn reverse_geocode(&self, location: LatLng) -> Result<String, PlacesError> {
        let latlng = format!("{},{}", location.lat, location.lng);
        let url = self.build_url(GEOCODE_PATH, &[("latlng", latlng.as_str())])?;
        let found: Option<GeocodeResponse> = self
            .get_envelope(&url, &format!("geocode(latlng={latlng})"))
            .await?;

        Ok(found
            .and_then(|r| r.results.into_iter().next())
            .map(|first| first.area_label())
            .unwrap_or_default())
    }

    /// Full details for one place.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError::Api`] with status `NOT_FOUND` when the place is
    /// unknown, or any other [`PlacesError`] if the request fails.
    pub async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, PlacesError> {
        let url = self.build_url(
            DETAILS_PATH,
            &[("place_id", place_id), ("fields", DETAILS_FIELDS)],
        )?;
        let found: Option<DetailsResponse> = self
            .get_envelope(&url, &format!("details(place_id={place_id})"))
            .await?;

        found
            .map(|d| PlaceDetails::from(d.result))
            .ok_or_else(|| PlacesError::Api {
                status: "NOT_FOUND".to_owned(),
                message: format!("no details for place {place_id}"),
            })
    }

    async fn correct_shop_name(
        &self,
        name: &str,
        location_context: &str,
    ) -> Result<String, PlacesError> {
        let input = format!("{name} {location_context}");
        let url = self.build_url(
            AUTOCOMPLETE_PATH,
            &[("input", input.trim()), ("types", "establishment")],
        )?;
        let found: Option<AutocompleteResponse> = self
            .get_envelope(&url, &format!("autocomplete(input={input})"))
            .await?;

        Ok(found
            .and_then(|r| r.predictions.into_iter().next())
            .and_then(|p| p.structured_formatting)
            .map(|f| f.main_text)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| name.trim().to_owned()))
    }

    /// Expands up to `max_results` summaries into full details, preserving
    /// the directory's order. Failed lookups are logged and dropped.
    async fn expand_details(&self, summaries: Vec<PlaceSummary>) -> Vec<PlaceDetails> {
        let total = summaries.len().min(self.max_results);
        let results: Vec<Option<PlaceDetails>> = stream::iter(
            summaries.into_iter().take(self.max_results),
        )
        .map(|summary| async move {
            match self.place_details(&summary.place_id).await {
                Ok(details) => Some(details),
                Err(e) => {
                    tracing::warn!(
                        place_id = %summary.place_id,
                        name = %summary.name,
                        error = %e,
                        "failed to fetch place details; skipping"
                    );
                    None
                }
            }
        })
        .buffered(DETAILS_CONCURRENCY)
        .collect()
        .await;

        let details: Vec<PlaceDetails> = results.into_iter().flatten().collect();
        if details.len() < total {
            tracing::info!(
                requested = total,
                fetched = details.len(),
                "some place details were skipped"
            );
        }
        details
    }

    /// Builds the endpoint URL with the API key and percent-encoded parameters.
    fn build_url(&self, path: &str, extra: &[(&str, &str)]) -> Result<Url, PlacesError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| PlacesError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            })?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("key", &self.api_key);
        }
        Ok(url)
    }

    /// GETs `url` with retries and decodes the status envelope.
    ///
    /// Returns `Ok(None)` for `ZERO_RESULTS`.
    async fn get_envelope<T: DeserializeOwned>(
        &self,
        url: &Url,
        context: &str,
    ) -> Result<Option<T>, PlacesError> {
        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || async {
            let body = self.request_json(url).await?;
            Self::check_status(&body)?;
            Ok::<_, PlacesError>(body)
        })
        .await?;

        if body.get("status").and_then(serde_json::Value::as_str) == Some("ZERO_RESULTS") {
            return Ok(None);
        }

        serde_json::from_value(body)
            .map(Some)
            .map_err(|e| PlacesError::Deserialize {
                context: context.to_owned(),
                source: e,
            })
    }

    /// Sends a GET request, asserts a 2xx HTTP status, and parses the body as JSON.
    async fn request_json(&self, url: &Url) -> Result<serde_json::Value, PlacesError> {
        let response = self.client.get(url.clone()).send().await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| PlacesError::Deserialize {
            context: url.path().to_owned(),
            source: e,
        })
    }

    fn check_status(body: &serde_json::Value) -> Result<(), PlacesError> {
        let status = body
            .get("status")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("OK");
        match status {
            "OK" | "ZERO_RESULTS" => Ok(()),
            other => Err(PlacesError::Api {
                status: other.to_owned(),
                message: body
                    .get("error_message")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("no error message")
                    .to_owned(),
            }),
        }
    }
}
