use std::str::FromStr;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use coffeehaus_core::LatLng;
use coffeehaus_search::{SearchError, SearchRequest, SearchResponse};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, AppState};

/// Raw query string. Numbers arrive as text so a malformed value can be
/// dropped instead of failing the whole request.
#[derive(Debug, Default, Deserialize)]
pub(super) struct SearchParams {
    pub q: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub radius: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

fn parse_opt<T: FromStr>(value: Option<&str>) -> Option<T> {
    value.and_then(|s| s.trim().parse().ok())
}

impl SearchParams {
    fn into_request(self) -> Option<SearchRequest> {
        let query = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())?;

        let lat = parse_opt::<f64>(self.lat.as_deref()).filter(|v| v.is_finite());
        let lng = parse_opt::<f64>(self.lng.as_deref()).filter(|v| v.is_finite());

        Some(SearchRequest {
            query: query.to_owned(),
            location: LatLng::new(lat.unwrap_or(0.0), lng.unwrap_or(0.0)),
            radius_m: parse_opt(self.radius.as_deref()).filter(|r: &u32| *r > 0),
            limit: parse_opt(self.limit.as_deref()).filter(|l: &usize| *l > 0),
            offset: parse_opt(self.offset.as_deref()).unwrap_or(0),
        })
    }
}

fn map_search_error(request_id: String, error: &SearchError) -> ApiError {
    match error {
        SearchError::Classification(_) => {
            tracing::error!(error = %error, "search: classification failed");
            ApiError::new(
                request_id,
                "classification_failed",
                "query could not be classified",
            )
        }
        SearchError::Lookup { operation, .. } => {
            tracing::error!(error = %error, operation, "search: directory lookup failed");
            ApiError::new(request_id, "lookup_failed", error.to_string())
        }
    }
}

pub(super) async fn search_shops(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let request = params
        .into_request()
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "bad_request", "q is required"))?;

    let response = state
        .search
        .search(request)
        .await
        .map_err(|e| map_search_error(req_id.0.clone(), &e))?;

    Ok(Json(response))
}
