//! Integration tests for `PlacesClient` using wiremock HTTP mocks.

use coffeehaus_core::LatLng;
use coffeehaus_places::{PlacesClient, PlacesError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> PlacesClient {
    PlacesClient::with_base_url("test-key", 5, 10, 2, base_url)
        .expect("client construction should not fail")
        .with_backoff_base_ms(0)
}

fn details_body(place_id: &str, name: &str) -> serde_json::Value {
    serde_json::json!({
        "status": "OK",
        "result": {
            "place_id": place_id,
            "name": name,
            "formatted_address": format!("{name}, Long Beach, CA"),
            "vicinity": "Long Beach",
            "geometry": {"location": {"lat": 33.77, "lng": -118.19}},
            "rating": 4.5,
            "user_ratings_total": 300,
            "price_level": 2,
            "types": ["cafe", "food"],
            "photos": [{"photo_reference": format!("{place_id}-photo")}],
            "website": "https://example.com",
            "formatted_phone_number": "(562) 555-0100",
            "business_status": "OPERATIONAL"
        }
    })
}

async fn mount_details(server: &MockServer, place_id: &str, name: &str) {
    Mock::given(method("GET"))
        .and(path("/maps/api/place/details/json"))
        .and(query_param("place_id", place_id))
        .respond_with(ResponseTemplate::new(200).set_body_json(details_body(place_id, name)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn nearby_search_expands_each_result_with_details() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/api/place/nearbysearch/json"))
        .and(query_param("location", "33.7514,-117.994"))
        .and(query_param("radius", "3000"))
        .and(query_param("type", "cafe"))
        .and(query_param("keyword", "coffee shop"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "results": [
                {"place_id": "p1", "name": "Coffee One"},
                {"place_id": "p2", "name": "Coffee Two"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_details(&server, "p1", "Coffee One").await;
    mount_details(&server, "p2", "Coffee Two").await;

    let client = test_client(&server.uri());
    let places = client
        .nearby_search(LatLng::new(33.7514, -117.994), 3000)
        .await
        .expect("nearby search should succeed");

    let ids: Vec<&str> = places.iter().map(|p| p.place_id.as_str()).collect();
    assert_eq!(ids, vec!["p1", "p2"], "directory order is preserved");
    assert_eq!(places[0].listing.ratings_total, 300);
    assert_eq!(places[0].listing.photo_refs, vec!["p1-photo"]);
}

#[tokio::test]
async fn nearby_search_skips_places_whose_details_fail() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/api/place/nearbysearch/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "results": [
                {"place_id": "good", "name": "Good"},
                {"place_id": "gone", "name": "Gone"}
            ]
        })))
        .mount(&server)
        .await;
    mount_details(&server, "good", "Good").await;
    Mock::given(method("GET"))
        .and(path("/maps/api/place/details/json"))
        .and(query_param("place_id", "gone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "NOT_FOUND"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let places = client
        .nearby_search(LatLng::new(1.0, 1.0), 1000)
        .await
        .expect("nearby search should succeed");

    assert_eq!(places.len(), 1);
    assert_eq!(places[0].place_id, "good");
}

#[tokio::test]
async fn zero_results_is_an_empty_list() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/api/place/textsearch/json"))
        .and(query_param("type", "cafe"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"status": "ZERO_RESULTS", "results": []})),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let places = client
        .area_search("coffee in atlantis")
        .await
        .expect("ZERO_RESULTS is not an error");
    assert!(places.is_empty());
}

#[tokio::test]
async fn request_denied_surfaces_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/api/place/textsearch/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .area_search("coffee in silver lake")
        .await
        .expect_err("should fail");
    assert!(
        matches!(err, PlacesError::Api { ref status, .. } if status == "REQUEST_DENIED"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/api/place/textsearch/json"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/maps/api/place/textsearch/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "results": [{"place_id": "p1", "name": "Coffee One"}]
        })))
        .mount(&server)
        .await;
    mount_details(&server, "p1", "Coffee One").await;

    let client = test_client(&server.uri());
    let places = client
        .area_search("coffee in downtown")
        .await
        .expect("should succeed after one retry");
    assert_eq!(places.len(), 1);
}

#[tokio::test]
async fn name_search_corrects_name_and_filters_unrelated_places() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/api/place/autocomplete/json"))
        .and(query_param("input", "stereoscop Long Beach, CA"))
        .and(query_param("types", "establishment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "predictions": [{
                "description": "Stereoscope Coffee, Long Beach, CA",
                "structured_formatting": {"main_text": "Stereoscope Coffee"}
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/maps/api/place/textsearch/json"))
        .and(query_param("query", "Stereoscope Coffee in Long Beach, CA"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "results": [
                {"place_id": "s1", "name": "Stereoscope Coffee"},
                {"place_id": "x1", "name": "Some Other Cafe"},
                {"place_id": "s2", "name": "STEREOSCOPE COFFEE - Atlantic"}
            ]
        })))
        .mount(&server)
        .await;
    mount_details(&server, "s1", "Stereoscope Coffee").await;
    mount_details(&server, "s2", "Stereoscope Coffee - Atlantic").await;

    let client = test_client(&server.uri());
    let places = client
        .name_search("stereoscop", "Long Beach, CA")
        .await
        .expect("name search should succeed");

    let ids: Vec<&str> = places.iter().map(|p| p.place_id.as_str()).collect();
    assert_eq!(ids, vec!["s1", "s2"]);
}

#[tokio::test]
async fn name_search_without_context_searches_name_only() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/api/place/autocomplete/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"status": "ZERO_RESULTS", "predictions": []})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/maps/api/place/textsearch/json"))
        .and(query_param("query", "Portola Coffee"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "results": [{"place_id": "pc", "name": "Portola Coffee Lab"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_details(&server, "pc", "Portola Coffee Lab").await;

    let client = test_client(&server.uri());
    let places = client
        .name_search("Portola Coffee", "")
        .await
        .expect("name search should succeed");
    assert_eq!(places.len(), 1);
}

#[tokio::test]
async fn reverse_geocode_returns_city_and_state() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/api/geocode/json"))
        .and(query_param("latlng", "33.7514,-117.994"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "results": [{
                "formatted_address": "Westminster, CA 92683, USA",
                "address_components": [
                    {"long_name": "Westminster", "short_name": "Westminster", "types": ["locality", "political"]},
                    {"long_name": "California", "short_name": "CA", "types": ["administrative_area_level_1", "political"]}
                ]
            }]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let area = client
        .reverse_geocode(LatLng::new(33.7514, -117.994))
        .await
        .expect("geocode should succeed");
    assert_eq!(area, "Westminster, CA");
}

#[tokio::test]
async fn place_details_not_found_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/api/place/details/json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ZERO_RESULTS"})),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.place_details("nope").await.expect_err("should fail");
    assert!(matches!(err, PlacesError::Api { ref status, .. } if status == "NOT_FOUND"));
}
