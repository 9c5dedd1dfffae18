use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::Request,
};
use explorer::{
    config::ExplorerConfig,
    create_router,
    driver::Providers,
    error::{ExploreError, Result},
    models::{
        ApiError, Coordinate, LocationQuery, Mood, PlacesResponse, RawPlace, Route, RouteSummary,
        Step,
    },
    providers::{GeocodeProvider, PlaceSearchProvider, RouteProvider},
    AppState,
};
use hyper::StatusCode;
use serde_json::json;
use tower::ServiceExt;

struct FixedPlaces(Result<Vec<RawPlace>>);

#[async_trait]
impl PlaceSearchProvider for FixedPlaces {
    async fn search(&self, _: Coordinate, _: f64, categories: &[&str]) -> Result<Vec<RawPlace>> {
        assert!(categories.contains(&"school"));
        self.0.clone()
    }
}

struct ParisOnly;

#[async_trait]
impl GeocodeProvider for ParisOnly {
    async fn forward(&self, text: &str) -> Result<LocationQuery> {
        if text.eq_ignore_ascii_case("paris") {
            Ok(LocationQuery {
                coord: Coordinate { lat: 48.8566, lon: 2.3522 },
                label: "Paris, France".into(),
            })
        } else {
            Err(ExploreError::NoResultsFound)
        }
    }

    async fn reverse(&self, _: Coordinate) -> Result<String> {
        Ok("Somewhere".into())
    }
}

struct StraightLine;

#[async_trait]
impl RouteProvider for StraightLine {
    async fn route(&self, origin: Coordinate, destination: Coordinate) -> Result<Route> {
        let km = explorer::geodesy::distance_km(origin, destination);
        Ok(Route {
            summary: RouteSummary {
                distance_km: km,
                duration_min: (km / 40.0 * 60.0).round(),
            },
            steps: vec![
                Step {
                    text: "Head north".into(),
                    distance_m: km * 1000.0,
                },
                Step {
                    text: "You have arrived at your destination".into(),
                    distance_m: 0.0,
                },
            ],
            geometry: vec![origin, destination],
        })
    }
}

fn school(id: u64, km_north: f64) -> RawPlace {
    RawPlace {
        id,
        coord: Coordinate {
            lat: 45.0 + km_north / 111.195,
            lon: 5.0,
        },
        category: Some("school".into()),
        name: Some(format!("School {id}")),
    }
}

fn test_app(places: Result<Vec<RawPlace>>) -> axum::Router {
    let state = AppState {
        providers: Providers {
            places: Arc::new(FixedPlaces(places)),
            geocoder: Arc::new(ParisOnly),
            router: Arc::new(StraightLine),
        },
        config: Arc::new(ExplorerConfig::default()),
    };
    create_router(state)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn places_endpoint_returns_closest_matching_places() {
    // Fifteen schools between 1 and 8 km away, in scrambled provider order.
    let records: Vec<RawPlace> = (0..15)
        .rev()
        .map(|i| school(i, 1.0 + i as f64 * 0.5))
        .collect();
    let app = test_app(Ok(records));

    let (status, bytes) = get(app, "/api/places?lat=45.0&lon=5.0&mood=school&max_km=5").await;
    assert_eq!(status, StatusCode::OK);

    let body: PlacesResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.mood, Mood::School);
    assert_eq!(body.title, "Best Places for Students");
    assert_eq!(body.total, 15);
    assert!(!body.places.is_empty() && body.places.len() <= 10);
    assert!(body.places.iter().all(|p| p.distance_km <= 5.0));
    assert!(body
        .places
        .windows(2)
        .all(|w| w[0].distance_km <= w[1].distance_km));
    assert_eq!(body.places[0].id, 0);
}

#[tokio::test]
async fn places_endpoint_defaults_to_all_moods() {
    let mut records = vec![school(1, 1.0)];
    records.push(RawPlace {
        category: Some("cafe".into()),
        ..school(2, 0.5)
    });
    let app = test_app(Ok(records));

    let (status, bytes) = get(app, "/api/places?lat=45.0&lon=5.0").await;
    assert_eq!(status, StatusCode::OK);
    let body: PlacesResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.mood, Mood::None);
    let ids: Vec<u64> = body.places.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![2, 1]);
}

#[tokio::test]
async fn places_endpoint_rejects_bad_input() {
    let (status, _) = get(test_app(Ok(Vec::new())), "/api/places?lat=95.0&lon=5.0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, bytes) = get(
        test_app(Ok(Vec::new())),
        "/api/places?lat=45.0&lon=5.0&mood=work",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: ApiError = serde_json::from_slice(&bytes).unwrap();
    assert!(body.message.contains("work"));
}

#[tokio::test]
async fn places_endpoint_reports_provider_outage() {
    let app = test_app(Err(ExploreError::ProviderUnavailable("overpass timeout".into())));
    let (status, bytes) = get(app, "/api/places?lat=45.0&lon=5.0").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let body: ApiError = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.message, "overpass timeout");
}

#[tokio::test]
async fn places_endpoint_treats_no_results_as_empty_list() {
    let app = test_app(Err(ExploreError::NoResultsFound));
    let (status, bytes) = get(app, "/api/places?lat=45.0&lon=5.0").await;
    assert_eq!(status, StatusCode::OK);
    let body: PlacesResponse = serde_json::from_slice(&bytes).unwrap();
    assert!(body.places.is_empty());
    assert_eq!(body.total, 0);
}

#[tokio::test]
async fn geocode_endpoint_finds_or_reports_missing_location() {
    let (status, bytes) = get(test_app(Ok(Vec::new())), "/api/geocode?q=Paris").await;
    assert_eq!(status, StatusCode::OK);
    let body: LocationQuery = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.label, "Paris, France");

    let (status, bytes) = get(test_app(Ok(Vec::new())), "/api/geocode?q=Atlantis").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let body: ApiError = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.message, "location not found");
}

#[tokio::test]
async fn route_endpoint_returns_summary_and_steps() {
    let app = test_app(Ok(Vec::new()));
    let payload = json!({
        "origin": {"lat": 45.0, "lon": 5.0},
        "destination": {"lat": 45.05, "lon": 5.0}
    });
    let request = Request::builder()
        .method("POST")
        .uri("/api/route")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let body: Route = serde_json::from_slice(&bytes).unwrap();
    assert!((body.summary.distance_km - 5.56).abs() < 0.05);
    assert_eq!(body.steps.len(), 2);
    assert_eq!(body.geometry.len(), 2);
}

#[tokio::test]
async fn route_endpoint_rejects_invalid_destination() {
    let app = test_app(Ok(Vec::new()));
    let payload = json!({
        "origin": {"lat": 45.0, "lon": 5.0},
        "destination": {"lat": 45.0, "lon": 190.0}
    });
    let request = Request::builder()
        .method("POST")
        .uri("/api/route")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
