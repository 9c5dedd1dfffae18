pub mod catalog;
pub mod config;
pub mod driver;
pub mod error;
pub mod geodesy;
pub mod models;
pub mod mood;
pub mod narration;
pub mod providers;
pub mod session;
pub mod surface;

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::catalog::build_catalog;
use crate::config::ExplorerConfig;
use crate::driver::Providers;
use crate::error::ExploreError;
use crate::models::{
    validate_coordinate, ApiError, Coordinate, GeocodeQuery, LocationQuery, Mood, PlacesQuery,
    PlacesResponse, Route, RouteRequest,
};
use crate::mood::{apply_filter, search_categories};

#[derive(Clone)]
pub struct AppState {
    pub providers: Providers,
    pub config: Arc<ExplorerConfig>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/places", get(places_handler))
        .route("/api/geocode", get(geocode_handler))
        .route("/api/route", post(route_handler))
        .with_state(state)
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

async fn places_handler(
    State(state): State<AppState>,
    Query(query): Query<PlacesQuery>,
) -> ApiResult<PlacesResponse> {
    let reference = validate_coordinate(Coordinate {
        lat: query.lat,
        lon: query.lon,
    })
    .map_err(api_error)?;
    let mood = query
        .mood
        .as_deref()
        .map(str::parse::<Mood>)
        .transpose()
        .map_err(|err| api_error(ExploreError::InvalidInput(err.to_string())))?
        .unwrap_or_default();
    let max_km = query.max_km.unwrap_or(state.config.default_max_distance_km);
    if !max_km.is_finite() || max_km < 0.0 {
        return Err(api_error(ExploreError::InvalidInput(format!(
            "max_km must be a non-negative number, got {max_km}"
        ))));
    }

    tracing::info!(
        "places request around ({:.5}, {:.5}) mood={mood} max_km={max_km}",
        reference.lat,
        reference.lon
    );

    let records = match state
        .providers
        .places
        .search(reference, state.config.search_radius_m, &search_categories())
        .await
    {
        Ok(records) => records,
        Err(ExploreError::NoResultsFound) => Vec::new(),
        Err(err) => {
            tracing::warn!("place search failed: {err}");
            return Err(api_error(err));
        }
    };

    let catalog = build_catalog(records, reference);
    let places = apply_filter(catalog.places(), mood, max_km);

    Ok(Json(PlacesResponse {
        reference,
        mood,
        title: mood.title().to_string(),
        total: catalog.len(),
        places,
    }))
}

async fn geocode_handler(
    State(state): State<AppState>,
    Query(query): Query<GeocodeQuery>,
) -> ApiResult<LocationQuery> {
    state
        .providers
        .geocoder
        .forward(&query.q)
        .await
        .map(Json)
        .map_err(|err| match err {
            ExploreError::NoResultsFound => (
                StatusCode::NOT_FOUND,
                Json(ApiError {
                    message: "location not found".to_string(),
                }),
            ),
            other => api_error(other),
        })
}

async fn route_handler(
    State(state): State<AppState>,
    Json(req): Json<RouteRequest>,
) -> ApiResult<Route> {
    let origin = validate_coordinate(req.origin).map_err(api_error)?;
    let destination = validate_coordinate(req.destination).map_err(api_error)?;
    tracing::info!("route request: {:?} -> {:?}", origin, destination);

    state
        .providers
        .router
        .route(origin, destination)
        .await
        .map(Json)
        .map_err(api_error)
}

fn api_error(err: ExploreError) -> (StatusCode, Json<ApiError>) {
    let status = match &err {
        ExploreError::NoResultsFound => StatusCode::NOT_FOUND,
        ExploreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ExploreError::ProviderUnavailable(_) => StatusCode::BAD_GATEWAY,
        ExploreError::StaleResult => StatusCode::CONFLICT,
    };
    let message = match err {
        ExploreError::InvalidInput(msg) | ExploreError::ProviderUnavailable(msg) => msg,
        other => other.to_string(),
    };

    (status, Json(ApiError { message }))
}
