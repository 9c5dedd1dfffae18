pub use shared::{
    ApiError, Coordinate, GeocodeQuery, LocationQuery, Mood, Place, PlacesQuery, PlacesResponse,
    RawPlace, Route, RouteRequest, RouteSummary, Step,
};

use crate::error::{ExploreError, Result};

/// Rejects malformed coordinates before anything is dispatched to a provider.
pub fn validate_coordinate(coord: Coordinate) -> Result<Coordinate> {
    if coord.is_valid() {
        Ok(coord)
    } else {
        Err(ExploreError::InvalidInput(format!(
            "coordinate out of range: ({}, {})",
            coord.lat, coord.lon
        )))
    }
}
