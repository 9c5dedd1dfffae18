use crate::models::Coordinate;

pub const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Great-circle distance in kilometres (haversine).
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();

    let h = haversine_term(sin_dlat, sin_dlon, lat1.cos() * lat2.cos());
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Rounding can push h a hair outside [0, 1] near antipodes.
fn haversine_term(sin_dlat: f64, sin_dlon: f64, cos_product: f64) -> f64 {
    (sin_dlat * sin_dlat + cos_product * sin_dlon * sin_dlon).clamp(0.0, 1.0)
}
